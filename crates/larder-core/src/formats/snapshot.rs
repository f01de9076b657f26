//! # Snapshot Format
//!
//! A self-describing export of both collections.
//!
//! Binary layout:
//! ```text
//! [header_len: u32 LE] [SnapshotHeader (postcard)] [Snapshot (postcard)]
//! ```
//!
//! The header carries the magic bytes, the format version, the record counts
//! and a checksum of the body bytes. Import validates all of them before
//! returning any data.
//!
//! A pretty-printed JSON export of the same `Snapshot` is available for
//! humans and other tools.

use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_IMPORT_RECORD_COUNT};
use crate::{Ingredient, LarderError, Recipe};
use serde::{Deserialize, Serialize};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Both collections, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ingredients: Vec<Ingredient>,
    pub recipes: Vec<Recipe>,
}

impl Snapshot {
    /// Bundle the two collections.
    #[must_use]
    pub fn new(ingredients: Vec<Ingredient>, recipes: Vec<Recipe>) -> Self {
        Self {
            ingredients,
            recipes,
        }
    }
}

/// Header for binary snapshot files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Magic bytes to identify the format.
    pub magic: [u8; 4],

    /// Format version for compatibility.
    pub version: u8,

    /// Number of ingredients in the body.
    pub ingredient_count: u64,

    /// Number of recipes in the body.
    pub recipe_count: u64,

    /// Checksum of the body bytes.
    pub checksum: u64,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    #[must_use]
    pub fn new(ingredient_count: u64, recipe_count: u64, checksum: u64) -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
            ingredient_count,
            recipe_count,
            checksum,
        }
    }

    /// Validate magic, version and count limits.
    pub fn validate(&self) -> Result<(), LarderError> {
        if &self.magic != MAGIC_BYTES {
            return Err(LarderError::DeserializationError(
                "Invalid file format".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(LarderError::DeserializationError(
                "Unsupported file version".to_string(),
            ));
        }
        if self.ingredient_count > MAX_IMPORT_RECORD_COUNT {
            return Err(LarderError::DeserializationError(format!(
                "Ingredient count {} exceeds maximum allowed {}",
                self.ingredient_count, MAX_IMPORT_RECORD_COUNT
            )));
        }
        if self.recipe_count > MAX_IMPORT_RECORD_COUNT {
            return Err(LarderError::DeserializationError(format!(
                "Recipe count {} exceeds maximum allowed {}",
                self.recipe_count, MAX_IMPORT_RECORD_COUNT
            )));
        }
        Ok(())
    }
}

// =============================================================================
// CHECKSUM
// =============================================================================

/// Deterministic XOR-rotate checksum of a byte stream.
///
/// Detects accidental corruption only. It is not collision resistant; use
/// `snapshot_digest` (feature `crypto-hash`) when that matters.
#[must_use]
pub fn snapshot_checksum(bytes: &[u8]) -> u64 {
    let mut hash: u64 = bytes.len() as u64;
    for byte in bytes {
        hash = hash.rotate_left(7) ^ u64::from(*byte);
    }
    hash
}

/// BLAKE3 digest of an exported snapshot, as lowercase hex.
#[cfg(feature = "crypto-hash")]
#[must_use]
pub fn snapshot_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

// =============================================================================
// BINARY EXPORT / IMPORT
// =============================================================================

/// Export a snapshot to the binary format.
pub fn export_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, LarderError> {
    let body = postcard::to_allocvec(snapshot)
        .map_err(|e| LarderError::SerializationError(format!("Body: {}", e)))?;

    let header = SnapshotHeader::new(
        snapshot.ingredients.len() as u64,
        snapshot.recipes.len() as u64,
        snapshot_checksum(&body),
    );
    let header_bytes = postcard::to_allocvec(&header)
        .map_err(|e| LarderError::SerializationError(format!("Header: {}", e)))?;

    // Combine: [header_len: u32] [header] [body]
    let mut result = Vec::with_capacity(4 + header_bytes.len() + body.len());
    result.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    result.extend_from_slice(&header_bytes);
    result.extend_from_slice(&body);

    Ok(result)
}

/// Import a snapshot from the binary format.
///
/// # Errors
///
/// Returns `LarderError::DeserializationError` if the data is truncated,
/// has the wrong magic or version, exceeds the record limits, or fails the
/// checksum.
pub fn import_snapshot(data: &[u8]) -> Result<Snapshot, LarderError> {
    let (len_bytes, rest) = data
        .split_first_chunk::<4>()
        .ok_or_else(|| LarderError::DeserializationError("Data too short".to_string()))?;
    let header_len = u32::from_le_bytes(*len_bytes) as usize;

    if rest.len() < header_len {
        return Err(LarderError::DeserializationError(
            "Data too short for header".to_string(),
        ));
    }
    let (header_bytes, body) = rest.split_at(header_len);

    let header: SnapshotHeader = postcard::from_bytes(header_bytes)
        .map_err(|e| LarderError::DeserializationError(format!("Header: {}", e)))?;
    header.validate()?;

    // Checksum before decoding the body
    if snapshot_checksum(body) != header.checksum {
        return Err(LarderError::DeserializationError(
            "Checksum mismatch: data may be corrupted".to_string(),
        ));
    }

    let snapshot: Snapshot = postcard::from_bytes(body)
        .map_err(|e| LarderError::DeserializationError(format!("Body: {}", e)))?;

    if snapshot.ingredients.len() as u64 != header.ingredient_count
        || snapshot.recipes.len() as u64 != header.recipe_count
    {
        return Err(LarderError::DeserializationError(
            "Record count does not match header".to_string(),
        ));
    }

    Ok(snapshot)
}

// =============================================================================
// JSON EXPORT / IMPORT
// =============================================================================

/// Export a snapshot as pretty-printed JSON.
pub fn export_json(snapshot: &Snapshot) -> Result<String, LarderError> {
    serde_json::to_string_pretty(snapshot)
        .map_err(|e| LarderError::SerializationError(e.to_string()))
}

/// Import a snapshot from JSON.
pub fn import_json(json: &str) -> Result<Snapshot, LarderError> {
    let snapshot: Snapshot = serde_json::from_str(json)
        .map_err(|e| LarderError::DeserializationError(e.to_string()))?;

    if snapshot.ingredients.len() as u64 > MAX_IMPORT_RECORD_COUNT
        || snapshot.recipes.len() as u64 > MAX_IMPORT_RECORD_COUNT
    {
        return Err(LarderError::DeserializationError(format!(
            "Record count exceeds maximum allowed {}",
            MAX_IMPORT_RECORD_COUNT
        )));
    }

    Ok(snapshot)
}

// =============================================================================
// TESTS
// =============================================================================
