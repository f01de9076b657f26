//! # Primitives
//!
//! Hardcoded constants for the Larder core: store keys, validation limits,
//! snapshot format markers and presentation defaults.

// =============================================================================
// STORE LAYOUT
// =============================================================================

/// Store key holding the JSON-serialized ingredient collection.
pub const INGREDIENTS_KEY: &str = "ingredients";

/// Store key holding the JSON-serialized recipe collection.
pub const RECIPES_KEY: &str = "recipes";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Smallest accepted ingredient price (whole currency units).
pub const MIN_INGREDIENT_PRICE: f64 = 100.0;

/// Maximum length for names and unit labels.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length for cooking instructions (64KB).
pub const MAX_INSTRUCTIONS_LENGTH: usize = 65536;

/// Maximum size of one persisted collection.
///
/// Checked before parsing so a corrupted store cannot exhaust memory.
pub const MAX_COLLECTION_PAYLOAD_SIZE: usize = 64 * 1024 * 1024; // 64 MB

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the binary snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"LRDR";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum number of records of each kind accepted by a snapshot import.
pub const MAX_IMPORT_RECORD_COUNT: u64 = 1_000_000;

// =============================================================================
// PRESENTATION DEFAULTS
// =============================================================================

/// Items shown per page when the caller does not choose.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Maximum number of numbered page buttons in a pagination window.
pub const MAX_VISIBLE_PAGES: usize = 5;

/// Currency prefix used by price formatting.
pub const CURRENCY_PREFIX: &str = "Rp";
