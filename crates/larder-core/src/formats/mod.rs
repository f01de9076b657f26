//! # Formats
//!
//! Encodings of the two collections.
//!
//! - `persistence`: the JSON strings stored under the `ingredients` and
//!   `recipes` keys
//! - `snapshot`: a checksummed binary export of both collections, plus a
//!   pretty JSON export for humans

pub mod persistence;
pub mod snapshot;

pub use persistence::{
    decode_ingredients, decode_recipes, encode_ingredients, encode_recipes, load_ingredients,
    load_recipes, store_catalog, store_ingredients, store_recipes,
};
pub use snapshot::{
    Snapshot, SnapshotHeader, export_json, export_snapshot, import_json, import_snapshot,
    snapshot_checksum,
};

#[cfg(feature = "crypto-hash")]
pub use snapshot::snapshot_digest;
