//! # larder-core
//!
//! The recipe costing engine for Larder - THE LOGIC.
//!
//! This crate keeps a catalog of ingredients and a catalog of recipes built
//! from embedded snapshots of those ingredients, and derives per-recipe and
//! per-serving cost. Its core is the consistency model: whenever an
//! ingredient is edited, flagged unavailable or available, or deleted, every
//! recipe's embedded snapshot is rewritten and its cost recomputed within the
//! same call.
//!
//! ## Architectural Constraints
//!
//! - Single-threaded and synchronous: each operation runs to completion
//! - Every mutation is read-modify-persist against a `KeyValueStore`
//! - Validation happens before any write; errors never leave partial state
//! - Has NO async, NO network dependencies, NO logging dependency
//!   (operations return reports the app layer logs)

// =============================================================================
// MODULES
// =============================================================================

pub mod clock;
pub mod composer;
pub mod cost;
pub mod formats;
pub mod ingredients;
pub mod money;
pub mod pagination;
pub mod primitives;
pub mod propagation;
pub mod recipes;
pub mod session;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Ingredient, IngredientDraft, IngredientId, IngredientUsage, LarderError, Recipe, RecipeDraft,
    RecipeId, RecipeRef, UsageLine,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use clock::{Clock, FixedClock, IdSequence, SystemClock};
pub use composer::RecipeComposer;
pub use cost::CostPolicy;
pub use ingredients::{IngredientRemoval, IngredientRepository, IngredientUpdate};
pub use propagation::{IngredientEvent, PropagationReport, StaleUsage, reconcile};
pub use recipes::RecipeRepository;
pub use session::{Disposition, DispositionOutcome, Session};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore, RedbStore, StorageBackend};

// =============================================================================
// RE-EXPORTS: Formats & Presentation Helpers
// =============================================================================

pub use formats::{Snapshot, SnapshotHeader, export_json, export_snapshot, import_json, import_snapshot};
pub use money::format_rupiah;
pub use pagination::{PageRange, PageWindow, Pager};
