//! # Core Type Definitions
//!
//! This module contains the records shared by every Larder component:
//! - Identifiers (`IngredientId`, `RecipeId`)
//! - Catalog records (`Ingredient`, `Recipe`)
//! - The embedded usage snapshot (`IngredientUsage`)
//! - Input drafts (`IngredientDraft`, `RecipeDraft`)
//! - Error types (`LarderError`)
//!
//! ## Wire Compatibility
//!
//! Field names serialize in camelCase so that persisted collections keep the
//! layout `{id, name, price, quantity, unit, unavailable}` for ingredients and
//! `{id, name, servings, ingredients, totalCost, costPerServing,
//! cookingInstructions, createdDate}` for recipes. Optional fields default on
//! read.

use crate::cost::{self, CostPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of an ingredient in the catalog.
///
/// Derived from the creation timestamp in epoch milliseconds and kept strictly
/// increasing by [`IdSequence`](crate::clock::IdSequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IngredientId(pub u64);

impl fmt::Display for IngredientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a recipe in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u64);

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// INGREDIENT
// =============================================================================

/// A purchasable ingredient: `price` buys `quantity` of `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Immutable identifier.
    pub id: IngredientId,
    /// Display name.
    pub name: String,
    /// Price paid for `quantity`.
    pub price: f64,
    /// Amount the price buys.
    pub quantity: f64,
    /// Free-form unit label ("g", "ml", "pcs").
    pub unit: String,
    /// Soft-removal flag. Unavailable ingredients stay in the catalog but
    /// cannot be added to new recipes and cost nothing in existing ones.
    #[serde(default)]
    pub unavailable: bool,
}

impl Ingredient {
    /// Build a fresh, available ingredient from a validated draft.
    #[must_use]
    pub fn from_draft(id: IngredientId, draft: IngredientDraft) -> Self {
        Self {
            id,
            name: draft.name,
            price: draft.price,
            quantity: draft.quantity,
            unit: draft.unit,
            unavailable: false,
        }
    }

    /// Price of a single unit of quantity.
    #[must_use]
    pub fn unit_cost(&self) -> f64 {
        self.price / self.quantity
    }

    /// Whether the ingredient can be used in new recipes.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.unavailable
    }
}

/// The mutable fields of an ingredient, as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientDraft {
    pub name: String,
    pub price: f64,
    pub quantity: f64,
    pub unit: String,
}

impl IngredientDraft {
    /// Create a new draft.
    #[must_use]
    pub fn new(name: impl Into<String>, price: f64, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
            unit: unit.into(),
        }
    }
}

// =============================================================================
// INGREDIENT USAGE
// =============================================================================

/// An embedded copy of an ingredient inside a recipe.
///
/// This is a snapshot, not a live reference. The denormalized fields
/// (`name`, `price`, `unit`, `available_quantity`, `unavailable`) are rewritten
/// by the propagator whenever the referenced ingredient changes;
/// `used_quantity` belongs to the recipe and is never touched by propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientUsage {
    /// The referenced ingredient.
    pub id: IngredientId,
    pub name: String,
    pub price: f64,
    pub unit: String,
    /// Copy of the ingredient's `quantity` at the last sync.
    pub available_quantity: f64,
    /// Amount this recipe consumes.
    pub used_quantity: f64,
    /// Mirrors the ingredient's flag as of the last propagation.
    #[serde(default)]
    pub unavailable: bool,
}

impl IngredientUsage {
    /// Take a snapshot of `ingredient` consuming `used_quantity`.
    #[must_use]
    pub fn snapshot(ingredient: &Ingredient, used_quantity: f64) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name.clone(),
            price: ingredient.price,
            unit: ingredient.unit.clone(),
            available_quantity: ingredient.quantity,
            used_quantity,
            unavailable: ingredient.unavailable,
        }
    }

    /// Overwrite the denormalized catalog fields from `ingredient`.
    ///
    /// The availability flag has its own propagation path and is left alone.
    pub fn sync_from(&mut self, ingredient: &Ingredient) {
        self.name.clone_from(&ingredient.name);
        self.price = ingredient.price;
        self.unit.clone_from(&ingredient.unit);
        self.available_quantity = ingredient.quantity;
    }

    /// Whether every denormalized field equals the ingredient's current value.
    #[must_use]
    pub fn is_in_sync_with(&self, ingredient: &Ingredient) -> bool {
        self.id == ingredient.id
            && self.name == ingredient.name
            && self.price == ingredient.price
            && self.unit == ingredient.unit
            && self.available_quantity == ingredient.quantity
            && self.unavailable == ingredient.unavailable
    }

    /// Cost of this usage, ignoring availability.
    #[must_use]
    pub fn cost(&self) -> f64 {
        cost::usage_cost(self)
    }
}

// =============================================================================
// RECIPE
// =============================================================================

/// A recipe with its embedded usages and persisted cost snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Immutable identifier.
    pub id: RecipeId,
    pub name: String,
    /// Number of portions; always positive for stored recipes.
    pub servings: u32,
    /// Ordered usage snapshots. Mutated only by propagation.
    pub ingredients: Vec<IngredientUsage>,
    pub total_cost: f64,
    pub cost_per_serving: f64,
    #[serde(default)]
    pub cooking_instructions: String,
    /// Creation timestamp, immutable.
    pub created_date: DateTime<Utc>,
}

impl Recipe {
    /// Recompute `total_cost` and `cost_per_serving` from the usages.
    pub fn recalculate(&mut self, policy: CostPolicy) {
        self.total_cost = cost::total_cost(&self.ingredients, policy);
        self.cost_per_serving = cost::cost_per_serving(self.total_cost, self.servings);
    }

    /// Whether any usage references `ingredient`.
    #[must_use]
    pub fn references(&self, ingredient: IngredientId) -> bool {
        self.ingredients.iter().any(|usage| usage.id == ingredient)
    }

    /// Number of usages whose ingredient is still available.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.ingredients.iter().filter(|u| !u.unavailable).count()
    }

    /// Number of usages whose ingredient is unavailable.
    #[must_use]
    pub fn unavailable_count(&self) -> usize {
        self.ingredients.len() - self.available_count()
    }

    #[must_use]
    pub fn has_unavailable(&self) -> bool {
        self.ingredients.iter().any(|u| u.unavailable)
    }

    /// Per-usage cost lines. Unavailable usages carry no cost.
    #[must_use]
    pub fn breakdown(&self) -> Vec<UsageLine> {
        self.ingredients
            .iter()
            .map(|usage| UsageLine {
                ingredient: usage.id,
                name: usage.name.clone(),
                used_quantity: usage.used_quantity,
                unit: usage.unit.clone(),
                cost: (!usage.unavailable).then(|| usage.cost()),
            })
            .collect()
    }

    /// Identifier and name, for conflict reports and listings.
    #[must_use]
    pub fn summary(&self) -> RecipeRef {
        RecipeRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// The directly editable fields of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub servings: u32,
    pub cooking_instructions: String,
}

impl RecipeDraft {
    /// Create a new draft without cooking instructions.
    #[must_use]
    pub fn new(name: impl Into<String>, servings: u32) -> Self {
        Self {
            name: name.into(),
            servings,
            cooking_instructions: String::new(),
        }
    }

    /// Attach cooking instructions.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.cooking_instructions = instructions.into();
        self
    }
}

/// A reference to a recipe by id and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRef {
    pub id: RecipeId,
    pub name: String,
}

/// One line of a recipe's cost breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageLine {
    pub ingredient: IngredientId,
    pub name: String,
    pub used_quantity: f64,
    pub unit: String,
    /// `None` when the ingredient is unavailable.
    pub cost: Option<f64>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Larder system.
///
/// Every variant is recoverable. Validation always runs before any mutation,
/// so an error never leaves a collection partially updated.
#[derive(Debug, Error)]
pub enum LarderError {
    /// Malformed input: blank name, non-positive amount, price below minimum.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requested ingredient does not exist.
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(IngredientId),

    /// The requested recipe does not exist.
    #[error("Recipe not found: {0}")]
    RecipeNotFound(RecipeId),

    /// A non-forced delete of an ingredient that recipes still use.
    #[error("Ingredient {ingredient} is used by {} recipe(s)", .recipes.len())]
    ReferentialConflict {
        ingredient: IngredientId,
        recipes: Vec<RecipeRef>,
    },

    /// An unavailable ingredient cannot be added to a recipe.
    #[error("Ingredient {0} is unavailable")]
    UnavailableIngredient(IngredientId),

    /// A working-set position that does not exist.
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// TESTS
// =============================================================================
