//! # Consistency Propagator
//!
//! Rewrites the embedded ingredient snapshots of every recipe after an
//! ingredient-side event, then recomputes every recipe's cost.
//!
//! ## Events
//!
//! | Event | Matching usages | Cost policy |
//! |-------|-----------------|-------------|
//! | `Edited` | catalog fields overwritten | exclude unavailable |
//! | `MarkedUnavailable` | flag set | exclude unavailable |
//! | `MarkedAvailable` | flag cleared | exclude unavailable |
//! | `Removed` | usage dropped | include all remaining |
//!
//! `used_quantity` is never touched. Costs are recomputed for every recipe,
//! matched or not, so a stale stored total is corrected on the next event.

use crate::cost::CostPolicy;
use crate::{Ingredient, IngredientId, Recipe, RecipeId};
use serde::Serialize;

// =============================================================================
// EVENTS
// =============================================================================

/// An ingredient-side change that recipes must absorb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngredientEvent<'a> {
    /// Name, price, quantity or unit changed. Carries the new state.
    Edited(&'a Ingredient),
    /// The ingredient was flagged unavailable.
    MarkedUnavailable(IngredientId),
    /// The ingredient was flagged available again.
    MarkedAvailable(IngredientId),
    /// The ingredient was deleted from the catalog.
    Removed(IngredientId),
}

impl IngredientEvent<'_> {
    /// The ingredient this event is about.
    #[must_use]
    pub fn ingredient_id(&self) -> IngredientId {
        match self {
            Self::Edited(ingredient) => ingredient.id,
            Self::MarkedUnavailable(id) | Self::MarkedAvailable(id) | Self::Removed(id) => *id,
        }
    }

    /// Which usages count toward the recomputed totals.
    #[must_use]
    pub fn cost_policy(&self) -> CostPolicy {
        match self {
            Self::Removed(_) => CostPolicy::IncludeAll,
            _ => CostPolicy::ExcludeUnavailable,
        }
    }

    /// Short event name for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Edited(_) => "edited",
            Self::MarkedUnavailable(_) => "marked_unavailable",
            Self::MarkedAvailable(_) => "marked_available",
            Self::Removed(_) => "removed",
        }
    }
}

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Recipes holding at least one matching usage.
    pub recipes_affected: usize,
    /// Matching usages rewritten or removed.
    pub usages_affected: usize,
}

// =============================================================================
// RECONCILIATION
// =============================================================================

/// Apply `event` to every recipe and recompute all costs.
pub fn reconcile(recipes: &mut [Recipe], event: &IngredientEvent<'_>) -> PropagationReport {
    let target = event.ingredient_id();
    let policy = event.cost_policy();
    let mut report = PropagationReport::default();

    for recipe in recipes.iter_mut() {
        let touched = match event {
            IngredientEvent::Edited(ingredient) => {
                let mut count = 0;
                for usage in recipe.ingredients.iter_mut().filter(|u| u.id == target) {
                    usage.sync_from(ingredient);
                    count += 1;
                }
                count
            }
            IngredientEvent::MarkedUnavailable(_) => set_flag(recipe, target, true),
            IngredientEvent::MarkedAvailable(_) => set_flag(recipe, target, false),
            IngredientEvent::Removed(_) => {
                let before = recipe.ingredients.len();
                recipe.ingredients.retain(|usage| usage.id != target);
                before - recipe.ingredients.len()
            }
        };

        if touched > 0 {
            report.recipes_affected += 1;
            report.usages_affected += touched;
        }
        recipe.recalculate(policy);
    }

    report
}

fn set_flag(recipe: &mut Recipe, target: IngredientId, unavailable: bool) -> usize {
    let mut count = 0;
    for usage in recipe.ingredients.iter_mut().filter(|u| u.id == target) {
        usage.unavailable = unavailable;
        count += 1;
    }
    count
}

// =============================================================================
// CONSISTENCY CHECK
// =============================================================================

/// A usage whose snapshot disagrees with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleUsage {
    pub recipe: RecipeId,
    pub ingredient: IngredientId,
    /// The referenced ingredient no longer exists.
    pub orphaned: bool,
}

/// Find usages that differ from the ingredient they reference.
///
/// Empty whenever every mutation went through propagation.
#[must_use]
pub fn stale_usages(recipes: &[Recipe], ingredients: &[Ingredient]) -> Vec<StaleUsage> {
    let mut stale = Vec::new();
    for recipe in recipes {
        for usage in &recipe.ingredients {
            match ingredients.iter().find(|i| i.id == usage.id) {
                Some(ingredient) if usage.is_in_sync_with(ingredient) => {}
                found => stale.push(StaleUsage {
                    recipe: recipe.id,
                    ingredient: usage.id,
                    orphaned: found.is_none(),
                }),
            }
        }
    }
    stale
}

// =============================================================================
// TESTS
// =============================================================================
