//! # Recipe Composer
//!
//! The working set of a recipe being authored.
//!
//! A composer is transient and never persisted. It collects usage snapshots
//! of available ingredients, previews the cost, and finally turns into a
//! [`Recipe`] with a fresh id. The caller owns it; cancelling is `clear()`.

use crate::cost::{self, CostPolicy};
use crate::ingredients::IngredientRepository;
use crate::recipes::RecipeRepository;
use crate::{IngredientId, IngredientUsage, LarderError, Recipe, RecipeDraft};
use chrono::{DateTime, Utc};

/// Usage entries for a recipe that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeComposer {
    usages: Vec<IngredientUsage>,
}

impl RecipeComposer {
    /// Start an empty working set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `ingredient` consuming `used_quantity`, or replace the quantity
    /// if it is already in the set.
    ///
    /// # Errors
    ///
    /// - `LarderError::Validation` if `used_quantity` is not a positive number
    /// - `LarderError::IngredientNotFound` if the ingredient does not exist
    /// - `LarderError::UnavailableIngredient` if it is flagged unavailable
    pub fn add_or_update_usage(
        &mut self,
        catalog: &IngredientRepository,
        ingredient: IngredientId,
        used_quantity: f64,
    ) -> Result<&IngredientUsage, LarderError> {
        if !used_quantity.is_finite() || used_quantity <= 0.0 {
            return Err(LarderError::Validation(
                "used quantity must be greater than zero".to_string(),
            ));
        }
        let source = catalog
            .get(ingredient)
            .ok_or(LarderError::IngredientNotFound(ingredient))?;
        if !source.is_available() {
            return Err(LarderError::UnavailableIngredient(ingredient));
        }

        let index = match self.usages.iter().position(|u| u.id == ingredient) {
            Some(index) => {
                self.usages[index].used_quantity = used_quantity;
                index
            }
            None => {
                self.usages
                    .push(IngredientUsage::snapshot(source, used_quantity));
                self.usages.len() - 1
            }
        };
        Ok(&self.usages[index])
    }

    /// Drop the entry at `index`.
    pub fn remove_usage(&mut self, index: usize) -> Result<IngredientUsage, LarderError> {
        if index >= self.usages.len() {
            return Err(LarderError::IndexOutOfRange {
                index,
                len: self.usages.len(),
            });
        }
        Ok(self.usages.remove(index))
    }

    /// Cost of the working set. Zero when empty.
    #[must_use]
    pub fn compute_cost(&self) -> f64 {
        cost::total_cost(&self.usages, CostPolicy::ExcludeUnavailable)
    }

    /// Per-serving preview. Zero servings previews as one.
    #[must_use]
    pub fn cost_per_serving(&self, servings: u32) -> f64 {
        cost::cost_per_serving(self.compute_cost(), servings)
    }

    /// Turn the working set into a recipe created at `now`.
    ///
    /// The working set is kept, so a failed insert can be retried.
    ///
    /// # Errors
    ///
    /// Returns `LarderError::Validation` for a blank name, zero servings, or
    /// an empty working set.
    pub fn build(
        &self,
        draft: RecipeDraft,
        recipes: &mut RecipeRepository,
        now: DateTime<Utc>,
    ) -> Result<Recipe, LarderError> {
        let draft = RecipeRepository::validate(draft)?;
        if self.usages.is_empty() {
            return Err(LarderError::Validation(
                "a recipe needs at least one ingredient".to_string(),
            ));
        }

        let total_cost = self.compute_cost();
        Ok(Recipe {
            id: recipes.next_id(now)?,
            name: draft.name,
            servings: draft.servings,
            ingredients: self.usages.clone(),
            total_cost,
            cost_per_serving: cost::cost_per_serving(total_cost, draft.servings),
            cooking_instructions: draft.cooking_instructions,
            created_date: now,
        })
    }

    /// Build the recipe and clear the working set.
    pub fn commit(
        &mut self,
        draft: RecipeDraft,
        recipes: &mut RecipeRepository,
        now: DateTime<Utc>,
    ) -> Result<Recipe, LarderError> {
        let recipe = self.build(draft, recipes, now)?;
        self.clear();
        Ok(recipe)
    }

    /// Discard every entry.
    pub fn clear(&mut self) {
        self.usages.clear();
    }

    /// The entries, in insertion order.
    #[must_use]
    pub fn usages(&self) -> &[IngredientUsage] {
        &self.usages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.usages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }
}
