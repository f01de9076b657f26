//! # Recipe Repository
//!
//! CRUD over the recipe collection.
//!
//! Recipes enter the collection fully formed from the
//! [`RecipeComposer`](crate::composer::RecipeComposer). Afterwards only the
//! name, servings and cooking instructions are directly editable; the
//! embedded usages change only through [`reconcile`](RecipeRepository::reconcile).

use crate::clock::IdSequence;
use crate::cost;
use crate::formats::persistence;
use crate::primitives::{MAX_INSTRUCTIONS_LENGTH, MAX_NAME_LENGTH};
use crate::propagation::{self, IngredientEvent, PropagationReport};
use crate::storage::KeyValueStore;
use crate::{IngredientId, LarderError, Recipe, RecipeDraft, RecipeId};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// The recipe catalog, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RecipeRepository {
    recipes: Vec<Recipe>,
    ids: IdSequence,
}

impl RecipeRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository from existing records.
    ///
    /// # Errors
    ///
    /// Returns `LarderError::Validation` if two records share an id.
    pub fn from_records(recipes: Vec<Recipe>) -> Result<Self, LarderError> {
        let mut seen = BTreeSet::new();
        let mut ids = IdSequence::default();
        for recipe in &recipes {
            if !seen.insert(recipe.id) {
                return Err(LarderError::Validation(format!(
                    "duplicate recipe id {}",
                    recipe.id
                )));
            }
            ids.observe(recipe.id.0);
        }
        Ok(Self { recipes, ids })
    }

    /// Load the collection stored in `store`.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, LarderError> {
        Self::from_records(persistence::load_recipes(store)?)
    }

    /// Write the whole collection to `store`.
    pub fn persist<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), LarderError> {
        persistence::store_recipes(store, &self.recipes)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// All recipes, in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Look up one recipe.
    #[must_use]
    pub fn get(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Recipes with at least one usage of `ingredient`.
    #[must_use]
    pub fn referencing(&self, ingredient: IngredientId) -> Vec<&Recipe> {
        self.recipes
            .iter()
            .filter(|recipe| recipe.references(ingredient))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Reserve the id for a recipe created at `now`.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> Result<RecipeId, LarderError> {
        self.ids.next_id(now).map(RecipeId)
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Check the directly editable fields and return them with the name
    /// trimmed.
    pub fn validate(draft: RecipeDraft) -> Result<RecipeDraft, LarderError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(LarderError::Validation(
                "recipe name is required".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(LarderError::Validation(format!(
                "recipe name exceeds {} bytes",
                MAX_NAME_LENGTH
            )));
        }
        if draft.servings == 0 {
            return Err(LarderError::Validation(
                "servings must be at least 1".to_string(),
            ));
        }
        if draft.cooking_instructions.len() > MAX_INSTRUCTIONS_LENGTH {
            return Err(LarderError::Validation(format!(
                "cooking instructions exceed {} bytes",
                MAX_INSTRUCTIONS_LENGTH
            )));
        }

        Ok(RecipeDraft {
            name: name.to_string(),
            ..draft
        })
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Append a composed recipe.
    ///
    /// # Errors
    ///
    /// Returns `LarderError::Validation` if the id is already taken.
    pub fn create<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        recipe: Recipe,
    ) -> Result<RecipeId, LarderError> {
        if self.get(recipe.id).is_some() {
            return Err(LarderError::Validation(format!(
                "duplicate recipe id {}",
                recipe.id
            )));
        }

        let id = recipe.id;
        let mut next = self.recipes.clone();
        next.push(recipe);
        self.commit(store, next)?;
        self.ids.observe(id.0);

        Ok(id)
    }

    /// Change name, servings and instructions of `id`.
    ///
    /// `cost_per_serving` is recomputed from the stored `total_cost`.
    pub fn update<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        id: RecipeId,
        draft: RecipeDraft,
    ) -> Result<Recipe, LarderError> {
        let position = self.position(id)?;
        let draft = Self::validate(draft)?;

        let mut next = self.recipes.clone();
        let recipe = &mut next[position];
        recipe.name = draft.name;
        recipe.servings = draft.servings;
        recipe.cooking_instructions = draft.cooking_instructions;
        recipe.cost_per_serving = cost::cost_per_serving(recipe.total_cost, recipe.servings);
        let updated = recipe.clone();

        self.commit(store, next)?;
        Ok(updated)
    }

    /// Remove `id`. Ingredients are unaffected.
    pub fn delete<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        id: RecipeId,
    ) -> Result<Recipe, LarderError> {
        let position = self.position(id)?;
        let mut next = self.recipes.clone();
        let removed = next.remove(position);
        self.commit(store, next)?;
        Ok(removed)
    }

    /// Absorb an ingredient-side event and persist the whole collection.
    ///
    /// The collection is written even when no recipe referenced the
    /// ingredient.
    pub fn reconcile<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        event: &IngredientEvent<'_>,
    ) -> Result<PropagationReport, LarderError> {
        let (next, report) = self.reconciled(event);
        self.commit(store, next)?;
        Ok(report)
    }

    /// The collection as it would be after `event`, without writing it.
    #[must_use]
    pub fn reconciled(&self, event: &IngredientEvent<'_>) -> (Vec<Recipe>, PropagationReport) {
        let mut next = self.recipes.clone();
        let report = propagation::reconcile(&mut next, event);
        (next, report)
    }

    /// Take over a collection that the caller has already persisted.
    pub(crate) fn install(&mut self, recipes: Vec<Recipe>) {
        self.recipes = recipes;
    }

    /// Take over a validated repository, keeping ids monotonic.
    pub(crate) fn absorb(&mut self, fresh: Self) {
        self.recipes = fresh.recipes;
        self.ids.observe(fresh.ids.last());
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn position(&self, id: RecipeId) -> Result<usize, LarderError> {
        self.recipes
            .iter()
            .position(|r| r.id == id)
            .ok_or(LarderError::RecipeNotFound(id))
    }

    fn commit<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        next: Vec<Recipe>,
    ) -> Result<(), LarderError> {
        persistence::store_recipes(store, &next)?;
        self.recipes = next;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::cost::CostPolicy;
    use crate::storage::MemoryStore;
    use crate::{Ingredient, IngredientDraft, IngredientUsage};

    fn bread(id: u64, flour: &Ingredient) -> Recipe {
        let mut recipe = Recipe {
            id: RecipeId(id),
            name: "Bread".to_string(),
            servings: 4,
            ingredients: vec![IngredientUsage::snapshot(flour, 200.0)],
            total_cost: 0.0,
            cost_per_serving: 0.0,
            cooking_instructions: String::new(),
            created_date: FixedClock::at_millis(id as i64).now(),
        };
        recipe.recalculate(CostPolicy::ExcludeUnavailable);
        recipe
    }

    fn flour() -> Ingredient {
        Ingredient::from_draft(IngredientId(1), IngredientDraft::new("Flour", 15000.0, 1000.0, "g"))
    }

    #[test]
    fn create_then_get_and_reload() {
        let mut store = MemoryStore::new();
        let mut repo = RecipeRepository::new();

        let id = repo.create(&mut store, bread(10, &flour())).expect("create");
        assert_eq!(repo.get(id).map(|r| r.total_cost), Some(3000.0));

        let reloaded = RecipeRepository::load(&store).expect("load");
        assert_eq!(reloaded.list(), repo.list());
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut store = MemoryStore::new();
        let mut repo = RecipeRepository::new();

        repo.create(&mut store, bread(10, &flour())).expect("create");
        let result = repo.create(&mut store, bread(10, &flour()));
        assert!(matches!(result, Err(LarderError::Validation(_))));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn update_recomputes_per_serving_only() {
        let mut store = MemoryStore::new();
        let mut repo = RecipeRepository::new();
        let id = repo.create(&mut store, bread(10, &flour())).expect("create");

        let updated = repo
            .update(
                &mut store,
                id,
                RecipeDraft::new("Country bread", 6).with_instructions("Bake at 220C"),
            )
            .expect("update");

        assert_eq!(updated.name, "Country bread");
        assert_eq!(updated.total_cost, 3000.0);
        assert_eq!(updated.cost_per_serving, 500.0);
        assert_eq!(updated.ingredients.len(), 1);
        assert_eq!(repo.get(id), Some(&updated));
    }

    #[test]
    fn update_rejects_zero_servings_and_blank_name() {
        let mut store = MemoryStore::new();
        let mut repo = RecipeRepository::new();
        let id = repo.create(&mut store, bread(10, &flour())).expect("create");

        assert!(matches!(
            repo.update(&mut store, id, RecipeDraft::new("Bread", 0)),
            Err(LarderError::Validation(_))
        ));
        assert!(matches!(
            repo.update(&mut store, id, RecipeDraft::new("   ", 2)),
            Err(LarderError::Validation(_))
        ));
        assert_eq!(repo.get(id).map(|r| r.servings), Some(4));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut store = MemoryStore::new();
        let mut repo = RecipeRepository::new();
        assert!(matches!(
            repo.delete(&mut store, RecipeId(5)),
            Err(LarderError::RecipeNotFound(RecipeId(5)))
        ));
    }

    #[test]
    fn referencing_finds_users() {
        let mut store = MemoryStore::new();
        let mut repo = RecipeRepository::new();
        repo.create(&mut store, bread(10, &flour())).expect("create");
        repo.create(&mut store, bread(11, &flour())).expect("create");

        assert_eq!(repo.referencing(IngredientId(1)).len(), 2);
        assert!(repo.referencing(IngredientId(2)).is_empty());
    }

    #[test]
    fn reconcile_persists_even_without_matches() {
        let mut store = MemoryStore::new();
        let mut repo = RecipeRepository::new();

        let report = repo
            .reconcile(&mut store, &IngredientEvent::Removed(IngredientId(1)))
            .expect("reconcile");
        assert_eq!(report, PropagationReport::default());
        assert_eq!(store.get("recipes").expect("get").as_deref(), Some("[]"));
    }

    #[test]
    fn next_id_is_above_loaded_ids() {
        let mut repo = RecipeRepository::from_records(vec![bread(50, &flour())]).expect("records");
        let id = repo.next_id(FixedClock::at_millis(10).now()).expect("id");
        assert_eq!(id, RecipeId(51));
    }

    #[test]
    fn next_id_refuses_exhausted_space() {
        let mut repo =
            RecipeRepository::from_records(vec![bread(u64::MAX, &flour())]).expect("records");
        let result = repo.next_id(FixedClock::at_millis(10).now());
        assert!(matches!(result, Err(LarderError::Validation(_))));
    }

    #[test]
    fn reconciled_leaves_repository_untouched() {
        let mut store = MemoryStore::new();
        let mut repo = RecipeRepository::new();
        repo.create(&mut store, bread(10, &flour())).expect("create");

        let (next, report) = repo.reconciled(&IngredientEvent::Removed(IngredientId(1)));
        assert_eq!(report.recipes_affected, 1);
        assert!(next[0].ingredients.is_empty());
        assert_eq!(repo.get(RecipeId(10)).map(|r| r.ingredients.len()), Some(1));
    }
}
