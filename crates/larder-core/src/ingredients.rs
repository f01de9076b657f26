//! # Ingredient Repository
//!
//! CRUD over the ingredient collection.
//!
//! The repository owns identity assignment and the availability flag. Every
//! mutation validates first, applies the change to a copy of the collection,
//! persists the copy, and only then replaces the in-memory collection. A
//! failed write therefore leaves both the store and the repository untouched.
//!
//! Operations that change what recipes embed (edit, availability, delete)
//! reconcile the [`RecipeRepository`] against the matching event first and
//! write both collections in one store operation.

use crate::clock::IdSequence;
use crate::formats::persistence;
use crate::primitives::{MAX_NAME_LENGTH, MIN_INGREDIENT_PRICE};
use crate::propagation::{IngredientEvent, PropagationReport};
use crate::recipes::RecipeRepository;
use crate::storage::KeyValueStore;
use crate::{Ingredient, IngredientDraft, IngredientId, LarderError};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

// =============================================================================
// RESULTS
// =============================================================================

/// The outcome of an ingredient edit.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientUpdate {
    /// The record before the edit. Its id is the propagation key.
    pub previous: Ingredient,
    /// The record after the edit.
    pub current: Ingredient,
    /// What the recipe collection absorbed.
    pub propagation: PropagationReport,
}

/// The outcome of an ingredient delete.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientRemoval {
    /// The deleted record.
    pub ingredient: Ingredient,
    /// What the recipe collection absorbed.
    pub propagation: PropagationReport,
}

// =============================================================================
// REPOSITORY
// =============================================================================

/// The ingredient catalog, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct IngredientRepository {
    ingredients: Vec<Ingredient>,
    ids: IdSequence,
}

impl IngredientRepository {
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
    pub fn from_records(ingredients: Vec<Ingredient>) -> Result<Self, LarderError> {
        let mut seen = BTreeSet::new();
        let mut ids = IdSequence::default();
        for ingredient in &ingredients {
            if !seen.insert(ingredient.id) {
                return Err(LarderError::Validation(format!(
                    "duplicate ingredient id {}",
                    ingredient.id
                )));
            }
            ids.observe(ingredient.id.0);
        }
        Ok(Self { ingredients, ids })
    }

    /// Load the collection stored in `store`.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, LarderError> {
        Self::from_records(persistence::load_ingredients(store)?)
    }

    /// Write the whole collection to `store`.
    pub fn persist<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), LarderError> {
        persistence::store_ingredients(store, &self.ingredients)
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// All ingredients, in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Ingredient] {
        &self.ingredients
    }

    /// Look up one ingredient.
    #[must_use]
    pub fn get(&self, id: IngredientId) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    /// Ingredients that may be added to a new recipe.
    pub fn available(&self) -> impl Iterator<Item = &Ingredient> {
        self.ingredients.iter().filter(|i| i.is_available())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Check a draft and return it with name and unit trimmed.
    ///
    /// # Errors
    ///
    /// Returns `LarderError::Validation` for a blank or overlong name or unit,
    /// a non-finite number, a non-positive quantity, or a price below
    /// `MIN_INGREDIENT_PRICE`.
    pub fn validate(draft: IngredientDraft) -> Result<IngredientDraft, LarderError> {
        let name = draft.name.trim();
        let unit = draft.unit.trim();

        if name.is_empty() {
            return Err(LarderError::Validation("name is required".to_string()));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(LarderError::Validation(format!(
                "name exceeds {} bytes",
                MAX_NAME_LENGTH
            )));
        }
        if unit.is_empty() {
            return Err(LarderError::Validation("unit is required".to_string()));
        }
        if unit.len() > MAX_NAME_LENGTH {
            return Err(LarderError::Validation(format!(
                "unit exceeds {} bytes",
                MAX_NAME_LENGTH
            )));
        }
        if !draft.price.is_finite() {
            return Err(LarderError::Validation("price must be a number".to_string()));
        }
        if !draft.quantity.is_finite() {
            return Err(LarderError::Validation(
                "quantity must be a number".to_string(),
            ));
        }
        if draft.quantity <= 0.0 {
            return Err(LarderError::Validation(
                "quantity must be greater than zero".to_string(),
            ));
        }
        if draft.price < MIN_INGREDIENT_PRICE {
            return Err(LarderError::Validation(format!(
                "price must be at least {}",
                MIN_INGREDIENT_PRICE
            )));
        }

        Ok(IngredientDraft {
            name: name.to_string(),
            unit: unit.to_string(),
            ..draft
        })
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Add a new, available ingredient created at `now`.
    pub fn create<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        draft: IngredientDraft,
        now: DateTime<Utc>,
    ) -> Result<Ingredient, LarderError> {
        let draft = Self::validate(draft)?;

        let mut ids = self.ids;
        let ingredient = Ingredient::from_draft(IngredientId(ids.next_id(now)?), draft);

        let mut next = self.ingredients.clone();
        next.push(ingredient.clone());
        self.commit(store, next)?;
        self.ids = ids;

        Ok(ingredient)
    }

    /// Replace the mutable fields of `id` and propagate the edit.
    ///
    /// The availability flag is left as it was.
    pub fn update<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        recipes: &mut RecipeRepository,
        id: IngredientId,
        draft: IngredientDraft,
    ) -> Result<IngredientUpdate, LarderError> {
        let position = self.position(id)?;
        let draft = Self::validate(draft)?;

        let mut next = self.ingredients.clone();
        let previous = next[position].clone();
        let current = Ingredient {
            unavailable: previous.unavailable,
            ..Ingredient::from_draft(id, draft)
        };
        next[position] = current.clone();

        let propagation =
            self.commit_with_recipes(store, recipes, next, &IngredientEvent::Edited(&current))?;
        Ok(IngredientUpdate {
            previous,
            current,
            propagation,
        })
    }

    /// Flag `id` unavailable. Idempotent.
    pub fn set_unavailable<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        recipes: &mut RecipeRepository,
        id: IngredientId,
    ) -> Result<PropagationReport, LarderError> {
        let next = self.flagged(id, true)?;
        self.commit_with_recipes(store, recipes, next, &IngredientEvent::MarkedUnavailable(id))
    }

    /// Clear the unavailable flag on `id`. Idempotent.
    pub fn set_available<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        recipes: &mut RecipeRepository,
        id: IngredientId,
    ) -> Result<PropagationReport, LarderError> {
        let next = self.flagged(id, false)?;
        self.commit_with_recipes(store, recipes, next, &IngredientEvent::MarkedAvailable(id))
    }

    /// Remove `id` from the catalog and drop it from every recipe.
    ///
    /// # Errors
    ///
    /// Without `force`, returns `LarderError::ReferentialConflict` listing
    /// the recipes that still use the ingredient; nothing is changed.
    pub fn delete<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        recipes: &mut RecipeRepository,
        id: IngredientId,
        force: bool,
    ) -> Result<IngredientRemoval, LarderError> {
        let position = self.position(id)?;

        if !force {
            let users: Vec<_> = recipes
                .referencing(id)
                .into_iter()
                .map(|recipe| recipe.summary())
                .collect();
            if !users.is_empty() {
                return Err(LarderError::ReferentialConflict {
                    ingredient: id,
                    recipes: users,
                });
            }
        }

        let mut next = self.ingredients.clone();
        let ingredient = next.remove(position);

        let propagation =
            self.commit_with_recipes(store, recipes, next, &IngredientEvent::Removed(id))?;
        Ok(IngredientRemoval {
            ingredient,
            propagation,
        })
    }

    /// Take over a validated repository, keeping ids monotonic.
    pub(crate) fn absorb(&mut self, fresh: Self) {
        self.ingredients = fresh.ingredients;
        self.ids.observe(fresh.ids.last());
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn position(&self, id: IngredientId) -> Result<usize, LarderError> {
        self.ingredients
            .iter()
            .position(|i| i.id == id)
            .ok_or(LarderError::IngredientNotFound(id))
    }

    fn flagged(&self, id: IngredientId, unavailable: bool) -> Result<Vec<Ingredient>, LarderError> {
        let position = self.position(id)?;
        let mut next = self.ingredients.clone();
        next[position].unavailable = unavailable;
        Ok(next)
    }

    fn commit<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        next: Vec<Ingredient>,
    ) -> Result<(), LarderError> {
        persistence::store_ingredients(store, &next)?;
        self.ingredients = next;
        Ok(())
    }

    /// Persist `next` together with the recipes reconciled against `event`,
    /// then install both. On a failed write neither collection changes.
    fn commit_with_recipes<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        recipes: &mut RecipeRepository,
        next: Vec<Ingredient>,
        event: &IngredientEvent<'_>,
    ) -> Result<PropagationReport, LarderError> {
        let (next_recipes, report) = recipes.reconciled(event);
        persistence::store_catalog(store, &next, &next_recipes)?;
        self.ingredients = next;
        recipes.install(next_recipes);
        Ok(report)
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
    use crate::primitives::RECIPES_KEY;
    use crate::propagation::stale_usages;
    use crate::storage::MemoryStore;
    use crate::{IngredientUsage, Recipe, RecipeId};

    /// Accepts ingredient writes and refuses any write touching recipes.
    #[derive(Debug, Default)]
    struct RecipesFullStore {
        inner: MemoryStore,
    }

    impl KeyValueStore for RecipesFullStore {
        fn get(&self, key: &str) -> Result<Option<String>, LarderError> {
            self.inner.get(key)
        }

        fn put(&mut self, key: &str, value: &str) -> Result<(), LarderError> {
            if key == RECIPES_KEY {
                return Err(LarderError::IoError("disk full".to_string()));
            }
            self.inner.put(key, value)
        }

        fn put_many(&mut self, entries: &[(&str, &str)]) -> Result<(), LarderError> {
            if entries.iter().any(|(key, _)| *key == RECIPES_KEY) {
                return Err(LarderError::IoError("disk full".to_string()));
            }
            self.inner.put_many(entries)
        }
    }

    fn bread_using(ingredient: &Ingredient) -> RecipeRepository {
        let mut recipe = Recipe {
            id: RecipeId(1),
            name: "Bread".to_string(),
            servings: 4,
            ingredients: vec![IngredientUsage::snapshot(ingredient, 200.0)],
            total_cost: 0.0,
            cost_per_serving: 0.0,
            cooking_instructions: String::new(),
            created_date: now(),
        };
        recipe.recalculate(CostPolicy::ExcludeUnavailable);
        RecipeRepository::from_records(vec![recipe]).expect("records")
    }

    fn now() -> DateTime<Utc> {
        FixedClock::at_millis(1_700_000_000_000).now()
    }

    fn flour() -> IngredientDraft {
        IngredientDraft::new("Flour", 15000.0, 1000.0, "g")
    }

    #[test]
    fn create_then_get() {
        let mut store = MemoryStore::new();
        let mut repo = IngredientRepository::new();

        let created = repo.create(&mut store, flour(), now()).expect("create");
        assert_eq!(created.id, IngredientId(1_700_000_000_000));
        assert!(!created.unavailable);
        assert_eq!(repo.get(created.id), Some(&created));

        let reloaded = IngredientRepository::load(&store).expect("load");
        assert_eq!(reloaded.list(), repo.list());
    }

    #[test]
    fn same_millisecond_gets_distinct_ids() {
        let mut store = MemoryStore::new();
        let mut repo = IngredientRepository::new();

        let a = repo.create(&mut store, flour(), now()).expect("create");
        let b = repo.create(&mut store, flour(), now()).expect("create");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn validation_rejects_bad_drafts() {
        let cases = [
            IngredientDraft::new("  ", 15000.0, 1000.0, "g"),
            IngredientDraft::new("Flour", 15000.0, 1000.0, ""),
            IngredientDraft::new("Flour", 50.0, 1000.0, "g"),
            IngredientDraft::new("Flour", 15000.0, 0.0, "g"),
            IngredientDraft::new("Flour", 15000.0, -1.0, "g"),
            IngredientDraft::new("Flour", f64::NAN, 1000.0, "g"),
            IngredientDraft::new("Flour", 15000.0, f64::INFINITY, "g"),
        ];
        for draft in cases {
            assert!(
                matches!(
                    IngredientRepository::validate(draft.clone()),
                    Err(LarderError::Validation(_))
                ),
                "accepted {:?}",
                draft
            );
        }
    }

    #[test]
    fn validation_accepts_minimum_price_and_trims() {
        let draft = IngredientDraft::new("  Salt ", 100.0, 1.0, " g ");
        let clean = IngredientRepository::validate(draft).expect("valid");
        assert_eq!(clean.name, "Salt");
        assert_eq!(clean.unit, "g");
    }

    #[test]
    fn rejected_create_leaves_store_untouched() {
        let mut store = MemoryStore::new();
        let mut repo = IngredientRepository::new();

        let result = repo.create(
            &mut store,
            IngredientDraft::new("Flour", 50.0, 1000.0, "g"),
            now(),
        );
        assert!(result.is_err());
        assert!(repo.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn update_keeps_flag_and_reports_previous() {
        let mut store = MemoryStore::new();
        let mut repo = IngredientRepository::new();
        let mut recipes = RecipeRepository::new();

        let created = repo.create(&mut store, flour(), now()).expect("create");
        repo.set_unavailable(&mut store, &mut recipes, created.id)
            .expect("unavailable");

        let update = repo
            .update(
                &mut store,
                &mut recipes,
                created.id,
                IngredientDraft::new("Bread flour", 18000.0, 1000.0, "g"),
            )
            .expect("update");

        assert_eq!(update.previous.name, "Flour");
        assert_eq!(update.current.name, "Bread flour");
        assert!(update.current.unavailable);
        assert_eq!(repo.get(created.id), Some(&update.current));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut store = MemoryStore::new();
        let mut repo = IngredientRepository::new();
        let mut recipes = RecipeRepository::new();
        let missing = IngredientId(404);

        assert!(matches!(
            repo.set_unavailable(&mut store, &mut recipes, missing),
            Err(LarderError::IngredientNotFound(id)) if id == missing
        ));
        assert!(matches!(
            repo.delete(&mut store, &mut recipes, missing, true),
            Err(LarderError::IngredientNotFound(_))
        ));
        assert!(matches!(
            repo.update(&mut store, &mut recipes, missing, flour()),
            Err(LarderError::IngredientNotFound(_))
        ));
    }

    #[test]
    fn available_filters_flagged() {
        let mut store = MemoryStore::new();
        let mut repo = IngredientRepository::new();
        let mut recipes = RecipeRepository::new();

        let a = repo.create(&mut store, flour(), now()).expect("create");
        let b = repo
            .create(
                &mut store,
                IngredientDraft::new("Salt", 500.0, 250.0, "g"),
                now(),
            )
            .expect("create");
        repo.set_unavailable(&mut store, &mut recipes, a.id)
            .expect("unavailable");

        let ids: Vec<_> = repo.available().map(|i| i.id).collect();
        assert_eq!(ids, vec![b.id]);
    }

    #[test]
    fn from_records_rejects_duplicate_ids() {
        let one = Ingredient::from_draft(IngredientId(1), flour());
        let result = IngredientRepository::from_records(vec![one.clone(), one]);
        assert!(matches!(result, Err(LarderError::Validation(_))));
    }

    #[test]
    fn loaded_repository_never_reissues_ids() {
        let mut store = MemoryStore::new();
        let stored = Ingredient::from_draft(IngredientId(9_000_000_000_000), flour());
        persistence::store_ingredients(&mut store, &[stored.clone()]).expect("store");

        let mut repo = IngredientRepository::load(&store).expect("load");
        let created = repo.create(&mut store, flour(), now()).expect("create");
        assert!(created.id > stored.id);
    }

    #[test]
    fn loaded_max_id_is_never_reissued() {
        let mut store = MemoryStore::new();
        let stored = Ingredient::from_draft(IngredientId(u64::MAX), flour());
        persistence::store_ingredients(&mut store, &[stored]).expect("store");

        let mut repo = IngredientRepository::load(&store).expect("load");
        let result = repo.create(&mut store, flour(), now());

        assert!(matches!(result, Err(LarderError::Validation(_))));
        assert_eq!(repo.len(), 1);
        assert_eq!(IngredientRepository::load(&store).expect("reload").len(), 1);
    }

    #[test]
    fn failed_recipe_write_rolls_back_edit() {
        let mut store = RecipesFullStore::default();
        let mut repo = IngredientRepository::new();
        let created = repo.create(&mut store, flour(), now()).expect("create");
        let mut recipes = bread_using(&created);

        let result = repo.update(
            &mut store,
            &mut recipes,
            created.id,
            IngredientDraft::new("Rye", 15000.0, 1000.0, "g"),
        );

        assert!(matches!(result, Err(LarderError::IoError(_))));
        assert_eq!(repo.get(created.id).map(|i| i.name.as_str()), Some("Flour"));
        let stored = IngredientRepository::load(&store).expect("load");
        assert_eq!(stored.get(created.id).map(|i| i.name.as_str()), Some("Flour"));
        assert_eq!(recipes.list()[0].ingredients[0].name, "Flour");
        assert!(stale_usages(recipes.list(), repo.list()).is_empty());
    }

    #[test]
    fn failed_recipe_write_rolls_back_flag_and_delete() {
        let mut store = RecipesFullStore::default();
        let mut repo = IngredientRepository::new();
        let created = repo.create(&mut store, flour(), now()).expect("create");
        let mut recipes = bread_using(&created);

        assert!(
            repo.set_unavailable(&mut store, &mut recipes, created.id)
                .is_err()
        );
        assert!(repo.delete(&mut store, &mut recipes, created.id, true).is_err());

        assert_eq!(repo.get(created.id), Some(&created));
        assert_eq!(IngredientRepository::load(&store).expect("load").list(), repo.list());
        assert_eq!(recipes.list()[0].ingredients.len(), 1);
        assert!(!recipes.list()[0].ingredients[0].unavailable);
        assert_eq!(recipes.list()[0].total_cost, 3000.0);
    }
}
