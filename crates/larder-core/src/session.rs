//! # Session Module
//!
//! The facade binding a store, both repositories and a clock.
//!
//! Every collaborator-facing operation is a single call here: the repository
//! validates and mutates its collection, the collection is persisted, and
//! for ingredient-side changes the recipes are reconciled and persisted too.
//!
//! ## Storage Backends
//!
//! - `InMemory`: volatile, the default
//! - `File`: one JSON document on disk
//! - `Persistent`: a redb database (ACID, crash safe)

use crate::clock::{Clock, SystemClock};
use crate::composer::RecipeComposer;
use crate::formats::{Snapshot, persistence};
use crate::ingredients::{IngredientRemoval, IngredientRepository, IngredientUpdate};
use crate::propagation::{self, PropagationReport, StaleUsage};
use crate::recipes::RecipeRepository;
use crate::storage::{JsonFileStore, RedbStore, StorageBackend};
use crate::{
    Ingredient, IngredientDraft, IngredientId, IngredientUsage, LarderError, Recipe, RecipeDraft,
    RecipeId,
};
use std::path::Path;

/// How to resolve a delete that was refused because recipes still use the
/// ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep the ingredient, flagged unavailable.
    MarkUnavailable,
    /// Delete it and drop it from every recipe.
    ForceDelete,
}

/// What `dispose_ingredient` did.
#[derive(Debug, Clone, PartialEq)]
pub enum DispositionOutcome {
    MarkedUnavailable(PropagationReport),
    Deleted(IngredientRemoval),
}

/// A Session owns the catalogs and the store they persist to.
///
/// Note: Session does NOT implement Clone; the redb handle cannot be cloned.
#[derive(Debug)]
pub struct Session {
    /// The store every mutation writes through.
    backend: StorageBackend,
    ingredients: IngredientRepository,
    recipes: RecipeRepository,
    /// Source of ids and creation dates.
    clock: Box<dyn Clock>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            ingredients: IngredientRepository::new(),
            recipes: RecipeRepository::new(),
            clock: Box::new(SystemClock),
        }
    }
}

impl Session {
    /// Create a new empty session with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session over `backend`, loading both collections.
    pub fn with_store(backend: StorageBackend) -> Result<Self, LarderError> {
        let ingredients = IngredientRepository::load(&backend)?;
        let recipes = RecipeRepository::load(&backend)?;
        Ok(Self {
            backend,
            ingredients,
            recipes,
            clock: Box::new(SystemClock),
        })
    }

    /// Open or create a redb-backed session at `path`.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, LarderError> {
        Self::with_store(StorageBackend::Persistent(RedbStore::open(path)?))
    }

    /// Open or create a JSON-file-backed session at `path`.
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self, LarderError> {
        Self::with_store(StorageBackend::File(JsonFileStore::open(path)?))
    }

    /// Replace the clock used for ids and creation dates.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    /// Whether writes survive the process.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.backend.is_durable()
    }

    #[must_use]
    pub fn ingredients(&self) -> &IngredientRepository {
        &self.ingredients
    }

    #[must_use]
    pub fn recipes(&self) -> &RecipeRepository {
        &self.recipes
    }

    #[must_use]
    pub fn ingredient(&self, id: IngredientId) -> Option<&Ingredient> {
        self.ingredients.get(id)
    }

    #[must_use]
    pub fn recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    /// Recipes that use `id`.
    #[must_use]
    pub fn recipes_using(&self, id: IngredientId) -> Vec<&Recipe> {
        self.recipes.referencing(id)
    }

    // =========================================================================
    // INGREDIENT OPERATIONS
    // =========================================================================

    pub fn create_ingredient(&mut self, draft: IngredientDraft) -> Result<Ingredient, LarderError> {
        let now = self.clock.now();
        self.ingredients.create(&mut self.backend, draft, now)
    }

    pub fn update_ingredient(
        &mut self,
        id: IngredientId,
        draft: IngredientDraft,
    ) -> Result<IngredientUpdate, LarderError> {
        self.ingredients
            .update(&mut self.backend, &mut self.recipes, id, draft)
    }

    pub fn mark_unavailable(&mut self, id: IngredientId) -> Result<PropagationReport, LarderError> {
        self.ingredients
            .set_unavailable(&mut self.backend, &mut self.recipes, id)
    }

    pub fn mark_available(&mut self, id: IngredientId) -> Result<PropagationReport, LarderError> {
        self.ingredients
            .set_available(&mut self.backend, &mut self.recipes, id)
    }

    /// Delete `id`. Without `force`, refuses while recipes still use it.
    pub fn delete_ingredient(
        &mut self,
        id: IngredientId,
        force: bool,
    ) -> Result<IngredientRemoval, LarderError> {
        self.ingredients
            .delete(&mut self.backend, &mut self.recipes, id, force)
    }

    /// Resolve a refused delete.
    pub fn dispose_ingredient(
        &mut self,
        id: IngredientId,
        disposition: Disposition,
    ) -> Result<DispositionOutcome, LarderError> {
        match disposition {
            Disposition::MarkUnavailable => self
                .mark_unavailable(id)
                .map(DispositionOutcome::MarkedUnavailable),
            Disposition::ForceDelete => self
                .delete_ingredient(id, true)
                .map(DispositionOutcome::Deleted),
        }
    }

    // =========================================================================
    // RECIPE OPERATIONS
    // =========================================================================

    /// Add or update a usage in a caller-owned composer.
    pub fn add_usage<'c>(
        &self,
        composer: &'c mut RecipeComposer,
        ingredient: IngredientId,
        used_quantity: f64,
    ) -> Result<&'c IngredientUsage, LarderError> {
        composer.add_or_update_usage(&self.ingredients, ingredient, used_quantity)
    }

    /// Build a recipe from `composer`, store it, then clear the composer.
    ///
    /// On error the composer keeps its entries.
    pub fn commit_recipe(
        &mut self,
        composer: &mut RecipeComposer,
        draft: RecipeDraft,
    ) -> Result<Recipe, LarderError> {
        let now = self.clock.now();
        let recipe = composer.build(draft, &mut self.recipes, now)?;
        self.recipes.create(&mut self.backend, recipe.clone())?;
        composer.clear();
        Ok(recipe)
    }

    pub fn update_recipe(&mut self, id: RecipeId, draft: RecipeDraft) -> Result<Recipe, LarderError> {
        self.recipes.update(&mut self.backend, id, draft)
    }

    pub fn delete_recipe(&mut self, id: RecipeId) -> Result<Recipe, LarderError> {
        self.recipes.delete(&mut self.backend, id)
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    /// Copy both collections.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.ingredients.list().to_vec(),
            self.recipes.list().to_vec(),
        )
    }

    /// Replace both collections with `snapshot`.
    ///
    /// Both collections are checked for duplicate ids, then written in one
    /// store operation.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), LarderError> {
        let ingredients = IngredientRepository::from_records(snapshot.ingredients)?;
        let recipes = RecipeRepository::from_records(snapshot.recipes)?;

        persistence::store_catalog(&mut self.backend, ingredients.list(), recipes.list())?;
        self.ingredients.absorb(ingredients);
        self.recipes.absorb(recipes);
        Ok(())
    }

    /// Usages that disagree with the catalog.
    #[must_use]
    pub fn stale_usages(&self) -> Vec<StaleUsage> {
        propagation::stale_usages(self.recipes.list(), self.ingredients.list())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use tempfile::tempdir;

    fn session() -> Session {
        Session::new().with_clock(FixedClock::at_millis(1_700_000_000_000))
    }

    #[test]
    fn new_session_is_empty_and_volatile() {
        let session = Session::new();
        assert!(session.ingredients().is_empty());
        assert!(session.recipes().is_empty());
        assert!(!session.is_persistent());
        assert_eq!(session.backend().kind(), "memory");
    }

    #[test]
    fn commit_recipe_stores_and_clears() {
        let mut session = session();
        let flour = session
            .create_ingredient(IngredientDraft::new("Flour", 15000.0, 1000.0, "g"))
            .expect("flour");

        let mut composer = RecipeComposer::new();
        session
            .add_usage(&mut composer, flour.id, 200.0)
            .expect("usage");
        let recipe = session
            .commit_recipe(&mut composer, RecipeDraft::new("Bread", 4))
            .expect("commit");

        assert!(composer.is_empty());
        assert_eq!(session.recipe(recipe.id), Some(&recipe));
        assert_eq!(recipe.cost_per_serving, 750.0);
    }

    #[test]
    fn dispose_marks_or_deletes() {
        let mut session = session();
        let flour = session
            .create_ingredient(IngredientDraft::new("Flour", 15000.0, 1000.0, "g"))
            .expect("flour");
        let mut composer = RecipeComposer::new();
        session.add_usage(&mut composer, flour.id, 200.0).expect("usage");
        session
            .commit_recipe(&mut composer, RecipeDraft::new("Bread", 4))
            .expect("commit");

        let outcome = session
            .dispose_ingredient(flour.id, Disposition::MarkUnavailable)
            .expect("mark");
        assert!(matches!(
            outcome,
            DispositionOutcome::MarkedUnavailable(PropagationReport {
                recipes_affected: 1,
                usages_affected: 1
            })
        ));

        let outcome = session
            .dispose_ingredient(flour.id, Disposition::ForceDelete)
            .expect("delete");
        assert!(matches!(outcome, DispositionOutcome::Deleted(_)));
        assert!(session.ingredient(flour.id).is_none());
        assert!(session.stale_usages().is_empty());
    }

    #[test]
    fn redb_session_survives_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("larder.redb");

        let id = {
            let mut session = Session::with_redb(&path).expect("open");
            assert!(session.is_persistent());
            session
                .create_ingredient(IngredientDraft::new("Salt", 500.0, 250.0, "g"))
                .expect("create")
                .id
        };

        let session = Session::with_redb(&path).expect("reopen");
        assert_eq!(session.ingredient(id).map(|i| i.name.as_str()), Some("Salt"));
    }

    #[test]
    fn restore_rejects_duplicates_without_writing() {
        let mut session = session();
        session
            .create_ingredient(IngredientDraft::new("Salt", 500.0, 250.0, "g"))
            .expect("create");

        let salt = session.ingredients().list()[0].clone();
        let bad = Snapshot::new(vec![salt.clone(), salt], Vec::new());
        assert!(session.restore(bad).is_err());
        assert_eq!(session.ingredients().len(), 1);
    }

    #[test]
    fn restore_lands_both_collections_in_file_store() {
        let mut source = session();
        let salt = source
            .create_ingredient(IngredientDraft::new("Salt", 500.0, 250.0, "g"))
            .expect("create");
        let mut composer = RecipeComposer::new();
        source.add_usage(&mut composer, salt.id, 5.0).expect("usage");
        source
            .commit_recipe(&mut composer, RecipeDraft::new("Brine", 1))
            .expect("commit");
        let snapshot = source.snapshot();

        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("larder.json");
        {
            let mut target = Session::with_file(&path).expect("open");
            target.restore(snapshot.clone()).expect("restore");
        }

        let reopened = Session::with_file(&path).expect("reopen");
        assert_eq!(reopened.snapshot(), snapshot);
    }
}
