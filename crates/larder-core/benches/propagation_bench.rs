//! # Propagation Benchmarks
//!
//! Cost of reconciling large recipe collections after ingredient events.
//!
//! Run with: `cargo bench -p larder-core`

use chrono::DateTime;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use larder_core::cost::CostPolicy;
use larder_core::{
    Ingredient, IngredientDraft, IngredientEvent, IngredientId, IngredientUsage, Recipe, RecipeId,
    reconcile,
};
use std::hint::black_box;

/// `size` recipes, each using 8 of 64 ingredients.
fn create_catalog(size: usize) -> (Vec<Ingredient>, Vec<Recipe>) {
    let ingredients: Vec<Ingredient> = (0..64)
        .map(|i| {
            Ingredient::from_draft(
                IngredientId(i),
                IngredientDraft::new(format!("Ingredient {}", i), 1000.0 + i as f64, 100.0, "g"),
            )
        })
        .collect();

    let recipes = (0..size)
        .map(|r| {
            let usages = (0..8)
                .map(|k| IngredientUsage::snapshot(&ingredients[(r + k * 7) % 64], 10.0))
                .collect();
            let mut recipe = Recipe {
                id: RecipeId(r as u64),
                name: format!("Recipe {}", r),
                servings: 4,
                ingredients: usages,
                total_cost: 0.0,
                cost_per_serving: 0.0,
                cooking_instructions: String::new(),
                created_date: DateTime::UNIX_EPOCH,
            };
            recipe.recalculate(CostPolicy::ExcludeUnavailable);
            recipe
        })
        .collect();

    (ingredients, recipes)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_edit_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("edit_propagation");

    for size in [100, 1_000, 10_000] {
        let (ingredients, recipes) = create_catalog(size);
        let mut edited = ingredients[0].clone();
        edited.price = 2500.0;

        group.bench_with_input(BenchmarkId::from_parameter(size), &recipes, |b, recipes| {
            b.iter_batched(
                || recipes.clone(),
                |mut batch| black_box(reconcile(&mut batch, &IngredientEvent::Edited(&edited))),
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_removal_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("removal_propagation");

    for size in [100, 1_000, 10_000] {
        let (_, recipes) = create_catalog(size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &recipes, |b, recipes| {
            b.iter_batched(
                || recipes.clone(),
                |mut batch| {
                    black_box(reconcile(
                        &mut batch,
                        &IngredientEvent::Removed(IngredientId(0)),
                    ))
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_edit_propagation, bench_removal_propagation);
criterion_main!(benches);
