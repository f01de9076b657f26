//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Each command takes an open `Session`, performs one operation, logs what
//! propagation did, and prints either a human-readable view or JSON.

use super::{IngredientFields, PageArgs};
use crate::config::{Backend, LarderConfig};
use larder_core::formats::snapshot::snapshot_digest;
use larder_core::{
    Disposition, DispositionOutcome, Ingredient, IngredientDraft, IngredientId, LarderError,
    Pager, Recipe, RecipeComposer, RecipeDraft, RecipeId, Session, Snapshot, export_json,
    export_snapshot, format_rupiah, import_json, import_snapshot,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for import (256 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_IMPORT_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), LarderError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| LarderError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(LarderError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path, requiring a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, LarderError> {
    let canonical = path.canonicalize().map_err(|e| {
        LarderError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(LarderError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path, requiring an existing parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, LarderError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        LarderError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(LarderError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| LarderError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SESSION
// =============================================================================

/// Open the configured store, loading both collections.
pub fn open_session(config: &LarderConfig) -> Result<Session, LarderError> {
    tracing::debug!(
        database = %config.database.display(),
        backend = %config.backend,
        "opening catalog"
    );
    match config.backend {
        Backend::Redb => Session::with_redb(&config.database),
        Backend::File => Session::with_file(&config.database),
    }
}

// =============================================================================
// INIT / STATUS / CONFIG
// =============================================================================

/// Initialize a new empty store.
pub fn cmd_init(config: &LarderConfig, force: bool) -> Result<(), LarderError> {
    let path = &config.database;
    if path.exists() {
        if !force {
            return Err(LarderError::IoError(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(path)
            .map_err(|e| LarderError::IoError(format!("Remove existing database: {}", e)))?;
        tracing::warn!(database = %path.display(), "existing database removed");
    }

    // Writing both keys makes an empty store distinguishable from a missing one
    let mut session = open_session(config)?;
    session.restore(Snapshot::default())?;

    println!(
        "Initialized new {} database at {}",
        config.backend,
        path.display()
    );
    Ok(())
}

/// Show catalog status.
pub fn cmd_status(
    session: &Session,
    config: &LarderConfig,
    json_mode: bool,
) -> Result<(), LarderError> {
    let ingredients = session.ingredients();
    let recipes = session.recipes();
    let available = ingredients.available().count();
    let flagged = recipes.list().iter().filter(|r| r.has_unavailable()).count();
    let stale = session.stale_usages();

    if json_mode {
        print_json(&serde_json::json!({
            "database": config.database.to_string_lossy(),
            "backend": session.backend().kind(),
            "ingredient_count": ingredients.len(),
            "available_ingredients": available,
            "unavailable_ingredients": ingredients.len() - available,
            "recipe_count": recipes.len(),
            "recipes_with_unavailable": flagged,
            "stale_usages": stale.len(),
        }));
        return Ok(());
    }

    println!("Larder Catalog Status");
    println!("=====================");
    println!("Database: {}", config.database.display());
    println!("Backend:  {}", session.backend().kind());
    println!();
    println!(
        "Ingredients: {} ({} available, {} unavailable)",
        ingredients.len(),
        available,
        ingredients.len() - available
    );
    println!(
        "Recipes:     {} ({} with unavailable ingredients)",
        recipes.len(),
        flagged
    );
    if !stale.is_empty() {
        tracing::warn!(count = stale.len(), "stale ingredient usages found");
        println!("Stale usages: {}", stale.len());
    }

    Ok(())
}

/// Show the effective configuration.
pub fn cmd_config(config: &LarderConfig, json_mode: bool) -> Result<(), LarderError> {
    if json_mode {
        let value = serde_json::to_value(config)
            .map_err(|e| LarderError::SerializationError(e.to_string()))?;
        print_json(&value);
        return Ok(());
    }

    println!("database   = {}", config.database.display());
    println!("backend    = {}", config.backend);
    println!("page_size  = {}", config.page_size);
    println!("log_format = {}", config.log_format);
    Ok(())
}

// =============================================================================
// INGREDIENT COMMANDS
// =============================================================================

fn ingredient_json(ingredient: &Ingredient) -> serde_json::Value {
    serde_json::to_value(ingredient).unwrap_or_default()
}

fn print_ingredient_row(ingredient: &Ingredient) {
    println!(
        "{:>14}  {:<24} {:>14} / {} {}{}",
        ingredient.id,
        ingredient.name,
        format_rupiah(ingredient.price),
        ingredient.quantity,
        ingredient.unit,
        if ingredient.unavailable {
            "  [unavailable]"
        } else {
            ""
        }
    );
}

fn require_field<T>(value: Option<T>, name: &str) -> Result<T, LarderError> {
    value.ok_or_else(|| LarderError::Validation(format!("{} is required", name)))
}

/// Add an ingredient.
pub fn cmd_ingredient_add(
    session: &mut Session,
    fields: IngredientFields,
    json_mode: bool,
) -> Result<(), LarderError> {
    let draft = IngredientDraft::new(
        require_field(fields.name, "name")?,
        require_field(fields.price, "price")?,
        require_field(fields.quantity, "quantity")?,
        require_field(fields.unit, "unit")?,
    );
    let ingredient = session.create_ingredient(draft)?;
    tracing::info!(id = %ingredient.id, name = %ingredient.name, "ingredient created");

    if json_mode {
        print_json(&ingredient_json(&ingredient));
    } else {
        println!("Added ingredient {}", ingredient.id);
        print_ingredient_row(&ingredient);
    }
    Ok(())
}

/// Edit an ingredient, keeping omitted fields.
pub fn cmd_ingredient_edit(
    session: &mut Session,
    id: IngredientId,
    fields: IngredientFields,
    json_mode: bool,
) -> Result<(), LarderError> {
    let existing = session
        .ingredient(id)
        .ok_or(LarderError::IngredientNotFound(id))?;
    let draft = IngredientDraft::new(
        fields.name.unwrap_or_else(|| existing.name.clone()),
        fields.price.unwrap_or(existing.price),
        fields.quantity.unwrap_or(existing.quantity),
        fields.unit.unwrap_or_else(|| existing.unit.clone()),
    );

    let update = session.update_ingredient(id, draft)?;
    tracing::info!(
        id = %id,
        recipes_affected = update.propagation.recipes_affected,
        usages_affected = update.propagation.usages_affected,
        "ingredient updated"
    );

    if json_mode {
        print_json(&serde_json::json!({
            "previous": ingredient_json(&update.previous),
            "current": ingredient_json(&update.current),
            "propagation": update.propagation,
        }));
    } else {
        println!("Updated ingredient {}", id);
        print_ingredient_row(&update.current);
        println!(
            "Recipes updated: {}",
            update.propagation.recipes_affected
        );
    }
    Ok(())
}

/// List ingredients, one page at a time.
pub fn cmd_ingredient_list(
    session: &Session,
    page: PageArgs,
    config: &LarderConfig,
    available_only: bool,
    json_mode: bool,
) -> Result<(), LarderError> {
    let items: Vec<&Ingredient> = if available_only {
        session.ingredients().available().collect()
    } else {
        session.ingredients().list().iter().collect()
    };
    let pager = pager_for(page, config, items.len());
    let shown = pager.slice(&items);

    if json_mode {
        print_json(&serde_json::json!({
            "page": pager.page(),
            "per_page": pager.per_page(),
            "total": items.len(),
            "total_pages": pager.total_pages(items.len()),
            "ingredients": shown.iter().map(|i| ingredient_json(i)).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    if items.is_empty() {
        println!("No ingredients.");
        return Ok(());
    }
    for ingredient in shown {
        print_ingredient_row(ingredient);
    }
    print_page_footer(&pager, items.len());
    Ok(())
}

/// Show one ingredient and the recipes that use it.
pub fn cmd_ingredient_show(
    session: &Session,
    id: IngredientId,
    json_mode: bool,
) -> Result<(), LarderError> {
    let ingredient = session
        .ingredient(id)
        .ok_or(LarderError::IngredientNotFound(id))?;
    let users = session.recipes_using(id);

    if json_mode {
        print_json(&serde_json::json!({
            "ingredient": ingredient_json(ingredient),
            "unit_cost": ingredient.unit_cost(),
            "used_by": users.iter().map(|r| r.summary()).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    println!("Ingredient {}", ingredient.id);
    println!("  Name:      {}", ingredient.name);
    println!(
        "  Price:     {} for {} {}",
        format_rupiah(ingredient.price),
        ingredient.quantity,
        ingredient.unit
    );
    println!(
        "  Unit cost: {} per {}",
        format_rupiah(ingredient.unit_cost()),
        ingredient.unit
    );
    println!(
        "  Status:    {}",
        if ingredient.unavailable {
            "unavailable"
        } else {
            "available"
        }
    );
    if users.is_empty() {
        println!("  Used by:   no recipes");
    } else {
        println!("  Used by:");
        for recipe in users {
            println!("    {}  {}", recipe.id, recipe.name);
        }
    }
    Ok(())
}

/// Flag an ingredient available or unavailable.
pub fn cmd_ingredient_availability(
    session: &mut Session,
    id: IngredientId,
    available: bool,
    json_mode: bool,
) -> Result<(), LarderError> {
    let report = if available {
        session.mark_available(id)?
    } else {
        session.mark_unavailable(id)?
    };
    let state = if available { "available" } else { "unavailable" };
    tracing::info!(
        id = %id,
        state,
        recipes_affected = report.recipes_affected,
        "ingredient availability changed"
    );

    if json_mode {
        print_json(&serde_json::json!({
            "id": id,
            "state": state,
            "propagation": report,
        }));
    } else {
        println!(
            "Ingredient {} is now {} ({} recipe(s) updated)",
            id, state, report.recipes_affected
        );
    }
    Ok(())
}

/// Delete an ingredient.
///
/// Without `--force` or `--mark-unavailable`, an ingredient still used by
/// recipes is refused and the recipes are listed.
pub fn cmd_ingredient_delete(
    session: &mut Session,
    id: IngredientId,
    force: bool,
    mark_unavailable: bool,
    json_mode: bool,
) -> Result<(), LarderError> {
    let outcome = match session.delete_ingredient(id, force) {
        Ok(removal) => DispositionOutcome::Deleted(removal),
        Err(LarderError::ReferentialConflict { recipes, .. }) if mark_unavailable => {
            tracing::info!(
                id = %id,
                recipes = recipes.len(),
                "ingredient in use, marking unavailable instead"
            );
            session.dispose_ingredient(id, Disposition::MarkUnavailable)?
        }
        Err(LarderError::ReferentialConflict { ingredient, recipes }) => {
            for recipe in &recipes {
                tracing::warn!(recipe = %recipe.id, name = %recipe.name, "ingredient still used");
            }
            if !json_mode {
                eprintln!("Ingredient {} is used by:", ingredient);
                for recipe in &recipes {
                    eprintln!("  {}  {}", recipe.id, recipe.name);
                }
                eprintln!("Use --force to remove it from these recipes, or --mark-unavailable.");
            }
            return Err(LarderError::ReferentialConflict { ingredient, recipes });
        }
        Err(e) => return Err(e),
    };

    match outcome {
        DispositionOutcome::Deleted(removal) => {
            tracing::info!(
                id = %id,
                recipes_affected = removal.propagation.recipes_affected,
                "ingredient deleted"
            );
            if json_mode {
                print_json(&serde_json::json!({
                    "deleted": ingredient_json(&removal.ingredient),
                    "propagation": removal.propagation,
                }));
            } else {
                println!(
                    "Deleted ingredient {} ({} recipe(s) updated)",
                    id, removal.propagation.recipes_affected
                );
            }
        }
        DispositionOutcome::MarkedUnavailable(report) => {
            if json_mode {
                print_json(&serde_json::json!({
                    "id": id,
                    "state": "unavailable",
                    "propagation": report,
                }));
            } else {
                println!(
                    "Ingredient {} is in use; marked unavailable ({} recipe(s) updated)",
                    id, report.recipes_affected
                );
            }
        }
    }
    Ok(())
}

// =============================================================================
// RECIPE COMMANDS
// =============================================================================

fn recipe_json(recipe: &Recipe) -> serde_json::Value {
    serde_json::to_value(recipe).unwrap_or_default()
}

fn print_recipe_row(recipe: &Recipe) {
    println!(
        "{:>14}  {:<24} {:>3} serving(s)  {:>14}  {:>14}/serving{}",
        recipe.id,
        recipe.name,
        recipe.servings,
        format_rupiah(recipe.total_cost),
        format_rupiah(recipe.cost_per_serving),
        if recipe.has_unavailable() {
            "  [has unavailable]"
        } else {
            ""
        }
    );
}

/// Compose and save a recipe from `ID:QTY` usages.
pub fn cmd_recipe_add(
    session: &mut Session,
    name: &str,
    servings: u32,
    usages: &[(IngredientId, f64)],
    instructions: &str,
    json_mode: bool,
) -> Result<(), LarderError> {
    let mut composer = RecipeComposer::new();
    for (ingredient, quantity) in usages {
        session.add_usage(&mut composer, *ingredient, *quantity)?;
    }
    tracing::debug!(
        usages = composer.len(),
        preview = composer.cost_per_serving(servings),
        "recipe composed"
    );

    let draft = RecipeDraft::new(name, servings).with_instructions(instructions);
    let recipe = session.commit_recipe(&mut composer, draft)?;
    tracing::info!(id = %recipe.id, name = %recipe.name, "recipe created");

    if json_mode {
        print_json(&recipe_json(&recipe));
    } else {
        println!("Added recipe {}", recipe.id);
        print_recipe_row(&recipe);
    }
    Ok(())
}

/// List recipes, one page at a time.
pub fn cmd_recipe_list(
    session: &Session,
    page: PageArgs,
    config: &LarderConfig,
    json_mode: bool,
) -> Result<(), LarderError> {
    let items = session.recipes().list();
    let pager = pager_for(page, config, items.len());
    let shown = pager.slice(items);

    if json_mode {
        print_json(&serde_json::json!({
            "page": pager.page(),
            "per_page": pager.per_page(),
            "total": items.len(),
            "total_pages": pager.total_pages(items.len()),
            "recipes": shown.iter().map(recipe_json).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    if items.is_empty() {
        println!("No recipes.");
        return Ok(());
    }
    for recipe in shown {
        print_recipe_row(recipe);
    }
    print_page_footer(&pager, items.len());
    Ok(())
}

/// Show one recipe with its cost breakdown.
pub fn cmd_recipe_show(
    session: &Session,
    id: RecipeId,
    json_mode: bool,
) -> Result<(), LarderError> {
    let recipe = session.recipe(id).ok_or(LarderError::RecipeNotFound(id))?;

    if json_mode {
        print_json(&serde_json::json!({
            "recipe": recipe_json(recipe),
            "breakdown": recipe.breakdown(),
            "available_count": recipe.available_count(),
            "unavailable_count": recipe.unavailable_count(),
        }));
        return Ok(());
    }

    println!("Recipe {}: {}", recipe.id, recipe.name);
    println!(
        "  Created:  {}",
        recipe.created_date.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  Servings: {}", recipe.servings);
    println!();
    println!("  Ingredients:");
    for line in recipe.breakdown() {
        let cost = line
            .cost
            .map(format_rupiah)
            .unwrap_or_else(|| "unavailable".to_string());
        println!(
            "    {:<24} {:>10} {:<5} {:>14}",
            line.name, line.used_quantity, line.unit, cost
        );
    }
    if recipe.has_unavailable() {
        println!(
            "  ({} of {} ingredients unavailable, excluded from cost)",
            recipe.unavailable_count(),
            recipe.ingredients.len()
        );
    }
    println!();
    println!("  Total cost:       {}", format_rupiah(recipe.total_cost));
    println!(
        "  Cost per serving: {}",
        format_rupiah(recipe.cost_per_serving)
    );
    if !recipe.cooking_instructions.is_empty() {
        println!();
        println!("  Instructions:");
        for line in recipe.cooking_instructions.lines() {
            println!("    {}", line);
        }
    }
    Ok(())
}

/// Edit name, servings or instructions, keeping omitted fields.
pub fn cmd_recipe_edit(
    session: &mut Session,
    id: RecipeId,
    name: Option<String>,
    servings: Option<u32>,
    instructions: Option<String>,
    json_mode: bool,
) -> Result<(), LarderError> {
    let existing = session.recipe(id).ok_or(LarderError::RecipeNotFound(id))?;
    let draft = RecipeDraft::new(
        name.unwrap_or_else(|| existing.name.clone()),
        servings.unwrap_or(existing.servings),
    )
    .with_instructions(instructions.unwrap_or_else(|| existing.cooking_instructions.clone()));

    let recipe = session.update_recipe(id, draft)?;
    tracing::info!(id = %id, "recipe updated");

    if json_mode {
        print_json(&recipe_json(&recipe));
    } else {
        println!("Updated recipe {}", id);
        print_recipe_row(&recipe);
    }
    Ok(())
}

/// Delete a recipe.
pub fn cmd_recipe_delete(
    session: &mut Session,
    id: RecipeId,
    json_mode: bool,
) -> Result<(), LarderError> {
    let recipe = session.delete_recipe(id)?;
    tracing::info!(id = %id, name = %recipe.name, "recipe deleted");

    if json_mode {
        print_json(&serde_json::json!({ "deleted": recipe_json(&recipe) }));
    } else {
        println!("Deleted recipe {} ({})", id, recipe.name);
    }
    Ok(())
}

/// List the recipes that use an ingredient.
pub fn cmd_recipe_using(
    session: &Session,
    ingredient: IngredientId,
    json_mode: bool,
) -> Result<(), LarderError> {
    if session.ingredient(ingredient).is_none() {
        return Err(LarderError::IngredientNotFound(ingredient));
    }
    let users = session.recipes_using(ingredient);

    if json_mode {
        print_json(&serde_json::json!({
            "ingredient": ingredient,
            "recipes": users.iter().map(|r| r.summary()).collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    if users.is_empty() {
        println!("No recipes use ingredient {}.", ingredient);
    }
    for recipe in users {
        print_recipe_row(recipe);
    }
    Ok(())
}

// =============================================================================
// PAGINATION
// =============================================================================

fn pager_for(page: PageArgs, config: &LarderConfig, len: usize) -> Pager {
    let mut pager = Pager::new(page.per_page.unwrap_or(config.page_size));
    pager.go_to(page.page, len);
    pager
}

fn print_page_footer(pager: &Pager, len: usize) {
    if let Some(range) = pager.range_info(len) {
        println!();
        println!(
            "Showing {}-{} of {}",
            range.first, range.last, range.total
        );
    }
    if let Some(window) = pager.window(len) {
        let mut parts = Vec::new();
        if window.has_prev {
            parts.push("<".to_string());
        }
        if window.show_first {
            parts.push("1".to_string());
        }
        if window.leading_ellipsis {
            parts.push("...".to_string());
        }
        for page in &window.pages {
            if *page == pager.page() {
                parts.push(format!("[{}]", page));
            } else {
                parts.push(page.to_string());
            }
        }
        if window.trailing_ellipsis {
            parts.push("...".to_string());
        }
        if window.show_last {
            parts.push(pager.total_pages(len).to_string());
        }
        if window.has_next {
            parts.push(">".to_string());
        }
        println!("Pages: {}", parts.join(" "));
    }
}

// =============================================================================
// EXPORT / IMPORT / HASH
// =============================================================================

/// Export the catalog to a file.
pub fn cmd_export(session: &Session, output: &Path, format: &str) -> Result<(), LarderError> {
    let validated_output = validate_output_path(output)?;
    let snapshot = session.snapshot();

    let data = match format {
        "snapshot" => {
            let data = export_snapshot(&snapshot)?;
            println!("Digest: {}", snapshot_digest(&data));
            data
        }
        "json" => export_json(&snapshot)?.into_bytes(),
        _ => {
            return Err(LarderError::Validation(format!(
                "Unknown format: {}. Use: snapshot, json",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| LarderError::IoError(format!("Write file: {}", e)))?;

    tracing::info!(
        bytes = data.len(),
        ingredients = snapshot.ingredients.len(),
        recipes = snapshot.recipes.len(),
        "catalog exported"
    );
    println!(
        "Exported {} bytes to {}",
        data.len(),
        validated_output.display()
    );
    Ok(())
}

/// Import a catalog export, replacing both collections.
pub fn cmd_import(session: &mut Session, input: &Path, force: bool) -> Result<(), LarderError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| LarderError::IoError(format!("Read file: {}", e)))?;

    let snapshot = match import_snapshot(&data) {
        Ok(snapshot) => snapshot,
        Err(binary_err) => {
            let text = std::str::from_utf8(&data).map_err(|_| binary_err)?;
            import_json(text)?
        }
    };

    if !force && (!session.ingredients().is_empty() || !session.recipes().is_empty()) {
        return Err(LarderError::Validation(
            "Catalog is not empty. Use --force to replace it.".to_string(),
        ));
    }

    let (ingredients, recipes) = (snapshot.ingredients.len(), snapshot.recipes.len());
    session.restore(snapshot)?;

    let stale = session.stale_usages();
    if !stale.is_empty() {
        tracing::warn!(count = stale.len(), "imported recipes disagree with ingredients");
    }
    tracing::info!(ingredients, recipes, "catalog imported");
    println!(
        "Imported catalog: {} ingredients, {} recipes",
        ingredients, recipes
    );
    Ok(())
}

/// Compute the BLAKE3 digest of the catalog's snapshot export.
pub fn cmd_hash(session: &Session, json_mode: bool) -> Result<(), LarderError> {
    let snapshot = session.snapshot();
    let data = export_snapshot(&snapshot)?;
    let digest = snapshot_digest(&data);

    if json_mode {
        print_json(&serde_json::json!({
            "algorithm": "blake3",
            "hash": digest,
            "ingredient_count": snapshot.ingredients.len(),
            "recipe_count": snapshot.recipes.len(),
        }));
    } else {
        println!("BLAKE3: {}", digest);
    }
    Ok(())
}
