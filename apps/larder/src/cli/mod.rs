//! # Larder CLI Module
//!
//! This module implements the CLI interface for Larder.
//!
//! ## Available Commands
//!
//! - `init` - Initialize a new catalog store
//! - `status` - Show catalog status
//! - `config` - Show the effective configuration
//! - `ingredient` - Add, edit, list, flag and delete ingredients
//! - `recipe` - Compose, list, edit and delete recipes
//! - `export` - Export the catalog to a file
//! - `import` - Import the catalog from a file
//! - `hash` - Compute BLAKE3 cryptographic hash of the catalog

mod commands;

use crate::config::{Backend, LarderConfig};
use clap::{Args, Parser, Subcommand};
use larder_core::{IngredientId, LarderError, RecipeId};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Larder - recipe costing
///
/// Tracks ingredient prices and the recipes built from them, and keeps every
/// recipe's cost current when an ingredient changes.
#[derive(Parser, Debug)]
#[command(name = "larder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the catalog store (overrides config and LARDER_DB)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend (overrides config and LARDER_BACKEND)
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Path to the config file (default: ./larder.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Effective configuration: file, then environment, then flags.
    pub fn resolve_config(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<LarderConfig, LarderError> {
        let config = LarderConfig::discover(self.config.as_deref(), &env)?.apply_env(&env)?;
        Ok(config.apply_flags(self.database.clone(), self.backend))
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty catalog store
    Init {
        /// Force initialization even if the store exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show catalog status
    Status,

    /// Show the effective configuration
    Config,

    /// Manage ingredients
    #[command(subcommand)]
    Ingredient(IngredientCommand),

    /// Manage recipes
    #[command(subcommand)]
    Recipe(RecipeCommand),

    /// Export the catalog
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (snapshot, json)
        #[arg(short = 't', long, default_value = "snapshot")]
        format: String,
    },

    /// Import the catalog, replacing its contents
    Import {
        /// Input file path (snapshot or JSON export)
        #[arg(short, long)]
        input: PathBuf,

        /// Replace a non-empty catalog
        #[arg(short, long)]
        force: bool,
    },

    /// Compute BLAKE3 cryptographic hash of the catalog
    Hash,
}

/// Page selection shared by the list commands.
#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Rows per page (default from config)
    #[arg(long)]
    pub per_page: Option<usize>,
}

/// Ingredient fields as entered on the command line.
#[derive(Args, Debug, Clone)]
pub struct IngredientFields {
    /// Display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Price paid for the quantity
    #[arg(short, long)]
    pub price: Option<f64>,

    /// Amount the price buys
    #[arg(short = 'Q', long)]
    pub quantity: Option<f64>,

    /// Unit label (g, ml, pcs, ...)
    #[arg(short, long)]
    pub unit: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum IngredientCommand {
    /// Add an ingredient
    Add {
        #[command(flatten)]
        fields: IngredientFields,
    },

    /// Edit an ingredient; omitted fields keep their value
    Edit {
        id: u64,

        #[command(flatten)]
        fields: IngredientFields,
    },

    /// List ingredients
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Only ingredients that can be used in new recipes
        #[arg(long)]
        available: bool,
    },

    /// Show one ingredient and the recipes using it
    Show { id: u64 },

    /// Flag an ingredient unavailable
    Unavailable { id: u64 },

    /// Flag an ingredient available again
    Available { id: u64 },

    /// Delete an ingredient
    Delete {
        id: u64,

        /// Delete even if recipes use it, removing it from them
        #[arg(short, long, conflicts_with = "mark_unavailable")]
        force: bool,

        /// If recipes use it, flag it unavailable instead
        #[arg(long)]
        mark_unavailable: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum RecipeCommand {
    /// Compose and save a recipe
    Add {
        /// Recipe name
        #[arg(short, long)]
        name: String,

        /// Number of servings
        #[arg(short, long)]
        servings: u32,

        /// Ingredient usage as INGREDIENT_ID:QUANTITY (repeatable)
        #[arg(short = 'U', long = "use", value_parser = parse_usage, required = true)]
        usages: Vec<(IngredientId, f64)>,

        /// Cooking instructions
        #[arg(short, long, default_value = "")]
        instructions: String,
    },

    /// List recipes
    List {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show one recipe with its cost breakdown
    Show { id: u64 },

    /// Edit name, servings or instructions; omitted fields keep their value
    Edit {
        id: u64,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        servings: Option<u32>,

        #[arg(short, long)]
        instructions: Option<String>,
    },

    /// Delete a recipe
    Delete { id: u64 },

    /// List recipes that use an ingredient
    Using { ingredient: u64 },
}

/// Parse `INGREDIENT_ID:QUANTITY`.
pub fn parse_usage(value: &str) -> Result<(IngredientId, f64), String> {
    let (id, quantity) = value
        .split_once(':')
        .ok_or_else(|| format!("expected INGREDIENT_ID:QUANTITY, got '{}'", value))?;
    let id = id
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid ingredient id '{}': {}", id, e))?;
    let quantity = quantity
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid quantity '{}': {}", quantity, e))?;
    Ok((IngredientId(id), quantity))
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and resolved configuration.
pub fn execute(cli: Cli, config: &LarderConfig) -> Result<(), LarderError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(config, force),
        Some(Commands::Config) => cmd_config(config, json_mode),
        Some(Commands::Status) | None => {
            let session = open_session(config)?;
            cmd_status(&session, config, json_mode)
        }
        Some(Commands::Ingredient(command)) => {
            let mut session = open_session(config)?;
            run_ingredient(&mut session, command, config, json_mode)
        }
        Some(Commands::Recipe(command)) => {
            let mut session = open_session(config)?;
            run_recipe(&mut session, command, config, json_mode)
        }
        Some(Commands::Export { output, format }) => {
            let session = open_session(config)?;
            cmd_export(&session, &output, &format)
        }
        Some(Commands::Import { input, force }) => {
            let mut session = open_session(config)?;
            cmd_import(&mut session, &input, force)
        }
        Some(Commands::Hash) => {
            let session = open_session(config)?;
            cmd_hash(&session, json_mode)
        }
    }
}

/// Dispatch an ingredient subcommand.
pub fn run_ingredient(
    session: &mut larder_core::Session,
    command: IngredientCommand,
    config: &LarderConfig,
    json_mode: bool,
) -> Result<(), LarderError> {
    match command {
        IngredientCommand::Add { fields } => cmd_ingredient_add(session, fields, json_mode),
        IngredientCommand::Edit { id, fields } => {
            cmd_ingredient_edit(session, IngredientId(id), fields, json_mode)
        }
        IngredientCommand::List { page, available } => {
            cmd_ingredient_list(session, page, config, available, json_mode)
        }
        IngredientCommand::Show { id } => cmd_ingredient_show(session, IngredientId(id), json_mode),
        IngredientCommand::Unavailable { id } => {
            cmd_ingredient_availability(session, IngredientId(id), false, json_mode)
        }
        IngredientCommand::Available { id } => {
            cmd_ingredient_availability(session, IngredientId(id), true, json_mode)
        }
        IngredientCommand::Delete {
            id,
            force,
            mark_unavailable,
        } => cmd_ingredient_delete(session, IngredientId(id), force, mark_unavailable, json_mode),
    }
}

/// Dispatch a recipe subcommand.
pub fn run_recipe(
    session: &mut larder_core::Session,
    command: RecipeCommand,
    config: &LarderConfig,
    json_mode: bool,
) -> Result<(), LarderError> {
    match command {
        RecipeCommand::Add {
            name,
            servings,
            usages,
            instructions,
        } => cmd_recipe_add(session, &name, servings, &usages, &instructions, json_mode),
        RecipeCommand::List { page } => cmd_recipe_list(session, page, config, json_mode),
        RecipeCommand::Show { id } => cmd_recipe_show(session, RecipeId(id), json_mode),
        RecipeCommand::Edit {
            id,
            name,
            servings,
            instructions,
        } => cmd_recipe_edit(session, RecipeId(id), name, servings, instructions, json_mode),
        RecipeCommand::Delete { id } => cmd_recipe_delete(session, RecipeId(id), json_mode),
        RecipeCommand::Using { ingredient } => {
            cmd_recipe_using(session, IngredientId(ingredient), json_mode)
        }
    }
}
