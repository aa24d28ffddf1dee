//! Poly Python SDK generator CLI.
//!
//! Command-line interface that turns the specs of a Poly tenant into an
//! importable Python package and manages functions on the tenant.
//!
//! # Architecture
//!
//! The CLI is organized around subcommands:
//! - `setup` - Store credentials and generate the library
//! - `generate` - Regenerate the Python package from `/specs`
//! - `clear` - Remove the generated package
//! - `function` - Add or execute functions
//! - `update-rendered-spec` - Upload rendered signatures
//!
//! # Examples
//!
//! ```bash
//! # First run
//! polygen setup --api-base-url https://na1.polyapi.io --api-key $POLY_API_KEY
//!
//! # Regenerate only the billing context
//! polygen generate --contexts billing
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use polygen_cli::FunctionAction;
use polygen_cli::commands::{self, common, generate::GenerateArgs, setup::SetupArgs};
use polygen_core::cli::{ExitCode, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Poly Python SDK generator.
///
/// Fetches the specs of a Poly tenant and writes a typed Python client
/// library for them.
#[derive(Parser, Debug)]
#[command(name = "polygen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    format: String,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory of the generated package
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the Python client library.
    ///
    /// Fetches specs from the configured Poly tenant and replaces the
    /// previously generated package.
    ///
    /// # Examples
    ///
    /// ```bash
    /// polygen generate
    /// polygen generate --contexts billing,shipping --no-types
    /// ```
    Generate {
        /// Only include these contexts and their children
        #[arg(long, value_delimiter = ',')]
        contexts: Vec<String>,

        /// Only include specs with these names
        #[arg(long, value_delimiter = ',')]
        names: Vec<String>,

        /// Only include specs with these ids
        #[arg(long = "function-ids", value_delimiter = ',')]
        function_ids: Vec<String>,

        /// Skip type information and schema generation
        #[arg(long)]
        no_types: bool,
    },

    /// Remove the generated library and its spec cache.
    Clear,

    /// Configure credentials, then generate the library.
    ///
    /// Values not passed as flags are prompted for.
    Setup {
        /// Poly API key
        #[arg(long)]
        api_key: Option<String>,

        /// Tenant base URL, e.g. `https://na1.polyapi.io`
        #[arg(long)]
        api_base_url: Option<String>,

        /// Save the configuration without generating
        #[arg(long)]
        skip_generate: bool,
    },

    /// Manage functions.
    Function {
        /// Function action to perform
        #[command(subcommand)]
        action: FunctionAction,
    },

    /// Upload rendered Python signatures of the cached functions.
    UpdateRenderedSpec {
        /// Only include these contexts and their children
        #[arg(long, value_delimiter = ',')]
        contexts: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            common::exit_code_for(&err)
        }
    };

    std::process::exit(exit_code.as_i32());
}

/// Initializes logging infrastructure.
///
/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let output_format: OutputFormat = cli.format.parse()?;
    let mut ctx = common::load_config(cli.config, cli.output)?;
    execute_command(cli.command, &mut ctx, output_format).await
}

/// Executes the specified CLI command.
///
/// Routes commands to their respective handlers and returns an exit code.
async fn execute_command(
    command: Commands,
    ctx: &mut polygen_core::ConfigContext,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    match command {
        Commands::Generate {
            contexts,
            names,
            function_ids,
            no_types,
        } => {
            let args = GenerateArgs {
                contexts,
                names,
                function_ids,
                no_types,
            };
            commands::generate::run(ctx, &args, output_format).await
        }
        Commands::Clear => commands::clear::run(ctx, output_format),
        Commands::Setup {
            api_key,
            api_base_url,
            skip_generate,
        } => {
            let args = SetupArgs {
                api_key,
                api_base_url,
                skip_generate,
            };
            commands::setup::run(ctx, args, output_format).await
        }
        Commands::Function { action } => {
            commands::function::run(ctx, action, output_format).await
        }
        Commands::UpdateRenderedSpec { contexts } => {
            commands::rendered_spec::run(ctx, &contexts, output_format).await
        }
    }
}
