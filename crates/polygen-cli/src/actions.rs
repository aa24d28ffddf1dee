//! Action type definitions for CLI commands.

use clap::Subcommand;
use std::path::PathBuf;

/// Function management actions.
#[derive(Subcommand, Debug)]
pub enum FunctionAction {
    /// Upload a Python function to Poly
    Add {
        /// Function name
        name: String,

        /// Python file with the function code
        file: PathBuf,

        /// Context the function is registered under
        #[arg(long, default_value = "")]
        context: String,

        /// Function description
        #[arg(long, default_value = "")]
        description: String,

        /// Register as a server function instead of a client function
        #[arg(long)]
        server: bool,

        /// Enable execution logs for the function
        #[arg(long)]
        logs: bool,
    },

    /// Execute a generated function by its `context.name`
    Execute {
        /// Function reference, e.g. `billing.invoices.create`
        function: String,

        /// Arguments as a JSON object or array
        args: Option<String>,
    },
}
