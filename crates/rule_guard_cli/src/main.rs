use clap::{Parser, Subcommand};

mod commands;
mod errors;
mod render;

use commands::docs_cmd::DocsArgs;
use commands::validate_cmd::ValidateArgs;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// RuleGuard CLI: Validate Prometheus rule files before they ship
#[derive(Parser)]
#[command(name = "rule-guard")]
#[command(about = "Validate Prometheus alerting and recording rules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate rule files against the configured validation rules
    #[command()]
    Validate(ValidateArgs),

    /// Render the configured validation rules as documentation
    ValidationDocs(DocsArgs),

    /// Show the CLI version
    Version,
}

/// Exit code for a validate run: 0 only for a clean run; validation
/// failures and fatal configuration or I/O errors both exit 1, so a CI
/// gate needs a single nonzero check.
fn validate_exit_code(outcome: &Result<bool, errors::Error>) -> i32 {
    match outcome {
        Ok(false) => 0,
        Ok(true) | Err(_) => 1,
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().pretty())
        .with(EnvFilter::from_env("RULE_GUARD_LOG"))
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Validate(args) => {
            let outcome = commands::validate_cmd::execute(args).await;
            if let Err(e) = &outcome {
                error!("Error: {e}");
            }
            std::process::exit(validate_exit_code(&outcome));
        }
        Commands::ValidationDocs(args) => {
            if let Err(e) = commands::docs_cmd::execute(args).await {
                error!("Error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Version => {
            // Print version info from baked-in value
            println!(
                "rule-guard version {}",
                option_env!("RULE_GUARD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
            );
            std::process::exit(0);
        }
    }
}
