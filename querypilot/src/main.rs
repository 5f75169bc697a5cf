//! Natural-language-to-SQL pipeline CLI.
//!
//! This binary wires the pipeline stages together: it inspects the target
//! database's schema, asks a hosted LLM to turn a question into a SELECT
//! statement, validates the statement, and executes it. Validation and
//! execution are gated by an admin credential.
//!
//! # Security Guarantees
//! - The admin credential is read from the environment or an interactive
//!   prompt, compared in-process, and never logged
//! - Database connection strings are sanitized in all output
//! - Generated SQL must pass a keyword denylist, a SELECT shape check, and
//!   an `EXPLAIN` probe before it is executed

use std::io::IsTerminal;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use querypilot_core::{
    ChatCompletionsGenerator, Pipeline, PipelineConfig, SchemaInspector, create_driver,
    logging::init_logging, redact_database_url,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "querypilot")]
#[command(about = "Ask questions against a relational database in plain language")]
#[command(version)]
#[command(long_about = "
QueryPilot - natural-language-to-SQL pipeline

Turns a free-text question into a SQL SELECT statement via a hosted LLM,
validates the statement, and executes it against the configured database.

SECURITY FEATURES:
- Admin credential gates both validation and execution
- Keyword denylist + EXPLAIN probe before any statement runs
- Credentials never logged; connection strings sanitized

CONFIGURATION (environment, or a local .env file):
  DATABASE_URL      target database (postgres:// or sqlite:)
  ADMIN_CREDENTIAL  admin credential the gates compare against
  LLM_API_KEY       API key for the chat-completions endpoint
  LLM_BASE_URL      optional endpoint override
  LLM_MODEL         optional model override

EXAMPLES:
  querypilot ask \"how many users signed up this month?\"
  querypilot inspect
  querypilot test
")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline for one question
    Ask(AskArgs),
    /// Print the schema snapshot the generator would receive
    Inspect(DatabaseArgs),
    /// Test the database connection
    Test(DatabaseArgs),
}

#[derive(Args)]
struct AskArgs {
    /// Natural-language question to turn into a SELECT statement
    question: String,
}

#[derive(Args)]
struct DatabaseArgs {
    /// Database connection URL
    #[arg(
        long,
        env = "DATABASE_URL",
        help = "Database connection string (credentials will be sanitized in logs)"
    )]
    database_url: String,
}

#[derive(Args)]
struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match cli.command {
        Command::Ask(args) => ask(args).await,
        Command::Inspect(args) => inspect(&args.database_url).await,
        Command::Test(args) => test_connection(&args.database_url).await,
    }
}

/// Runs the full four-stage pipeline for one question.
async fn ask(args: AskArgs) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env().context("pipeline configuration")?;
    let supplied_credential = resolve_credential()?;

    info!("target: {}", redact_database_url(&config.database_url));

    let driver = create_driver(&config.database_url).map_err(|e| {
        error!("failed to create database driver: {e}");
        e
    })?;
    let generator = ChatCompletionsGenerator::new(config.llm.clone());

    let pipeline = Pipeline::new(&config, driver.as_ref(), &generator);
    let outcome = pipeline.run(&args.question, &supplied_credential).await?;

    println!("{}", outcome.to_json()?);
    Ok(())
}

/// Prints the schema snapshot as JSON.
async fn inspect(database_url: &str) -> anyhow::Result<()> {
    info!("target: {}", redact_database_url(database_url));

    let driver = create_driver(database_url)?;
    let snapshot = SchemaInspector::new(driver.as_ref()).inspect().await?;

    info!("found {} tables", snapshot.table_count());
    println!("{}", snapshot.to_json()?);
    Ok(())
}

/// Tests database connectivity without touching any table.
async fn test_connection(database_url: &str) -> anyhow::Result<()> {
    info!("testing database connection...");

    let driver = create_driver(database_url).map_err(|e| {
        error!("failed to create database driver: {e}");
        e
    })?;

    driver.test_connection().await.map_err(|e| {
        error!("connection test failed: {e}");
        e
    })?;

    println!(
        "Connection to {} database successful",
        driver.database_type()
    );
    Ok(())
}

/// Resolves the supplied admin credential from the environment, falling
/// back to an interactive prompt when attached to a terminal.
///
/// The credential is never accepted on the command line; argv is visible
/// in process listings.
fn resolve_credential() -> anyhow::Result<String> {
    if let Ok(credential) = std::env::var("ADMIN_CREDENTIAL") {
        if !credential.is_empty() {
            return Ok(credential);
        }
    }

    if !std::io::stdin().is_terminal() {
        anyhow::bail!("no admin credential: set ADMIN_CREDENTIAL when not interactive");
    }

    let credential = rpassword::prompt_password("Admin credential: ")
        .context("failed to read credential from terminal")?;
    if credential.is_empty() {
        anyhow::bail!("admin credential cannot be empty");
    }
    Ok(credential)
}
