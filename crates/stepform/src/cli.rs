use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use crate::cmd::{
    self, Globals, check::CheckArgs, fill::FillArgs, forms::FormsCommand, schema::SchemaArgs,
    steps::StepsCommand,
};
use crate::logging;

#[derive(Parser, Debug)]
#[command(
    name = "stepform",
    about = "Author, check and fill multi-step forms",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Base URL of the form API; overrides config and STEPFORM_API_URL
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Raise log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage form metadata
    #[command(subcommand)]
    Forms(FormsCommand),
    /// Manage the steps of a form
    #[command(subcommand)]
    Steps(StepsCommand),
    /// Validate a step document locally, without contacting the API
    Check(CheckArgs),
    /// Fill out a form and print the collected values
    Fill(FillArgs),
    /// Print the JSON Schema of a step document
    Schema(SchemaArgs),
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let globals = Globals {
        config: cli.config,
        api_url: cli.api_url,
        json: cli.json,
    };
    match cli.command {
        Commands::Check(args) => cmd::check::run(args, &globals),
        Commands::Schema(args) => cmd::schema::run(args),
        Commands::Forms(command) => runtime()?.block_on(cmd::forms::run(command, &globals)),
        Commands::Steps(command) => runtime()?.block_on(cmd::steps::run(command, &globals)),
        Commands::Fill(args) => runtime()?.block_on(cmd::fill::run(args, &globals)),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}
