use campus_intel::error::AppError;
use clap::{Args, Parser, Subcommand};

use crate::analyze::{run_analyze, run_batch, AnalyzeArgs, BatchArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Campus Intelligence Analyst",
    about = "Score university financial distress from filings and real-time signals",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score one institution and print its dossier or profile JSON
    Analyze(AnalyzeArgs),
    /// Score a cohort CSV sequentially and print the status report
    Batch(BatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analyze(args),
        Command::Batch(args) => run_batch(args),
    }
}
