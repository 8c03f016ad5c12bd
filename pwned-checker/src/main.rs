//! Check passwords against the Pwned Passwords dumps.
//!
//! `download` fetches the haveibeenpwned SHA-1 hashes into a text dump,
//! `create` compresses the dump into a Golomb-Coded Set file, `query`
//! checks single inputs from the command line, and `serve` exposes the
//! query API over HTTP.

mod api;
mod create;
mod download;
mod query;
mod serve;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pwned-checker")]
#[command(version)]
#[command(about = "Check a password against the Pwned Passwords dumps")]
#[command(
    long_about = "Create and check passwords against the Pwned Passwords \
                  (haveibeenpwned.com) password dumps, compressed into a GCS \
                  (Golomb-Coded Set) file."
)]
struct Cli {
    /// Print more information on the processing
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the haveibeenpwned hashes (SHA1) to a file
    Download(download::DownloadArgs),
    /// Create a Pwned Passwords GCS database from a hash dump
    Create(create::CreateArgs),
    /// Query a Pwned Passwords GCS database
    Query(query::QueryArgs),
    /// Serve the API for querying a Pwned Passwords GCS database
    Serve(serve::ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Download(args) => download::run(args).await,
        Command::Create(args) => create::run(args),
        Command::Query(args) => query::run(args),
        Command::Serve(args) => serve::run(args).await,
    }
}

fn init_tracing(verbose: bool) {
    let debug_env = std::env::var("DEBUG").is_ok_and(|v| !v.is_empty() && v != "0");
    let default = if verbose || debug_env { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}
