use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use pwned_gcs::Reader;
use tracing::info;

use crate::api::{self, AppState};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Pwned Passwords GCS input file
    #[arg(short = 'i', long, env = "GCS_FILE")]
    in_file: PathBuf,

    /// Port to be used by the server
    #[arg(short, long, default_value_t = 3100, env = "PORT")]
    port: u16,
}

pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let reader = Reader::open(&args.in_file)?;
    let state = Arc::new(AppState { reader });
    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server exiting");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("install ctrl-c handler");
    info!("shutting down server");
}
