use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use pwned_gcs::{Builder, DEFAULT_INDEX_GRANULARITY, DEFAULT_PROBABILITY};
use tracing::info;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Input hash dump (one hex hash per line)
    #[arg(short, long)]
    file: PathBuf,

    /// Output file path
    #[arg(short, long)]
    out: PathBuf,

    /// False positive rate for queries, 1-in-p
    #[arg(short = 'p', long = "false-positive-rate", default_value_t = DEFAULT_PROBABILITY)]
    probability: u64,

    /// Entries per index point (16 bytes each)
    #[arg(short = 'i', long, default_value_t = DEFAULT_INDEX_GRANULARITY)]
    index_granularity: u64,

    /// Overwrite an existing output file
    #[arg(long)]
    overwrite: bool,
}

pub fn run(args: CreateArgs) -> anyhow::Result<()> {
    if args.probability == 0 {
        bail!("--false-positive-rate must be at least 1");
    }
    if args.out.exists() && !args.overwrite {
        bail!("file {:?} exists and --overwrite is not set", args.out);
    }

    if let Err(e) = build(&args) {
        // Never leave a half-written database behind.
        let _ = std::fs::remove_file(&args.out);
        return Err(e);
    }
    Ok(())
}

fn build(args: &CreateArgs) -> anyhow::Result<()> {
    let input = File::open(&args.file)
        .with_context(|| format!("opening hash dump {:?}", args.file))?;
    let out = File::create(&args.out)
        .with_context(|| format!("creating output file {:?}", args.out))?;

    info!("converting pwned passwords file. This might take a while, be patient :)");

    let mut builder = Builder::new(args.probability, args.index_granularity);
    builder.ingest(input)?;

    info!(
        "read {} entries (about {} MiB in memory)",
        builder.len(),
        builder.len() * 8 / (1024 * 1024)
    );

    let summary = builder.finalize(out)?;
    info!(
        "wrote {} entries ({} unique), {} index points, {} bytes of encoded data",
        summary.entries, summary.unique, summary.index_len, summary.end_of_data
    );
    Ok(())
}
