use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use pwned_downloader::{worker, write_dump, Error, TOTAL_PREFIXES};
use tokio::sync::mpsc;
use tracing::info;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Output file path for the hash dump
    #[arg(short, long, default_value = "./pwned-sha1.txt")]
    out_file: PathBuf,

    /// Number of concurrent download workers (0 = eight per CPU)
    #[arg(short = 't', long, default_value_t = 0)]
    threads: usize,

    /// Overwrite an existing output file
    #[arg(long)]
    overwrite: bool,

    /// Maximum range index to download (default: all 1,048,575)
    #[arg(long, default_value_t = TOTAL_PREFIXES - 1)]
    limit: u32,

    /// Disable progress bar
    #[arg(long)]
    no_progress: bool,
}

pub async fn run(args: DownloadArgs) -> anyhow::Result<()> {
    if args.out_file.exists() && !args.overwrite {
        return Err(Error::FileExists { path: args.out_file }.into());
    }
    let out = tokio::fs::File::create(&args.out_file).await?;

    // About eight workers per core sustains the API without tripping its
    // rate limiting.
    let workers = if args.threads > 0 {
        args.threads
    } else {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(8) * 8
    };

    let prefixes: Vec<u32> = (0..=args.limit).collect();
    let total = prefixes.len() as u64;

    info!(
        "downloading {} ranges to {:?} using {} concurrent workers",
        total, args.out_file, workers
    );

    let progress_counter = Arc::new(AtomicU64::new(0));
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(workers)
        .build()
        .expect("Failed to create HTTP client");

    // Divide ranges among workers
    let chunk_size = prefixes.len().div_ceil(workers);
    let chunks: Vec<Vec<u32>> = prefixes.chunks(chunk_size).map(|c| c.to_vec()).collect();

    // Set up progress bar
    let progress_bar = if !args.no_progress {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Spawn progress updater task
    let progress_counter_clone = Arc::clone(&progress_counter);
    let progress_bar_clone = progress_bar.clone();
    let progress_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let current = progress_counter_clone.load(Ordering::Relaxed);
            if let Some(ref pb) = progress_bar_clone {
                pb.set_position(current);
            }
            if current >= total {
                break;
            }
        }
    });

    // Single writer keeps dump lines whole regardless of worker order.
    let (tx, rx) = mpsc::channel(workers * 2);
    let writer = tokio::spawn(write_dump(rx, out));

    // Spawn worker tasks
    let mut handles = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let client = client.clone();
        let tx = tx.clone();
        let progress = Arc::clone(&progress_counter);
        handles.push(tokio::spawn(
            async move { worker(client, chunk, tx, progress).await },
        ));
    }
    drop(tx);

    // Wait for all workers to complete
    let mut first_error: Option<Error> = None;
    for handle in handles {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(Error::Io(std::io::Error::other(format!(
                        "Task panicked: {}",
                        e
                    ))));
                }
            }
        }
    }

    // The writer finishes once every sender is gone.
    let written = match writer.await {
        Ok(Ok(hashes)) => Some(hashes),
        Ok(Err(e)) => {
            if first_error.is_none() {
                first_error = Some(e);
            }
            None
        }
        Err(e) => {
            if first_error.is_none() {
                first_error =
                    Some(Error::Io(std::io::Error::other(format!("Task panicked: {}", e))));
            }
            None
        }
    };

    // Clean up progress
    progress_task.abort();
    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    if let Some(e) = first_error {
        return Err(e.into());
    }

    info!("download complete: {} hashes", written.unwrap_or(0));
    Ok(())
}
