use std::io::BufRead;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::Args;
use pwned_gcs::{sha1_to_u64, u64_from_sha1_hex, Reader};
use tracing::{error, info};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Pwned Passwords GCS database file
    #[arg(short, long)]
    file: PathBuf,

    /// Read inputs interactively from stdin, one per line
    #[arg(short, long)]
    interactive: bool,

    /// Treat inputs as hex SHA1 hashes instead of plaintext passwords
    #[arg(short = 's', long)]
    hashed: bool,

    /// Password or SHA1 hash to check (required unless --interactive)
    input: Option<String>,
}

pub fn run(args: QueryArgs) -> anyhow::Result<()> {
    let reader = Reader::open(&args.file)?;

    if args.interactive {
        if args.hashed {
            info!("flag 'hashed' is set. Please enter SHA1 hashed passwords.");
        }
        info!("running interactive session. ^D to exit");

        for line in std::io::stdin().lock().lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            match check(&reader, &line, args.hashed) {
                Ok(found) => print_verdict(found),
                Err(e) => error!("error during query: {}", e),
            }
        }
        info!("goodbye");
        Ok(())
    } else {
        let input = args
            .input
            .ok_or_else(|| anyhow!("an input is required unless --interactive is set"))?;
        print_verdict(check(&reader, &input, args.hashed)?);
        Ok(())
    }
}

fn check(reader: &Reader, input: &str, hashed: bool) -> pwned_gcs::Result<bool> {
    let hash = if hashed {
        u64_from_sha1_hex(input.trim())?
    } else {
        sha1_to_u64(input)
    };
    reader.exists(hash)
}

fn print_verdict(found: bool) {
    if found {
        println!("Password is present");
    } else {
        println!("Password is not present");
    }
}
