use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::debug;

use crate::conversion::prefix_to_hex;
use crate::error::Error;

/// Maximum retries per range download
pub const MAX_RETRIES: u32 = 10;

/// Base delay for exponential backoff (doubles each retry)
pub const RETRY_BASE_DELAY_MS: u64 = 100;

/// One downloaded range: the prefix index and the raw response body
/// (suffix lines as served by the API).
pub struct RangeBody {
    pub prefix: u32,
    pub body: String,
}

/// Download a single range, retrying transient failures with exponential
/// backoff.
pub async fn download_range(client: &reqwest::Client, prefix: u32) -> Result<String, Error> {
    let prefix_hex = prefix_to_hex(prefix);
    let prefix_str = std::str::from_utf8(&prefix_hex).expect("hex prefix is ASCII");
    let url = format!("https://api.pwnedpasswords.com/range/{}", prefix_str);

    let mut last_error = None;
    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            let delay = RETRY_BASE_DELAY_MS * (1 << attempt.min(10));
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        match client.get(&url).send().await {
            Ok(response) => {
                if !response.status().is_success() {
                    last_error = Some(Error::HttpStatus {
                        prefix: prefix_str.to_string(),
                        status: response.status().as_u16(),
                    });
                    continue;
                }

                match response.text().await {
                    Ok(body) => return Ok(body),
                    Err(e) => {
                        last_error =
                            Some(Error::HttpRequest { prefix: prefix_str.to_string(), source: e });
                        continue;
                    }
                }
            }
            Err(e) => {
                last_error = Some(Error::HttpRequest { prefix: prefix_str.to_string(), source: e });
                continue;
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::MaxRetriesExceeded {
        prefix: prefix_str.to_string(),
        retries: MAX_RETRIES,
    }))
}

/// Worker task that downloads a set of ranges and forwards the bodies to
/// the dump writer.
pub async fn worker(
    client: reqwest::Client,
    prefixes: Vec<u32>,
    tx: mpsc::Sender<RangeBody>,
    progress: Arc<AtomicU64>,
) -> Result<(), Error> {
    for prefix in prefixes {
        let body = download_range(&client, prefix).await?;
        if !forward(RangeBody { prefix, body }, &tx, progress.as_ref()).await {
            // Writer is gone; its error will surface from its own task.
            debug!("dump writer closed, stopping worker");
            break;
        }
    }

    Ok(())
}

/// Hands a downloaded range to the dump writer. Returns `false` when the
/// writer is gone; progress only advances for ranges the writer accepted.
async fn forward(range: RangeBody, tx: &mpsc::Sender<RangeBody>, progress: &AtomicU64) -> bool {
    if tx.send(range).await.is_err() {
        return false;
    }
    progress.fetch_add(1, Ordering::Relaxed);
    true
}

/// Single consumer that turns downloaded ranges into dump lines.
///
/// Each suffix line becomes `PREFIX` + suffix + `\n`, so the file carries
/// complete 40-character hashes. Being the only writer, it can never
/// interleave partial lines. Returns the number of hashes written.
pub async fn write_dump(
    mut rx: mpsc::Receiver<RangeBody>,
    out: tokio::fs::File,
) -> Result<u64, Error> {
    let mut writer = tokio::io::BufWriter::new(out);
    let mut hashes = 0u64;

    while let Some(range) = rx.recv().await {
        let prefix_hex = prefix_to_hex(range.prefix);
        let prefix_str = std::str::from_utf8(&prefix_hex).expect("hex prefix is ASCII");

        let mut chunk = String::with_capacity(range.body.len() + 8 * 1024);
        for line in range.body.lines() {
            if line.is_empty() {
                continue;
            }
            chunk.push_str(prefix_str);
            chunk.push_str(line);
            chunk.push('\n');
            hashes += 1;
        }

        writer.write_all(chunk.as_bytes()).await?;
    }

    writer.flush().await?;
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn test_write_dump_reassembles_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.txt");
        let out = tokio::fs::File::create(&path).await.unwrap();

        let (tx, rx) = mpsc::channel(4);
        let writer = tokio::spawn(write_dump(rx, out));

        tx.send(RangeBody {
            prefix: 0x5BAA6,
            body: "1E4C9B93F3F0682250B6CF8331B7EE68FD8:3\r\n".to_string(),
        })
        .await
        .unwrap();
        tx.send(RangeBody {
            prefix: 0xCBFDA,
            body: "C6008F9CAB4083784CBD1874F76618D2A97:2254650\r\n\r\n".to_string(),
        })
        .await
        .unwrap();
        drop(tx);

        let hashes = writer.await.unwrap().unwrap();
        assert_eq!(hashes, 2);

        let mut contents = String::new();
        tokio::fs::File::open(&path)
            .await
            .unwrap()
            .read_to_string(&mut contents)
            .await
            .unwrap();
        assert_eq!(
            contents,
            "5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8:3\n\
             CBFDAC6008F9CAB4083784CBD1874F76618D2A97:2254650\n"
        );
    }

    #[tokio::test]
    async fn test_forward_advances_progress() {
        let (tx, mut rx) = mpsc::channel(1);
        let progress = AtomicU64::new(0);

        let accepted = forward(
            RangeBody { prefix: 0x5BAA6, body: "1E4C9B93F3F:1\r\n".to_string() },
            &tx,
            &progress,
        )
        .await;

        assert!(accepted);
        assert_eq!(progress.load(Ordering::Relaxed), 1);
        assert_eq!(rx.recv().await.unwrap().prefix, 0x5BAA6);
    }

    #[tokio::test]
    async fn test_forward_stops_on_closed_writer() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let progress = AtomicU64::new(0);

        let accepted = forward(
            RangeBody { prefix: 0, body: String::new() },
            &tx,
            &progress,
        )
        .await;

        assert!(!accepted);
        assert_eq!(progress.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_worker_empty_prefixes_is_noop() {
        // No prefixes: nothing downloaded, no progress, no error, and the
        // closed channel is never touched.
        let client = reqwest::Client::new();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let progress = Arc::new(AtomicU64::new(0));

        let result = worker(client, Vec::new(), tx, Arc::clone(&progress)).await;
        assert!(result.is_ok());
        assert_eq!(progress.load(Ordering::Relaxed), 0);
    }
}
