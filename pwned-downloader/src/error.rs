use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed for range {prefix}: {source}")]
    HttpRequest {
        prefix: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for range {prefix}")]
    HttpStatus { prefix: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File '{path}' exists. Use --overwrite to replace it.")]
    FileExists { path: PathBuf },

    #[error("Download failed after {retries} retries for range {prefix}")]
    MaxRetriesExceeded { prefix: String, retries: u32 },
}
