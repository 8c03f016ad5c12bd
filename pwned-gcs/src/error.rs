#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read or write more than 64 bits at a time (requested {0})")]
    InvalidWidth(u64),

    #[error("bit seek supports only SeekFrom::Start and negative SeekFrom::End offsets")]
    UnsupportedSeek,

    #[error("not a GCS file")]
    NotGcs,

    #[error("file truncated before the footer and index could be read")]
    TruncatedFile,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input is not a valid SHA1 hexadecimal hash")]
    InvalidHex,

    #[error("{num} entries with a 1-in-{probability} false-positive rate overflow the u64 value space")]
    CapacityOverflow { num: u64, probability: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
