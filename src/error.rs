use crate::package::index::TGI;
use thiserror::Error;

/// Main error type for sc4pi operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    BinRw(#[from] binrw::Error),

    #[error("invalid DBPF header: {0}")]
    InvalidHeader(String),

    #[error("unsupported compression format")]
    UnsupportedCompressionFormat,

    #[error("truncated input: {0}")]
    TruncatedInput(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("entry not found: {0}")]
    NotFound(TGI),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("logic error: {0}")]
    Logic(String),
}

/// Result type alias for sc4pi operations
pub type Result<T> = std::result::Result<T, Error>;
