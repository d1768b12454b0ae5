use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceHubError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    ArrowError(String),

    #[error("Link {0} not recognized")]
    MalformedLink(String),

    #[error("Type {0} has multiple items")]
    DuplicateCategory(String),

    #[error("Price unavailable for {gid}: {reason}")]
    PriceUnavailable { gid: u64, reason: String },

    #[error("Table line {row:?} not match header {header:?}")]
    InconsistentTableShape { row: Vec<String>, header: Vec<String> },

    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    #[error("Data error: {0}")]
    DataError(String),
}

pub type Result<T> = std::result::Result<T, PriceHubError>;
