use thiserror::Error;

/// Failure talking to the property store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid store URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Malformed store response: {0}")]
    Decode(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),
}

/// Failure talking to object storage
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Invalid credentials: {0}")]
    Credentials(String),
}

/// Errors surfaced by the search engine
#[derive(Error, Debug)]
pub enum SearchError {
    /// The store could not answer the query. Not retried.
    #[error("Property store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SearchError>;
