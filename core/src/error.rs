use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A tokenizer was handed a null or missing value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No usable id could be derived from a document.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
