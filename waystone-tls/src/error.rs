use thiserror::Error;

pub type Result<T> = std::result::Result<T, TlsError>;

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client build error: {0}")]
    Build(#[from] reqwest::Error),
}
