pub mod config;
pub mod error;

pub use config::{TlsConfig, TrustPolicy};
pub use error::{Result, TlsError};
