//! Error types for the catalog search repository.

mod config_error;
mod search_error;

pub use config_error::ConfigError;
pub use search_error::SearchError;
