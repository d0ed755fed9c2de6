//! Dependency initialization and wiring for the catalog search binary.

use std::env;

use tracing::info;

use catalog_search_repository::ConnectionConfig;

use crate::database::{default_registry, CatalogDatabase};
use crate::CatalogError;

/// Environment variable holding the connection descriptor.
pub const URI_ENV: &str = "CATALOG_SEARCH_URI";

/// Descriptor used when neither the command line nor the environment set one.
pub const DEFAULT_URI: &str = "opensearch://?endpoint=http://localhost:9200&index=subjects";

/// Pick the connection descriptor: explicit value, then `CATALOG_SEARCH_URI`,
/// then [`DEFAULT_URI`].
pub fn resolve_uri(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| env::var(URI_ENV).ok().filter(|uri| !uri.is_empty()))
        .unwrap_or_else(|| DEFAULT_URI.to_string())
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The parsed connection descriptor.
    pub config: ConnectionConfig,
    /// The connected catalog database.
    pub database: Box<dyn CatalogDatabase>,
}

impl Dependencies {
    /// Initialize all dependencies.
    ///
    /// # Environment Variables
    ///
    /// - `CATALOG_SEARCH_URI`: connection descriptor, used when `uri` is `None`
    ///   (default: `opensearch://?endpoint=http://localhost:9200&index=subjects`)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(CatalogError)` - If the descriptor is invalid or the connection fails
    pub async fn new(uri: Option<&str>) -> Result<Self, CatalogError> {
        let uri = resolve_uri(uri);
        let config = ConnectionConfig::from_uri(&uri)?;

        info!(
            backend = %config.backend,
            index = %config.index,
            workers = config.workers,
            query_by = %config.query_by,
            create_index = config.create_index,
            "Initializing dependencies"
        );

        let database = default_registry().connect_with(config.clone()).await?;

        Ok(Self { config, database })
    }
}
