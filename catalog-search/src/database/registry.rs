//! Backend registry.
//!
//! Maps the scheme of a connection descriptor to the constructor of the
//! database serving it.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

use catalog_search_repository::{ConfigError, ConnectionConfig};

use super::{CatalogDatabase, OpenSearchDatabase};
use crate::CatalogError;

/// Builds a database from a parsed descriptor.
pub type Connector =
    fn(ConnectionConfig) -> BoxFuture<'static, Result<Box<dyn CatalogDatabase>, CatalogError>>;

/// Named database constructors.
#[derive(Default)]
pub struct DatabaseRegistry {
    connectors: BTreeMap<String, Connector>,
}

impl DatabaseRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in backends: `opensearch` and
    /// `elasticsearch`, which share the same JSON APIs.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("opensearch", connect_opensearch);
        registry.register("elasticsearch", connect_opensearch);
        registry
    }

    /// Register `connector` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, connector: Connector) {
        self.connectors.insert(name.into(), connector);
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.connectors.keys().map(String::as_str).collect()
    }

    /// Parse `uri` and connect to the backend its scheme names.
    pub async fn connect(&self, uri: &str) -> Result<Box<dyn CatalogDatabase>, CatalogError> {
        let config = ConnectionConfig::from_uri(uri)?;
        self.connect_with(config).await
    }

    /// Connect using an already parsed descriptor.
    pub async fn connect_with(
        &self,
        config: ConnectionConfig,
    ) -> Result<Box<dyn CatalogDatabase>, CatalogError> {
        let connector = self
            .connectors
            .get(&config.backend)
            .ok_or_else(|| ConfigError::UnknownBackend(config.backend.clone()))?;

        info!(backend = %config.backend, index = %config.index, "Connecting catalog database");
        connector(config).await
    }
}

fn connect_opensearch(
    config: ConnectionConfig,
) -> BoxFuture<'static, Result<Box<dyn CatalogDatabase>, CatalogError>> {
    async move {
        let database = OpenSearchDatabase::connect(&config).await?;
        Ok(Box::new(database) as Box<dyn CatalogDatabase>)
    }
    .boxed()
}

/// The process-wide registry with the built-in backends.
pub fn default_registry() -> &'static DatabaseRegistry {
    static REGISTRY: OnceLock<DatabaseRegistry> = OnceLock::new();
    REGISTRY.get_or_init(DatabaseRegistry::with_defaults)
}
