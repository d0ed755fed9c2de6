//! OpenSearch backend implementation.
//!
//! This module provides the concrete implementation of `SearchBackend`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::response::Response,
    http::StatusCode,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::IndicesCreateParts,
    BulkParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use catalog_search_shared::Cancellation;

use crate::config::ConnectionConfig;
use crate::errors::SearchError;
use crate::interfaces::SearchBackend;
use crate::opensearch::index_config::get_index_settings;
use crate::opensearch::response::{decode_bulk, decode_search};
use crate::retry::RetryPolicy;
use crate::types::{BulkOperation, BulkResponse, SearchHits, SearchRequest};

const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// OpenSearch backend bound to a single index.
///
/// # Example
///
/// ```ignore
/// use catalog_search_repository::opensearch::OpenSearchBackend;
/// use catalog_search_repository::types::BulkOperation;
///
/// let backend = OpenSearchBackend::new("http://localhost:9200", "subjects").await?;
/// backend.create_index().await?;
///
/// let ops = vec![BulkOperation::index("sh85021262", json!({ "id": "sh85021262", "label": "Cats" }))];
/// let response = backend.bulk(&ops, &Cancellation::new()).await?;
/// ```
pub struct OpenSearchBackend {
    client: OpenSearch,
    index: String,
    retry: RetryPolicy,
    debug: bool,
}

impl OpenSearchBackend {
    /// Create a new backend connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index` - The index every request targets
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchBackend)` - A new backend with the default retry policy
    /// * `Err(SearchError)` - If the URL or the transport is invalid
    pub async fn new(url: &str, index: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;
        Self::connect(parsed_url, index)
    }

    /// Create a backend from a parsed connection descriptor.
    pub async fn from_config(config: &ConnectionConfig) -> Result<Self, SearchError> {
        let endpoint = config
            .require_endpoint()
            .map_err(|e| SearchError::invalid_config(e.to_string()))?;
        let index = config
            .require_index()
            .map_err(|e| SearchError::invalid_config(e.to_string()))?;

        Ok(Self::connect(endpoint.clone(), index)?.with_debug(config.debug))
    }

    fn connect(url: Url, index: &str) -> Result<Self, SearchError> {
        if index.is_empty() {
            return Err(SearchError::invalid_config("index name must not be empty"));
        }

        let conn_pool = SingleNodeConnectionPool::new(url.clone());
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, index = %index, "Created OpenSearch backend");

        Ok(Self {
            client,
            index: index.to_string(),
            retry: RetryPolicy::default(),
            debug: false,
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Log request and response bodies.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn status_of(response: &Response) -> u16 {
        response.status_code().as_u16()
    }

    async fn read_body(&self, operation: &str, response: Response) -> Result<(u16, String), SearchError> {
        let status = response.status_code().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        if self.debug {
            debug!(operation = %operation, status, body = %body, "Response body");
        }

        Ok((status, body))
    }

    /// NDJSON rendering of a bulk request for debug logging.
    fn bulk_log(operations: &[BulkOperation]) -> String {
        let mut lines = String::new();
        for op in operations {
            lines.push_str(&json!({ "index": { "_id": op.document_id } }).to_string());
            lines.push('\n');
            lines.push_str(&op.source.to_string());
            lines.push('\n');
        }
        lines
    }

    fn bulk_body(operations: &[BulkOperation]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(operations.len() * 2);
        for op in operations {
            body.push(json!({ "index": { "_id": op.document_id } }).into());
            body.push(op.source.clone().into());
        }
        body
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Status code with its canonical reason, e.g. `503 Service Unavailable`.
fn status_text(status: u16) -> String {
    StatusCode::from_u16(status)
        .map(|code| code.to_string())
        .unwrap_or_else(|_| status.to_string())
}

#[async_trait]
impl SearchBackend for OpenSearchBackend {
    fn index_name(&self) -> &str {
        &self.index
    }

    /// Create the index with the catalog mappings.
    ///
    /// An `resource_already_exists_exception` answer counts as success, so
    /// repeated runs against the same index are fine.
    #[instrument(skip(self), fields(index = %self.index))]
    async fn create_index(&self) -> Result<(), SearchError> {
        let client = &self.client;
        let index = self.index.as_str();
        let settings = get_index_settings();

        if self.debug {
            debug!(body = %settings, "Create index request");
        }

        let retried = self
            .retry
            .run(
                "create_index",
                None,
                move || {
                    let settings = settings.clone();
                    async move {
                        client
                            .indices()
                            .create(IndicesCreateParts::Index(index))
                            .body(settings)
                            .send()
                            .await
                    }
                },
                Self::status_of,
            )
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let (status, body) = self.read_body("create_index", retried.response).await?;

        if is_success(status) {
            info!(index = %index, "Created index");
            return Ok(());
        }

        if body.contains(ALREADY_EXISTS) {
            info!(index = %index, "Index already exists");
            return Ok(());
        }

        error!(status, body = %body, "Create index request failed");
        Err(SearchError::index_creation(format!(
            "Request failed with response: {}",
            status_text(status)
        )))
    }

    #[instrument(skip(self, operations, cancel), fields(index = %self.index, count = operations.len()))]
    async fn bulk(
        &self,
        operations: &[BulkOperation],
        cancel: &Cancellation,
    ) -> Result<BulkResponse, SearchError> {
        if operations.is_empty() {
            return Ok(BulkResponse::default());
        }

        let client = &self.client;
        let index = self.index.as_str();

        if self.debug {
            debug!(body = %Self::bulk_log(operations), "Bulk request");
        }

        let retried = self
            .retry
            .run(
                "bulk",
                Some(cancel),
                move || {
                    let body = Self::bulk_body(operations);
                    async move {
                        client
                            .bulk(BulkParts::Index(index))
                            .body(body)
                            .send()
                            .await
                    }
                },
                Self::status_of,
            )
            .await
            .map_err(|e| SearchError::bulk_index(e.to_string()))?;

        let retries = retried.retries;
        let (status, body) = self.read_body("bulk", retried.response).await?;

        if !is_success(status) {
            error!(status, retries, "Bulk request failed");
            return Err(SearchError::bulk_index(format!(
                "Request failed with response: {}",
                status_text(status)
            )));
        }

        let items = decode_bulk(&body, operations.len())?;
        let response = BulkResponse { items, retries };

        debug!(
            succeeded = response.succeeded(),
            failed = response.failed(),
            retries,
            "Bulk request completed"
        );

        Ok(response)
    }

    #[instrument(skip(self, request), fields(index = %self.index, size = request.size, from = ?request.from))]
    async fn search(&self, request: &SearchRequest) -> Result<SearchHits, SearchError> {
        let client = &self.client;
        let index = self.index.as_str();
        let size = request.size as i64;
        let from = request.from.map(|from| from as i64);
        let query = request.body.clone();

        if self.debug {
            debug!(body = %query, "Search request");
        }

        let retried = self
            .retry
            .run(
                "search",
                None,
                move || {
                    let query = query.clone();
                    async move {
                        let indices = [index];
                        let search = client
                            .search(SearchParts::Index(&indices))
                            .size(size)
                            .body(query);
                        let search = match from {
                            Some(from) => search.from(from),
                            None => search,
                        };
                        search.send().await
                    }
                },
                Self::status_of,
            )
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let (status, body) = self.read_body("search", retried.response).await?;

        if !is_success(status) {
            error!(status, "Search request failed");
            return Err(SearchError::response_status(status_text(status)));
        }

        decode_search(&body)
    }
}
