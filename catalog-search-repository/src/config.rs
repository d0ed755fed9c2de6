//! Connection descriptor parsing.
//!
//! A descriptor is a URI whose scheme names the backend and whose query
//! parameters carry the options:
//!
//! ```text
//! opensearch://?endpoint=http://localhost:9200&index=subjects&workers=10&query-by=label
//! ```

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::errors::ConfigError;

/// Default number of concurrent bulk writers.
pub const DEFAULT_WORKERS: usize = 10;

/// Which field free-text queries are matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QueryBy {
    /// Phrase match against the analyzed full-text field.
    Text,
    /// Phrase match against the untokenized label.
    #[default]
    Label,
}

impl QueryBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryBy::Text => "text",
            QueryBy::Label => "label",
        }
    }
}

impl fmt::Display for QueryBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryBy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(QueryBy::Text),
            "label" => Ok(QueryBy::Label),
            other => Err(ConfigError::invalid_option(
                "query-by",
                other,
                "expected one of: text, label",
            )),
        }
    }
}

/// Options parsed from a connection descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Backend name taken from the URI scheme.
    pub backend: String,
    /// Backend base URL.
    pub endpoint: Option<Url>,
    /// Target index name.
    pub index: String,
    /// Number of concurrent bulk writers.
    pub workers: usize,
    /// Log request and response bodies.
    pub debug: bool,
    pub query_by: QueryBy,
    /// Create the index before the handle is returned.
    pub create_index: bool,
}

impl ConnectionConfig {
    /// Parse a connection descriptor.
    pub fn from_uri(uri: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(uri).map_err(|e| ConfigError::InvalidDescriptor(e.to_string()))?;

        let mut config = Self {
            backend: url.scheme().to_string(),
            endpoint: None,
            index: String::new(),
            workers: DEFAULT_WORKERS,
            debug: false,
            query_by: QueryBy::default(),
            create_index: false,
        };

        for (key, value) in url.query_pairs() {
            // Empty values keep the default, unknown keys are ignored.
            if value.is_empty() {
                continue;
            }

            match key.as_ref() {
                "endpoint" => {
                    let endpoint = Url::parse(&value).map_err(|e| {
                        ConfigError::invalid_option("endpoint", value.as_ref(), e.to_string())
                    })?;
                    config.endpoint = Some(endpoint);
                }
                "index" => config.index = value.into_owned(),
                "workers" => config.workers = parse_workers(&value)?,
                "debug" => config.debug = parse_bool("debug", &value)?,
                "query-by" => config.query_by = value.parse()?,
                "create-index" => config.create_index = parse_bool("create-index", &value)?,
                _ => {}
            }
        }

        Ok(config)
    }

    /// The endpoint, required by every real backend.
    pub fn require_endpoint(&self) -> Result<&Url, ConfigError> {
        self.endpoint
            .as_ref()
            .ok_or(ConfigError::MissingOption("endpoint"))
    }

    /// The index name, required by every real backend.
    pub fn require_index(&self) -> Result<&str, ConfigError> {
        if self.index.is_empty() {
            return Err(ConfigError::MissingOption("index"));
        }
        Ok(&self.index)
    }
}

impl FromStr for ConnectionConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}

fn parse_workers(value: &str) -> Result<usize, ConfigError> {
    let workers: usize = value
        .parse()
        .map_err(|e: std::num::ParseIntError| {
            ConfigError::invalid_option("workers", value, e.to_string())
        })?;

    if workers == 0 {
        return Err(ConfigError::invalid_option(
            "workers",
            value,
            "must be a positive integer",
        ));
    }

    Ok(workers)
}

/// Accepts the usual spellings: 1, t, true, 0, f, false in any common case.
fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(ConfigError::invalid_option(name, other, "expected a boolean")),
    }
}
