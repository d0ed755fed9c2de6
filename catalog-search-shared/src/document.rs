//! Rows, indexable documents and query results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name of the row field holding the unique identifier.
pub const ID_FIELD: &str = "id";

/// Name of the row field holding the human readable label.
pub const LABEL_FIELD: &str = "label";

/// One record produced by a source: field name to string value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(HashMap<String, String>);

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// The row identifier, if present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.get(ID_FIELD).filter(|id| !id.is_empty())
    }

    /// The row label, empty when missing.
    pub fn label(&self) -> &str {
        self.get(LABEL_FIELD).unwrap_or_default()
    }
}

impl From<HashMap<String, String>> for Row {
    fn from(fields: HashMap<String, String>) -> Self {
        Self(fields)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The unit written to the search index.
///
/// `id` doubles as the backend document key, so indexing the same id twice
/// replaces the earlier document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub label: String,
    /// Label of the source the row came from.
    pub source: String,
}

impl Document {
    /// Create a new document.
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            source: source.into(),
        }
    }

    /// Build a document from a row produced by the source labelled `source`.
    ///
    /// Returns `None` when the row has no identifier: without one the backend
    /// would mint a random key and re-ingestion would duplicate the row.
    pub fn from_row(row: &Row, source: &str) -> Option<Self> {
        let id = row.id()?;
        Some(Self::new(id, row.label(), source))
    }
}

/// A generic search hit handed back to query callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub source: String,
}

impl From<Document> for QueryResult {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            label: doc.label,
            source: doc.source,
        }
    }
}
