//! # Catalog Search Shared
//!
//! Types shared by every catalog search crate: rows and documents, the
//! generic query result and pagination contract, and the collaborator traits
//! (sources, progress monitors) the ingestion pipeline consumes.

pub mod cancel;
pub mod document;
pub mod errors;
pub mod monitor;
pub mod pagination;
pub mod source;

pub use cancel::Cancellation;
pub use document::{Document, QueryResult, Row};
pub use errors::{PaginationError, SourceError};
pub use monitor::{NoopMonitor, ProgressMonitor};
pub use pagination::{PageRequest, Pagination, QueryPage};
pub use source::{RowCallback, Source, VecSource};
