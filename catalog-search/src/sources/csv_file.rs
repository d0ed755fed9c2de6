//! CSV file source.

use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use csv::ReaderBuilder;
use tokio::sync::mpsc;
use tracing::debug;

use catalog_search_shared::{Row, RowCallback, Source, SourceError};

/// Rows buffered between the blocking reader and the row callback.
const ROW_BUFFER: usize = 1024;

/// Rows read from a headered CSV file.
///
/// Column names become row fields, so the file needs at least `id` and
/// `label` columns. The source is labelled with the file stem unless a label
/// is given. The file is read on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    label: String,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        Self { path, label }
    }

    /// Override the label stored on every document.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn source_error(err: csv::Error) -> SourceError {
    if err.is_io_error() {
        SourceError::io(err.to_string())
    } else {
        SourceError::parse(err.to_string())
    }
}

type RowSender = mpsc::Sender<Result<Row, SourceError>>;

/// Send every record of the file; stops early once the receiver is gone.
fn read_rows(path: &Path, rows: &RowSender) -> Result<(), SourceError> {
    let file = File::open(path).map_err(|e| SourceError::io(format!("{}: {}", path.display(), e)))?;
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers = reader.headers().map_err(source_error)?.clone();

    for record in reader.records() {
        let record = record.map_err(source_error)?;
        let row: Row = headers.iter().zip(record.iter()).collect();
        if rows.blocking_send(Ok(row)).is_err() {
            break;
        }
    }
    Ok(())
}

#[async_trait]
impl Source for CsvSource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn push_rows(&self, callback: &mut dyn RowCallback) -> Result<(), SourceError> {
        let (sender, mut receiver) = mpsc::channel(ROW_BUFFER);
        let path = self.path.clone();
        let reader = tokio::task::spawn_blocking(move || {
            if let Err(e) = read_rows(&path, &sender) {
                let _ = sender.blocking_send(Err(e));
            }
        });

        let mut count = 0u64;
        while let Some(row) = receiver.recv().await {
            callback.on_row(row?).await?;
            count += 1;
        }

        reader
            .await
            .map_err(|e| SourceError::io(format!("CSV reader task failed: {}", e)))?;

        debug!(source = %self.label, rows = count, "Finished reading CSV source");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct Collect(Vec<Row>);

    #[async_trait]
    impl RowCallback for Collect {
        async fn on_row(&mut self, row: Row) -> Result<(), SourceError> {
            self.0.push(row);
            Ok(())
        }
    }

    fn write_csv(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("catalog-search-{}-{}", std::process::id(), name));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_label_from_file_stem() {
        let source = CsvSource::new("/data/lcsh.csv");
        assert_eq!(source.label(), "lcsh");

        let source = source.with_label("subjects");
        assert_eq!(source.label(), "subjects");
    }

    #[tokio::test]
    async fn test_push_rows() {
        let path = write_csv("rows.csv", "id,label,broader\nsh1,Cats,Animals\nsh2,\"Dogs, domestic\",Animals\n");
        let source = CsvSource::new(&path);
        let mut collect = Collect(Vec::new());

        source.push_rows(&mut collect).await.unwrap();

        assert_eq!(collect.0.len(), 2);
        assert_eq!(collect.0[0].id(), Some("sh1"));
        assert_eq!(collect.0[1].label(), "Dogs, domestic");
        assert_eq!(collect.0[1].get("broader"), Some("Animals"));

        std::fs::remove_file(path).ok();
    }

    struct StopAfter(usize);

    #[async_trait]
    impl RowCallback for StopAfter {
        async fn on_row(&mut self, _row: Row) -> Result<(), SourceError> {
            if self.0 == 0 {
                return Err(SourceError::Cancelled);
            }
            self.0 -= 1;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_callback_error_stops_reading() {
        let contents: String = std::iter::once("id,label\n".to_string())
            .chain((0..5000).map(|i| format!("sh{},Label {}\n", i, i)))
            .collect();
        let path = write_csv("large.csv", &contents);
        let source = CsvSource::new(&path);

        let err = source.push_rows(&mut StopAfter(3)).await.unwrap_err();

        assert!(matches!(err, SourceError::Cancelled));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = CsvSource::new("/nonexistent/catalog-search/missing.csv");
        let mut collect = Collect(Vec::new());

        let err = source.push_rows(&mut collect).await.unwrap_err();

        assert!(matches!(err, SourceError::Io(_)));
    }

    #[tokio::test]
    async fn test_ragged_record_is_a_parse_error() {
        let path = write_csv("ragged.csv", "id,label\nsh1,Cats\nsh2\n");
        let source = CsvSource::new(&path);
        let mut collect = Collect(Vec::new());

        let err = source.push_rows(&mut collect).await.unwrap_err();

        assert!(matches!(err, SourceError::Parse(_)));
        assert_eq!(collect.0.len(), 1);

        std::fs::remove_file(path).ok();
    }
}
