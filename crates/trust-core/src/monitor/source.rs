//! Data sources feeding monitors
//!
//! The host's data-access layer is external; these adapters cover the two
//! ways the agent receives tables: a JSON file refreshed by an exporter, or
//! tables pushed through the API.

use super::DataSource;
use crate::table::DataTable;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Reads a JSON-encoded [`DataTable`] from disk on every fetch
#[derive(Debug, Clone)]
pub struct FileTableSource {
    path: PathBuf,
}

impl FileTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataSource for FileTableSource {
    async fn fetch(&self) -> Result<DataTable> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read table file {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse table file {}", self.path.display()))
    }
}

/// Holds the most recent table pushed by the host
#[derive(Debug, Default)]
pub struct PushTableSource {
    latest: RwLock<Option<DataTable>>,
}

impl PushTableSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored table
    pub async fn push(&self, table: DataTable) {
        *self.latest.write().await = Some(table);
    }

    pub async fn has_table(&self) -> bool {
        self.latest.read().await.is_some()
    }
}

#[async_trait]
impl DataSource for PushTableSource {
    async fn fetch(&self) -> Result<DataTable> {
        self.latest
            .read()
            .await
            .clone()
            .context("No table has been pushed by the host yet")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_reads_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"columns":["Margin"],"rows":[[21.0],["22%"],[null]]}}"#
        )
        .unwrap();

        let source = FileTableSource::new(file.path());
        let table = source.fetch().await.unwrap();
        assert_eq!(table.columns, vec!["Margin".to_string()]);
        assert_eq!(table.rows.len(), 3);
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileTableSource::new(dir.path().join("missing.json"));
        let err = source.fetch().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read table file"));
    }

    #[tokio::test]
    async fn test_file_source_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let source = FileTableSource::new(file.path());
        assert!(source.fetch().await.is_err());
    }

    #[tokio::test]
    async fn test_push_source() {
        let source = PushTableSource::new();
        assert!(source.fetch().await.is_err());
        assert!(!source.has_table().await);

        source.push(DataTable::from_values("Margin", &[1.0, 2.0])).await;
        let table = source.fetch().await.unwrap();
        assert_eq!(table.rows.len(), 2);
    }
}
