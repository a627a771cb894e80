//! Bulk load of producer output.
//!
//! Front ends emit one JSON [`SymbolInput`] per line. A load runs in a single
//! immediate transaction: the first time a `(dir, filename)` pair is seen its
//! old rows are deleted, then every record goes through the prepared insert.
//! Any bad record rolls the whole load back.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use serde_jsonlines::JsonLinesReader;
use symq_core::entities::SymbolInput;

use crate::SymbolDb;
use crate::error::DatabaseError;

/// Outcome of one load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Distinct files touched.
    pub files: usize,
    /// Records inserted.
    pub records: u64,
    /// Stale rows removed before reinsertion.
    pub deleted: u64,
}

impl SymbolDb {
    /// Load a JSON-lines file of producer records.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Io` if the file cannot be opened, and any
    /// error from [`SymbolDb::ingest_reader`].
    pub async fn ingest_jsonl(&self, path: &Path) -> Result<IngestStats, DatabaseError> {
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "loading symbol records");
        self.ingest_reader(BufReader::new(file)).await
    }

    /// Load producer records from any buffered reader (e.g. stdin).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Input` with the 1-based record number for
    /// unparsable or invalid records, and `DatabaseError::Insert` for engine
    /// rejections. The transaction is rolled back in both cases.
    pub async fn ingest_reader<R: BufRead>(&self, reader: R) -> Result<IngestStats, DatabaseError> {
        self.begin().await?;
        match self.ingest_records(reader).await {
            Ok(stats) => {
                self.commit().await?;
                tracing::info!(
                    files = stats.files,
                    records = stats.records,
                    deleted = stats.deleted,
                    "load committed"
                );
                Ok(stats)
            }
            Err(error) => {
                if let Err(rollback) = self.rollback().await {
                    tracing::warn!(%rollback, "rollback after failed load");
                }
                Err(error)
            }
        }
    }

    async fn ingest_records<R: BufRead>(&self, reader: R) -> Result<IngestStats, DatabaseError> {
        let mut writer = self.writer().await?;
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut stats = IngestStats::default();

        for (idx, item) in JsonLinesReader::new(reader)
            .read_all::<SymbolInput>()
            .enumerate()
        {
            let line = idx + 1;
            let input = item.map_err(|e| DatabaseError::Input {
                line,
                message: e.to_string(),
            })?;
            input.validate().map_err(|e| DatabaseError::Input {
                line,
                message: e.to_string(),
            })?;

            let key = (input.normalized_dir(), input.filename.clone());
            if !seen.contains(&key) {
                stats.deleted += self.delete_file(&key.0, &key.1).await?;
                seen.insert(key);
            }
            writer.insert(&input).await?;
        }

        stats.files = seen.len();
        stats.records = writer.inserted();
        Ok(stats)
    }
}
