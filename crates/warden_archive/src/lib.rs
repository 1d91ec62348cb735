//! redb-backed implementation of `warden_pipeline::Archive`: a single
//! `reports` table keyed by `scan_id`, CBOR-encoded values. Durability is
//! this crate's job; the core never retries a failed `save`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};

use warden_core::{WardenError, WardenResult};
use warden_pipeline::{Archive, ScanReport};

const REPORTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("reports");

fn archive_io_err(msg: impl Into<String>) -> WardenError {
    WardenError::ArchiveWrite(io::Error::new(io::ErrorKind::Other, msg.into()))
}

pub struct RedbArchive {
    db: Arc<Database>,
}

impl RedbArchive {
    /// Opens (creating if needed) the redb file at `path` and ensures the
    /// `reports` table exists.
    pub fn open(path: PathBuf) -> WardenResult<Self> {
        tracing::info!(?path, "opening report archive");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| archive_io_err(format!("failed to create archive directory: {e}")))?;
        }

        let db = Database::create(&path)
            .map_err(|e| archive_io_err(format!("failed to open archive database: {e}")))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| archive_io_err(format!("failed to begin write transaction: {e}")))?;
        {
            let _ = write_txn
                .open_table(REPORTS_TABLE)
                .map_err(|e| archive_io_err(format!("failed to open reports table: {e}")))?;
        }
        write_txn
            .commit()
            .map_err(|e| archive_io_err(format!("failed to commit table creation: {e}")))?;

        Ok(RedbArchive { db: Arc::new(db) })
    }

    fn save_blocking(db: &Database, scan_id: &str, report: &ScanReport) -> WardenResult<()> {
        let write_txn = db
            .begin_write()
            .map_err(|e| archive_io_err(format!("failed to begin write transaction: {e}")))?;
        {
            let mut table = write_txn
                .open_table(REPORTS_TABLE)
                .map_err(|e| archive_io_err(format!("failed to open reports table: {e}")))?;

            let data = serde_cbor::to_vec(report)
                .map_err(|e| archive_io_err(format!("failed to serialize report: {e}")))?;

            table
                .insert(scan_id, data.as_slice())
                .map_err(|e| archive_io_err(format!("failed to insert report: {e}")))?;
        }
        write_txn
            .commit()
            .map_err(|e| archive_io_err(format!("failed to commit report: {e}")))?;

        tracing::debug!(scan_id, "archived scan report");
        Ok(())
    }

    fn get_blocking(db: &Database, scan_id: &str) -> WardenResult<Option<ScanReport>> {
        let read_txn = db
            .begin_read()
            .map_err(|e| archive_io_err(format!("failed to begin read transaction: {e}")))?;
        let table = read_txn
            .open_table(REPORTS_TABLE)
            .map_err(|e| archive_io_err(format!("failed to open reports table: {e}")))?;

        match table
            .get(scan_id)
            .map_err(|e| archive_io_err(format!("failed to read report: {e}")))?
        {
            Some(value) => {
                let report: ScanReport = serde_cbor::from_slice(value.value())
                    .map_err(|e| archive_io_err(format!("failed to deserialize report: {e}")))?;
                Ok(Some(report))
            }
            None => Ok(None),
        }
    }

    /// Fetches a previously-saved report, used by post-scan tooling outside
    /// the enrichment pipeline proper (the pipeline itself only ever writes).
    pub async fn get_report(&self, scan_id: &str) -> WardenResult<Option<ScanReport>> {
        let db = self.db.clone();
        let scan_id = scan_id.to_string();
        tokio::task::spawn_blocking(move || Self::get_blocking(&db, &scan_id))
            .await
            .map_err(|e| archive_io_err(format!("archive task panicked: {e}")))?
    }
}

#[async_trait]
impl Archive for RedbArchive {
    async fn save(&self, scan_id: &str, report: &ScanReport) -> WardenResult<()> {
        let db = self.db.clone();
        let scan_id = scan_id.to_string();
        let report = report.clone();
        tokio::task::spawn_blocking(move || Self::save_blocking(&db, &scan_id, &report))
            .await
            .map_err(|e| archive_io_err(format!("archive task panicked: {e}")))?
    }
}
