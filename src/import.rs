//! Importer
//!
//! Replays a snapshot file into the store as single-key writes.
//!
//! Writes are issued one at a time in snapshot (key) order. The first
//! failure stops the replay; keys written before it stay written.

use std::path::Path;

use crate::cancel::CancelToken;
use crate::error::{KvportError, Result};
use crate::snapshot::Snapshot;
use crate::store::StoreClient;

/// A key written during import and the revision the store assigned it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenKey {
    pub key: String,
    pub revision: u64,
}

/// Outcome of a successful import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Every written key, in write order
    pub written: Vec<WrittenKey>,
}

impl ImportSummary {
    pub fn count(&self) -> usize {
        self.written.len()
    }

    /// Revision of the last write, if any
    pub fn last_revision(&self) -> Option<u64> {
        self.written.last().map(|w| w.revision)
    }
}

/// Loads snapshots and writes them back to a store
#[derive(Debug, Clone, Default)]
pub struct Importer {
    cancel: CancelToken,
}

impl Importer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop between writes once `token` is cancelled
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Import the snapshot file at `source`
    ///
    /// A missing or malformed file fails before any write is issued.
    pub fn import<S: StoreClient + ?Sized>(&self, store: &S, source: &Path) -> Result<ImportSummary> {
        let snapshot = Snapshot::load(source)?;
        tracing::info!("Importing {} keys from {}", snapshot.len(), source.display());

        let summary = self.replay(store, &snapshot)?;
        tracing::info!(
            "Imported {} keys, last revision {}",
            summary.count(),
            summary.last_revision().unwrap_or(0)
        );
        Ok(summary)
    }

    /// Write every record of `snapshot`, stopping at the first failure
    pub fn replay<S: StoreClient + ?Sized>(&self, store: &S, snapshot: &Snapshot) -> Result<ImportSummary> {
        let mut summary = ImportSummary {
            written: Vec::with_capacity(snapshot.len()),
        };

        for (key, value) in snapshot {
            if self.cancel.is_cancelled() {
                return Err(KvportError::Cancelled {
                    written: summary.count(),
                });
            }

            match store.put(key.as_bytes(), value.as_bytes()) {
                Ok(result) => {
                    tracing::info!("Wrote {} at revision {}", key, result.revision);
                    summary.written.push(WrittenKey {
                        key: key.clone(),
                        revision: result.revision,
                    });
                }
                Err(e) => {
                    tracing::error!("Write failed for {}: {}", key, e);
                    return Err(KvportError::Write {
                        key: key.clone(),
                        written: summary.count(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(summary)
    }
}
