//! Exporter
//!
//! Reads every record under a prefix and writes it to a snapshot file.
//!
//! ## Pagination
//! One logical read is split into pages by [`Pages`], a small state machine:
//!
//! ```text
//!   More { start_after: None } ──range──▶ More { start_after: last_key } ──▶ ...
//!        │                                     │
//!        │ more == false / limit reached       │ store error / bad page
//!        ▼                                     ▼
//!      Done                                  Failed
//! ```
//!
//! Every page after the first is pinned to the revision the first page
//! observed and resumes strictly after the previous page's last key, so pages
//! neither overlap nor skip keys.

use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::error::{KvportError, Result};
use crate::snapshot::Snapshot;
use crate::store::{KeyValue, RangeRequest, StoreClient};

/// Prefix used when the requested one is empty or not rooted
pub const ROOT_PREFIX: &str = "/";

/// Records requested per range read unless configured otherwise
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// Map an empty or non-rooted prefix to [`ROOT_PREFIX`]
pub fn normalize_prefix(prefix: &str) -> &str {
    if prefix.starts_with(ROOT_PREFIX) {
        prefix
    } else {
        ROOT_PREFIX
    }
}

/// Clamp a signed limit to an unsigned one; 0 means unlimited
pub fn normalize_limit(limit: i64) -> u64 {
    limit.max(0) as u64
}

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Canonical path of the written snapshot
    pub path: PathBuf,

    /// Records written
    pub count: usize,

    /// Range reads issued
    pub pages: usize,

    /// Store revision the export reflects
    pub revision: u64,

    /// Records dropped because their key decoded to the same text as an
    /// earlier one (invalid UTF-8 replaced by U+FFFD)
    pub collapsed: usize,
}

/// Drives paginated prefix reads and persists the result
#[derive(Debug, Clone)]
pub struct Exporter {
    page_size: u64,
    cancel: CancelToken,
}

impl Exporter {
    /// Create an exporter requesting `page_size` records per read (0 = store decides)
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size,
            cancel: CancelToken::new(),
        }
    }

    /// Stop between pages once `token` is cancelled
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Export everything under `prefix` (at most `limit` records, 0 = all) to `destination`
    ///
    /// Nothing is written unless every read succeeds.
    pub fn export<S: StoreClient + ?Sized>(
        &self,
        store: &S,
        prefix: &str,
        limit: u64,
        destination: &Path,
    ) -> Result<ExportSummary> {
        let prefix = normalize_prefix(prefix);
        tracing::info!("Exporting {} records with prefix {}", limit_label(limit), prefix);

        let mut pages = self.pages(store, prefix, limit);
        let mut snapshot = Snapshot::new();
        let mut collapsed = 0;
        for page in pages.by_ref() {
            for kv in page? {
                if snapshot.insert_bytes(&kv.key, &kv.value).is_some() {
                    collapsed += 1;
                    tracing::warn!(
                        "Key {:?} collides with an earlier key after UTF-8 decoding; keeping the later value",
                        String::from_utf8_lossy(&kv.key)
                    );
                }
            }
        }
        let (fetched, revision) = (pages.fetched(), pages.revision().unwrap_or(0));

        let path = snapshot.persist(destination)?;
        tracing::info!("Saved to {}", path.display());
        tracing::info!("Exported {} records in {} pages at revision {}", snapshot.len(), fetched, revision);

        Ok(ExportSummary {
            path,
            count: snapshot.len(),
            pages: fetched,
            revision,
            collapsed,
        })
    }

    /// Page iterator over `prefix`
    pub fn pages<'a, S: StoreClient + ?Sized>(
        &'a self,
        store: &'a S,
        prefix: &str,
        limit: u64,
    ) -> Pages<'a, S> {
        Pages {
            store,
            cancel: &self.cancel,
            prefix: normalize_prefix(prefix).as_bytes().to_vec(),
            page_size: self.page_size,
            remaining: (limit > 0).then_some(limit),
            revision: None,
            collected: 0,
            fetched: 0,
            state: PageState::More { start_after: None },
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

fn limit_label(limit: u64) -> String {
    if limit == 0 {
        "all".to_string()
    } else {
        limit.to_string()
    }
}

/// Pagination state
#[derive(Debug, Clone, PartialEq, Eq)]
enum PageState {
    /// Another read is due, resuming after `start_after`
    More { start_after: Option<Vec<u8>> },
    Done,
    Failed,
}

/// Iterator over the pages of one logical prefix read
///
/// Yields each page's records; after an error it yields nothing more.
pub struct Pages<'a, S: ?Sized> {
    store: &'a S,
    cancel: &'a CancelToken,
    prefix: Vec<u8>,
    page_size: u64,

    /// Records still wanted (None = unlimited)
    remaining: Option<u64>,

    /// Revision pinned by the first page
    revision: Option<u64>,

    collected: usize,
    fetched: usize,
    state: PageState,
}

impl<S: ?Sized> Pages<'_, S> {
    /// Range reads issued so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Records yielded so far
    pub fn collected(&self) -> usize {
        self.collected
    }

    /// Revision all pages are read at, once the first page arrived
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    pub fn is_done(&self) -> bool {
        self.state == PageState::Done
    }

    fn fail(&mut self, reason: impl Into<String>) -> Option<Result<Vec<KeyValue>>> {
        self.state = PageState::Failed;
        Some(Err(KvportError::RangeRead {
            prefix: String::from_utf8_lossy(&self.prefix).into_owned(),
            reason: reason.into(),
        }))
    }
}

impl<S: StoreClient + ?Sized> Iterator for Pages<'_, S> {
    type Item = Result<Vec<KeyValue>>;

    fn next(&mut self) -> Option<Self::Item> {
        let start_after = match &self.state {
            PageState::More { start_after } => start_after.clone(),
            PageState::Done | PageState::Failed => return None,
        };

        if self.cancel.is_cancelled() {
            self.state = PageState::Failed;
            return Some(Err(KvportError::Cancelled {
                written: self.collected,
            }));
        }

        let want = match (self.remaining, self.page_size) {
            (None, size) => size,
            (Some(remaining), 0) => remaining,
            (Some(remaining), size) => remaining.min(size),
        };

        let mut request = RangeRequest::prefix(self.prefix.clone()).with_limit(want);
        request.start_after = start_after.clone();
        request.revision = self.revision;

        let response = match self.store.range(&request) {
            Ok(response) => response,
            Err(e) => return self.fail(e.to_string()),
        };
        self.fetched += 1;

        let mut kvs = response.kvs;
        let mut more = response.more;
        if want > 0 && kvs.len() as u64 > want {
            tracing::warn!("Store returned {} records for a page of {}, truncating", kvs.len(), want);
            kvs.truncate(want as usize);
            more = true;
        }

        // Keys must be strictly ascending, inside the prefix and past the cursor
        let mut previous = start_after.as_deref();
        for kv in &kvs {
            if !kv.key.starts_with(&self.prefix) {
                let reason = format!("store returned key {:?} outside the prefix", String::from_utf8_lossy(&kv.key));
                return self.fail(reason);
            }
            if previous.is_some_and(|p| kv.key.as_slice() <= p) {
                let reason = format!(
                    "store returned key {:?} out of order at a page boundary",
                    String::from_utf8_lossy(&kv.key)
                );
                return self.fail(reason);
            }
            previous = Some(kv.key.as_slice());
        }

        if more && kvs.is_empty() {
            return self.fail("store reported more records but returned an empty page");
        }

        if self.revision.is_none() {
            self.revision = Some(response.revision);
        }

        self.collected += kvs.len();
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= kvs.len() as u64;
        }

        tracing::debug!(
            "Page {}: {} records, {} collected, more={}",
            self.fetched,
            kvs.len(),
            self.collected,
            more
        );

        self.state = match kvs.last() {
            Some(last) if more && self.remaining != Some(0) => PageState::More {
                start_after: Some(last.key.clone()),
            },
            _ => PageState::Done,
        };

        Some(Ok(kvs))
    }
}
