//! In-memory store
//!
//! Ordered, multi-version key-value store. Every write gets a new revision
//! and keeps older versions, so a range read can be pinned to the revision
//! observed by an earlier page.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{KvportError, Result};
use crate::VERSION;

use super::{KeyValue, PutResult, RangeRequest, RangeResponse, StatusReport, StoreClient};

/// A stored version of one key
#[derive(Debug, Clone)]
struct Version {
    revision: u64,
    value: Vec<u8>,
}

/// In-memory revisioned store
///
/// ## Concurrency:
/// - `data`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `revision`: only advanced while the write lock is held, so versions are
///   appended in revision order
pub struct MemoryStore {
    /// Key -> versions, oldest first
    data: RwLock<BTreeMap<Vec<u8>, Vec<Version>>>,

    /// Latest assigned revision
    revision: AtomicU64,

    /// Max records a single range read returns (0 = uncapped)
    page_cap: u64,

    member_id: u64,
    endpoints: Vec<String>,
}

impl MemoryStore {
    /// Create an empty store with no page cap
    pub fn new() -> Self {
        Self::with_page_cap(0)
    }

    /// Create an empty store that returns at most `page_cap` records per read
    pub fn with_page_cap(page_cap: u64) -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            revision: AtomicU64::new(0),
            page_cap,
            member_id: 1,
            endpoints: vec!["memory".to_string()],
        }
    }

    /// Set the member id reported by [`StoreClient::status`]
    pub fn with_member_id(mut self, member_id: u64) -> Self {
        self.member_id = member_id;
        self
    }

    /// Latest revision
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.data.read().len()
    }

    /// Latest value of `key`
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data
            .read()
            .get(key)
            .and_then(|versions| versions.last())
            .map(|v| v.value.clone())
    }

    /// Latest value of every key, in key order
    pub fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.data
            .read()
            .iter()
            .filter_map(|(k, versions)| versions.last().map(|v| (k.clone(), v.value.clone())))
            .collect()
    }

    /// Store a value and return its revision
    pub fn set(&self, key: &[u8], value: &[u8]) -> u64 {
        let mut data = self.data.write();
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        data.entry(key.to_vec()).or_default().push(Version {
            revision,
            value: value.to_vec(),
        });
        revision
    }

    /// Execute a range read
    pub fn read_range(&self, request: &RangeRequest) -> Result<RangeResponse> {
        self.read_range_within(request, usize::MAX)
    }

    /// Execute a range read whose bincode-encoded response fits in `max_bytes`
    ///
    /// A page cut short by the budget reports `more`. A single record larger
    /// than the budget is a [`KvportError::Store`] error.
    pub fn read_range_within(&self, request: &RangeRequest, max_bytes: usize) -> Result<RangeResponse> {
        let current = self.revision();
        let at = match request.revision {
            Some(0) | None => current,
            Some(rev) if rev > current => {
                return Err(KvportError::Store(format!(
                    "requested revision {} is a future revision (current {})",
                    rev, current
                )))
            }
            Some(rev) => rev,
        };

        let cap = match (request.limit, self.page_cap) {
            (0, 0) => usize::MAX,
            (0, cap) | (cap, 0) => cap as usize,
            (limit, cap) => limit.min(cap) as usize,
        };

        let start = match &request.start_after {
            Some(key) if key.as_slice() >= request.prefix.as_slice() => Bound::Excluded(key.clone()),
            _ => Bound::Included(request.prefix.clone()),
        };

        let data = self.data.read();
        let mut kvs = Vec::new();
        let mut more = false;
        let mut used = bincode::serialized_size(&RangeResponse::default())? as usize;

        let matching = data
            .range((start, Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(&request.prefix))
            .filter_map(|(k, versions)| {
                versions
                    .iter()
                    .rev()
                    .find(|v| v.revision <= at)
                    .map(|v| KeyValue {
                        key: k.clone(),
                        value: v.value.clone(),
                        mod_revision: v.revision,
                    })
            });

        for kv in matching {
            if kvs.len() == cap {
                more = true;
                break;
            }
            let size = bincode::serialized_size(&kv)? as usize;
            if used.saturating_add(size) > max_bytes {
                if kvs.is_empty() {
                    return Err(KvportError::Store(format!(
                        "key {:?} needs {} bytes, over the {} byte response limit",
                        String::from_utf8_lossy(&kv.key),
                        size,
                        max_bytes
                    )));
                }
                more = true;
                break;
            }
            used += size;
            kvs.push(kv);
        }

        Ok(RangeResponse {
            kvs,
            more,
            revision: at,
        })
    }

    /// Status of this store as seen from `endpoint`
    pub fn report(&self, endpoint: &str) -> StatusReport {
        let data = self.data.read();
        let db_size: u64 = data
            .iter()
            .flat_map(|(k, versions)| versions.iter().map(move |v| (k.len() + v.value.len()) as u64))
            .sum();

        StatusReport {
            endpoint: endpoint.to_string(),
            member_id: self.member_id,
            leader: self.member_id,
            version: VERSION.to_string(),
            db_size,
            key_count: data.len() as u64,
            revision: self.revision(),
            raft_term: 1,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreClient for MemoryStore {
    fn range(&self, request: &RangeRequest) -> Result<RangeResponse> {
        self.read_range(request)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<PutResult> {
        Ok(PutResult {
            revision: self.set(key, value),
        })
    }

    fn status(&self, endpoint: &str) -> Result<StatusReport> {
        Ok(self.report(endpoint))
    }

    fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}
