//! Store Module
//!
//! The store client seam and the data types that cross it.
//!
//! ## Responsibilities
//! - Define the capabilities kvport needs from a store ([`StoreClient`])
//! - Range reads scoped to a prefix, resumable after a key, pinned to a revision
//! - Unconditional single-key writes returning the store revision
//! - Per-endpoint status queries
//!
//! Implementations:
//! - [`MemoryStore`]: in-process revisioned store (reference server, tests)
//! - [`crate::network::TcpStoreClient`]: remote store over the wire protocol

mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single key version returned by a range read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,

    /// Revision of the write that produced this version
    pub mod_revision: u64,
}

/// A prefix-scoped range read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRequest {
    /// Only keys starting with this prefix match
    pub prefix: Vec<u8>,

    /// Max records to return (0 = no limit from the caller)
    pub limit: u64,

    /// Exclusive continuation key: only keys strictly greater match
    pub start_after: Option<Vec<u8>>,

    /// Read as of this revision (None = latest)
    pub revision: Option<u64>,
}

impl RangeRequest {
    /// Range over everything under `prefix`
    pub fn prefix(prefix: impl Into<Vec<u8>>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_start_after(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.start_after = Some(key.into());
        self
    }

    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }
}

/// Result of one range read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeResponse {
    /// Matching records in ascending key order
    pub kvs: Vec<KeyValue>,

    /// More matching keys exist after the last returned key
    pub more: bool,

    /// Revision the read observed
    pub revision: u64,
}

/// Outcome of a successful single-key write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResult {
    /// Store revision assigned to the write
    pub revision: u64,
}

/// Raw status of one store member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub endpoint: String,
    pub member_id: u64,
    pub leader: u64,
    pub version: String,

    /// Approximate size of stored data (bytes)
    pub db_size: u64,
    pub key_count: u64,
    pub revision: u64,
    pub raft_term: u64,
}

/// The capabilities kvport needs from a key-value store
///
/// The client is owned by the caller; kvport borrows it for one operation and
/// never closes or reconnects it.
pub trait StoreClient {
    /// Read records under `request.prefix`
    fn range(&self, request: &RangeRequest) -> Result<RangeResponse>;

    /// Unconditionally set `key` to `value`
    fn put(&self, key: &[u8], value: &[u8]) -> Result<PutResult>;

    /// Query the status of one endpoint
    fn status(&self, endpoint: &str) -> Result<StatusReport>;

    /// Endpoints this client was configured with
    fn endpoints(&self) -> &[String];
}

impl<S: StoreClient + ?Sized> StoreClient for &S {
    fn range(&self, request: &RangeRequest) -> Result<RangeResponse> {
        (**self).range(request)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<PutResult> {
        (**self).put(key, value)
    }

    fn status(&self, endpoint: &str) -> Result<StatusReport> {
        (**self).status(endpoint)
    }

    fn endpoints(&self) -> &[String] {
        (**self).endpoints()
    }
}
