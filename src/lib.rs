//! # kvport
//!
//! Bulk export/import between an ordered, revisioned key-value store and a
//! flat JSON snapshot file, plus cluster status reporting:
//! - Prefix-scoped export with pagination pinned to one revision
//! - Fail-fast import with per-key revisions
//! - Atomic snapshot files (temp file + rename)
//! - TCP store client and an in-memory reference server
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 kvport CLI (export/import/status)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!      ┌────────────────┼─────────────────┐
//!      ▼                ▼                 ▼
//! ┌──────────┐    ┌──────────┐     ┌──────────┐      ┌──────────┐
//! │ Exporter │    │ Importer │     │  Status  │      │ Snapshot │
//! │ (Pages)  │    │(fail-fast│     │ Reporter │      │  (JSON)  │
//! └────┬─────┘    └────┬─────┘     └────┬─────┘      └──────────┘
//!      └───────────────┼────────────────┘
//!                      ▼
//!              ┌───────────────┐        ┌──────────────────────┐
//!              │ StoreClient   │──TCP──▶│ kvport-server        │
//!              │ (borrowed)    │        │ (MemoryStore)        │
//!              └───────────────┘        └──────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod cancel;

pub mod store;
pub mod snapshot;
pub mod export;
pub mod import;
pub mod status;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use cancel::CancelToken;
pub use config::{Config, ServerConfig};
pub use error::{KvportError, Result};
pub use export::{ExportSummary, Exporter};
pub use import::{ImportSummary, Importer};
pub use snapshot::Snapshot;
pub use store::{MemoryStore, StoreClient};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvport
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
