//! Configuration for kvport
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::error::{KvportError, Result};

/// Token in a snapshot path that is replaced with the current local time
pub const TIME_TOKEN: &str = "{time}";

/// Format used when substituting [`TIME_TOKEN`]
pub const TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Client-side configuration for one kvport invocation
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Store endpoints (`host:port`), tried in order when dialing
    pub endpoints: Vec<String>,

    /// TCP connect timeout (milliseconds)
    pub dial_timeout_ms: u64,

    /// Per-request read/write timeout (milliseconds)
    pub request_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Transfer Configuration
    // -------------------------------------------------------------------------
    /// Records requested per range read (0 = let the store decide)
    pub page_size: u64,

    /// Snapshot file path, may contain [`TIME_TOKEN`]
    pub snapshot_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            dial_timeout_ms: 5000,
            request_timeout_ms: 5000,
            page_size: 1000,
            snapshot_path: PathBuf::from("load.json"),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the endpoints from a comma-separated `host:port` list
    pub fn endpoints(mut self, list: &str) -> Result<Self> {
        self.config.endpoints = parse_endpoints(list)?;
        Ok(self)
    }

    /// Set the dial timeout (in milliseconds)
    pub fn dial_timeout_ms(mut self, ms: u64) -> Self {
        self.config.dial_timeout_ms = ms;
        self
    }

    /// Set the request timeout (in milliseconds)
    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    /// Set the range read page size
    pub fn page_size(mut self, size: u64) -> Self {
        self.config.page_size = size;
        self
    }

    /// Set the snapshot file path
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.snapshot_path = path.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Split a comma-separated endpoint list, dropping blanks
///
/// Fails when no endpoint remains or an entry has no port.
pub fn parse_endpoints(list: &str) -> Result<Vec<String>> {
    let endpoints: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect();

    if endpoints.is_empty() {
        return Err(KvportError::Config("--endpoint must not be empty".to_string()));
    }

    for endpoint in &endpoints {
        match endpoint.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => {
                return Err(KvportError::Config(format!(
                    "invalid endpoint {:?}, expected host:port",
                    endpoint
                )))
            }
        }
    }

    Ok(endpoints)
}

/// Replace every [`TIME_TOKEN`] in `template` with `now` formatted as [`TIME_FORMAT`]
pub fn resolve_snapshot_path(template: &str, now: DateTime<Local>) -> PathBuf {
    if !template.contains(TIME_TOKEN) {
        return PathBuf::from(template);
    }
    let stamp = now.format(TIME_FORMAT).to_string();
    PathBuf::from(template.replace(TIME_TOKEN, &stamp))
}

/// Configuration for the reference store server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP listen address
    pub listen_addr: String,

    /// Worker threads serving connections
    pub workers: usize,

    /// Max records returned by a single range read (0 = uncapped)
    pub page_cap: u64,

    /// Member id reported in status responses
    pub member_id: u64,

    /// Idle connections are closed after this (milliseconds, 0 = never)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:2379".to_string(),
            workers: 4,
            page_cap: 0,
            member_id: 1,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}
