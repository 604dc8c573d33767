//! Status reporter
//!
//! Queries each endpoint and passes the raw status through.

use crate::error::{KvportError, Result};
use crate::store::{StatusReport, StoreClient};

/// Status of one endpoint, or why it could not be queried
#[derive(Debug)]
pub struct EndpointStatus {
    pub endpoint: String,
    pub result: Result<StatusReport>,
}

/// Status of every queried endpoint
#[derive(Debug, Default)]
pub struct StatusSummary {
    pub endpoints: Vec<EndpointStatus>,
}

impl StatusSummary {
    /// Every endpoint answered
    pub fn is_healthy(&self) -> bool {
        !self.endpoints.is_empty() && self.endpoints.iter().all(|e| e.result.is_ok())
    }

    pub fn reports(&self) -> impl Iterator<Item = &StatusReport> {
        self.endpoints.iter().filter_map(|e| e.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &EndpointStatus> {
        self.endpoints.iter().filter(|e| e.result.is_err())
    }

    /// `Ok` when every endpoint answered, otherwise a
    /// [`KvportError::StatusQuery`] naming the first failed endpoint
    pub fn check(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(KvportError::StatusQuery {
                endpoint: String::new(),
                reason: "no endpoints queried".to_string(),
            });
        }

        let failed = self.failures().count();
        let first = self.failures().next().map(|e| e.endpoint.clone());
        match first {
            None => Ok(()),
            Some(endpoint) => Err(KvportError::StatusQuery {
                endpoint,
                reason: format!("{} of {} endpoints failed", failed, self.endpoints.len()),
            }),
        }
    }
}

/// Query every endpoint in `endpoints`
///
/// Failures are recorded per endpoint as [`KvportError::StatusQuery`]; they
/// never stop the remaining queries.
pub fn report<S: StoreClient + ?Sized>(store: &S, endpoints: &[String]) -> StatusSummary {
    let endpoints = endpoints
        .iter()
        .map(|endpoint| {
            let result = store.status(endpoint).map_err(|e| match e {
                e @ KvportError::StatusQuery { .. } => e,
                e => KvportError::StatusQuery {
                    endpoint: endpoint.clone(),
                    reason: e.to_string(),
                },
            });
            if let Err(e) = &result {
                tracing::debug!("Status query failed: {}", e);
            }
            EndpointStatus {
                endpoint: endpoint.clone(),
                result,
            }
        })
        .collect();

    StatusSummary { endpoints }
}
