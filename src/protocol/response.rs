//! Response definitions
//!
//! Represents responses to clients. Typed payloads are built and read here:
//! - RANGE:  bincode-encoded `RangeResponse`
//! - PUT:    revision (8 bytes, BE)
//! - STATUS: bincode-encoded `StatusReport`
//! - PING:   `PONG`

use crate::error::{KvportError, Result};
use crate::store::{PutResult, RangeResponse, StatusReport};

/// Payload of a successful PING
pub const PONG: &[u8] = b"PONG";

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x01,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (typed result for OK, error message for ERROR)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    pub fn range(result: &RangeResponse) -> Result<Self> {
        Ok(Self::ok(Some(bincode::serialize(result)?)))
    }

    pub fn put(result: PutResult) -> Self {
        Self::ok(Some(result.revision.to_be_bytes().to_vec()))
    }

    pub fn status(report: &StatusReport) -> Result<Self> {
        Ok(Self::ok(Some(bincode::serialize(report)?)))
    }

    pub fn pong() -> Self {
        Self::ok(Some(PONG.to_vec()))
    }

    /// Payload of an OK response; an ERROR response becomes [`KvportError::Store`]
    pub fn into_payload(self) -> Result<Vec<u8>> {
        match self.status {
            Status::Ok => Ok(self.payload.unwrap_or_default()),
            Status::Error => {
                let message = self.payload.unwrap_or_default();
                Err(KvportError::Store(String::from_utf8_lossy(&message).into_owned()))
            }
        }
    }

    pub fn into_range(self) -> Result<RangeResponse> {
        Ok(bincode::deserialize(&self.into_payload()?)?)
    }

    pub fn into_put(self) -> Result<PutResult> {
        let payload = self.into_payload()?;
        let bytes: [u8; 8] = payload.as_slice().try_into().map_err(|_| {
            KvportError::Protocol(format!("PUT response: expected 8 byte revision, got {} bytes", payload.len()))
        })?;
        Ok(PutResult {
            revision: u64::from_be_bytes(bytes),
        })
    }

    pub fn into_status(self) -> Result<StatusReport> {
        Ok(bincode::deserialize(&self.into_payload()?)?)
    }

    pub fn into_pong(self) -> Result<()> {
        let payload = self.into_payload()?;
        if payload != PONG {
            return Err(KvportError::Protocol("PING response: unexpected payload".to_string()));
        }
        Ok(())
    }
}
