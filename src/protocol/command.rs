//! Command definitions
//!
//! Represents requests sent from a store client to a store endpoint.

use crate::store::RangeRequest;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Range = 0x01,
    Put = 0x02,
    Status = 0x03,
    Ping = 0x04,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Prefix-scoped range read
    Range(RangeRequest),

    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Member status
    Status,

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Range(_) => CommandType::Range,
            Command::Put { .. } => CommandType::Put,
            Command::Status => CommandType::Status,
            Command::Ping => CommandType::Ping,
        }
    }
}
