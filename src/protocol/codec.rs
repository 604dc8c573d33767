//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - RANGE:  prefix_len (4) + prefix + limit (8) + revision (8, 0 = latest)
//!           + has_start (1) [+ start_len (4) + start_after]
//! - PUT:    key_len (4 bytes) + key + value
//! - STATUS: empty
//! - PING:   empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{KvportError, Result};
use crate::store::RangeRequest;

use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = BytesMut::new();

    match command {
        Command::Range(request) => {
            payload.put_u32(request.prefix.len() as u32);
            payload.put_slice(&request.prefix);
            payload.put_u64(request.limit);
            payload.put_u64(request.revision.unwrap_or(0));
            match &request.start_after {
                Some(key) => {
                    payload.put_u8(1);
                    payload.put_u32(key.len() as u32);
                    payload.put_slice(key);
                }
                None => payload.put_u8(0),
            }
        }
        Command::Put { key, value } => {
            payload.put_u32(key.len() as u32);
            payload.put_slice(key);
            payload.put_slice(value);
        }
        Command::Status | Command::Ping => {}
    }

    frame(command.command_type() as u8, &payload)
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, payload) = split_frame(bytes, "command")?;

    // Parse command based on type
    match cmd_type {
        0x01 => decode_range_command(payload),
        0x02 => decode_put_command(payload),
        0x03 => decode_empty_command(payload, "STATUS", Command::Status),
        0x04 => decode_empty_command(payload, "PING", Command::Ping),
        _ => Err(KvportError::Protocol(format!(
            "Unknown command type: 0x{:02x}",
            cmd_type
        ))),
    }
}

/// Decode RANGE command payload
fn decode_range_command(mut payload: &[u8]) -> Result<Command> {
    let prefix = take_bytes(&mut payload, "RANGE command: prefix")?;
    let limit = take_u64(&mut payload, "RANGE command: limit")?;
    let revision = take_u64(&mut payload, "RANGE command: revision")?;

    if !payload.has_remaining() {
        return Err(KvportError::Protocol(
            "RANGE command: missing continuation flag".to_string(),
        ));
    }
    let start_after = match payload.get_u8() {
        0 => None,
        1 => Some(take_bytes(&mut payload, "RANGE command: continuation key")?),
        flag => {
            return Err(KvportError::Protocol(format!(
                "RANGE command: invalid continuation flag 0x{:02x}",
                flag
            )))
        }
    };

    if payload.has_remaining() {
        return Err(KvportError::Protocol(format!(
            "RANGE command: {} trailing bytes",
            payload.remaining()
        )));
    }

    Ok(Command::Range(RangeRequest {
        prefix,
        limit,
        start_after,
        revision: (revision > 0).then_some(revision),
    }))
}

/// Decode PUT command payload
fn decode_put_command(mut payload: &[u8]) -> Result<Command> {
    let key = take_bytes(&mut payload, "PUT command: key")?;
    let value = payload.to_vec();

    Ok(Command::Put { key, value })
}

/// Decode a command that carries no payload
fn decode_empty_command(payload: &[u8], name: &str, command: Command) -> Result<Command> {
    if !payload.is_empty() {
        return Err(KvportError::Protocol(format!(
            "{} command: unexpected payload of {} bytes",
            name,
            payload.len()
        )));
    }
    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
///
/// Fails if the payload is larger than [`MAX_PAYLOAD_SIZE`], since the
/// receiving side would reject the frame.
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    check_payload_len(payload.len())?;
    Ok(frame(response.status as u8, payload))
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    // Parse status
    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::Error,
        _ => {
            return Err(KvportError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Framing helpers
// =============================================================================

/// Build header + payload
fn frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(kind);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.to_vec()
}

/// Validate a complete frame and split it into kind and payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(KvportError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let kind = bytes[0];
    let payload_len = parse_payload_len(&bytes[1..HEADER_SIZE])?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(KvportError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

/// Parse and bound the 4 byte length field
fn parse_payload_len(mut len_bytes: &[u8]) -> Result<usize> {
    let payload_len = len_bytes.get_u32() as usize;
    check_payload_len(payload_len)?;
    Ok(payload_len)
}

fn check_payload_len(payload_len: usize) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(KvportError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

fn take_u64(buf: &mut &[u8], what: &str) -> Result<u64> {
    if buf.remaining() < 8 {
        return Err(KvportError::Protocol(format!("{}: truncated", what)));
    }
    Ok(buf.get_u64())
}

/// Read a length-prefixed byte string
fn take_bytes(buf: &mut &[u8], what: &str) -> Result<Vec<u8>> {
    if buf.remaining() < 4 {
        return Err(KvportError::Protocol(format!("{}: missing length", what)));
    }
    let len = buf.get_u32() as usize;
    if buf.remaining() < len {
        return Err(KvportError::Protocol(format!(
            "{}: incomplete (expected {}, got {})",
            what,
            len,
            buf.remaining()
        )));
    }
    Ok(buf.copy_to_bytes(len).to_vec())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = parse_payload_len(&header[1..])?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }
    Ok(message)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    decode_command(&read_frame(reader)?)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    decode_response(&read_frame(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response)?)?;
    writer.flush()?;
    Ok(())
}
