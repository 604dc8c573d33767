//! Codec Tests
//!
//! Tests for command and response encoding/decoding.

use std::io::Cursor;

use kvport::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, Response, Status, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
use kvport::store::{KeyValue, PutResult, RangeRequest, RangeResponse, StatusReport};
use kvport::KvportError;

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_range() {
    let cmd = Command::Range(RangeRequest::prefix("/app/").with_limit(500));
    let decoded = decode_command(&encode_command(&cmd)).unwrap();
    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_range_with_cursor_and_revision() {
    let cmd = Command::Range(
        RangeRequest::prefix("/app/")
            .with_limit(7)
            .with_start_after("/app/k06")
            .with_revision(1234),
    );
    let decoded = decode_command(&encode_command(&cmd)).unwrap();
    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_range_empty_cursor_key() {
    let cmd = Command::Range(RangeRequest::prefix("/").with_start_after(Vec::new()));
    let decoded = decode_command(&encode_command(&cmd)).unwrap();
    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_put() {
    let cmd = Command::Put {
        key: b"/mykey".to_vec(),
        value: b"myvalue".to_vec(),
    };
    let decoded = decode_command(&encode_command(&cmd)).unwrap();
    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_put_empty_value() {
    let cmd = Command::Put {
        key: b"/k".to_vec(),
        value: Vec::new(),
    };
    let decoded = decode_command(&encode_command(&cmd)).unwrap();
    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_status_and_ping() {
    for cmd in [Command::Status, Command::Ping] {
        let encoded = encode_command(&cmd);
        assert_eq!(encoded.len(), HEADER_SIZE);
        assert_eq!(decode_command(&encoded).unwrap(), cmd);
    }
}

#[test]
fn test_encode_put_layout() {
    let cmd = Command::Put {
        key: b"/k".to_vec(),
        value: b"v".to_vec(),
    };
    let encoded = encode_command(&cmd);
    assert_eq!(
        encoded,
        vec![0x02, 0, 0, 0, 7, 0, 0, 0, 2, b'/', b'k', b'v']
    );
}

// =============================================================================
// Command Error Tests
// =============================================================================

#[test]
fn test_decode_incomplete_header() {
    let result = decode_command(&[0x01, 0x00]);
    assert!(matches!(result, Err(KvportError::Protocol(_))));
}

#[test]
fn test_decode_unknown_command() {
    let result = decode_command(&[0xff, 0, 0, 0, 0]);
    assert!(matches!(result, Err(KvportError::Protocol(_))));
}

#[test]
fn test_decode_payload_too_large() {
    let len = (MAX_PAYLOAD_SIZE + 1).to_be_bytes();
    let result = decode_command(&[0x02, len[0], len[1], len[2], len[3]]);
    assert!(matches!(result, Err(KvportError::Protocol(_))));
}

#[test]
fn test_decode_incomplete_payload() {
    let mut encoded = encode_command(&Command::Put {
        key: b"/k".to_vec(),
        value: b"value".to_vec(),
    });
    encoded.truncate(encoded.len() - 2);
    assert!(matches!(decode_command(&encoded), Err(KvportError::Protocol(_))));
}

#[test]
fn test_decode_range_invalid_cursor_flag() {
    let mut encoded = encode_command(&Command::Range(RangeRequest::prefix("/")));
    let last = encoded.len() - 1;
    encoded[last] = 0x07;
    assert!(matches!(decode_command(&encoded), Err(KvportError::Protocol(_))));
}

#[test]
fn test_decode_range_truncated_limit() {
    // prefix "/" followed by only 3 bytes of limit
    let payload = [0, 0, 0, 1, b'/', 0, 0, 0];
    let mut frame = vec![0x01, 0, 0, 0, payload.len() as u8];
    frame.extend_from_slice(&payload);
    assert!(matches!(decode_command(&frame), Err(KvportError::Protocol(_))));
}

#[test]
fn test_decode_ping_with_payload() {
    let result = decode_command(&[0x04, 0, 0, 0, 1, 0xaa]);
    assert!(matches!(result, Err(KvportError::Protocol(_))));
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_encode_decode_ok_response() {
    let response = Response::ok(Some(b"payload".to_vec()));
    let decoded = decode_response(&encode_response(&response).unwrap()).unwrap();
    assert_eq!(decoded, response);
}

#[test]
fn test_encode_decode_empty_ok_response() {
    let decoded = decode_response(&encode_response(&Response::ok(None)).unwrap()).unwrap();
    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.payload, None);
}

#[test]
fn test_decode_unknown_status() {
    assert!(matches!(
        decode_response(&[0x09, 0, 0, 0, 0]),
        Err(KvportError::Protocol(_))
    ));
}

#[test]
fn test_range_response_payload() {
    let result = RangeResponse {
        kvs: vec![KeyValue {
            key: b"/a".to_vec(),
            value: b"1".to_vec(),
            mod_revision: 3,
        }],
        more: true,
        revision: 9,
    };
    let wire = encode_response(&Response::range(&result).unwrap()).unwrap();
    assert_eq!(decode_response(&wire).unwrap().into_range().unwrap(), result);
}

#[test]
fn test_put_response_payload() {
    let wire = encode_response(&Response::put(PutResult { revision: 77 })).unwrap();
    assert_eq!(decode_response(&wire).unwrap().into_put().unwrap().revision, 77);
}

#[test]
fn test_oversized_response_is_refused() {
    let response = Response::ok(Some(vec![0u8; MAX_PAYLOAD_SIZE as usize + 1]));

    assert!(matches!(encode_response(&response), Err(KvportError::Protocol(_))));

    let mut buffer = Vec::new();
    assert!(matches!(
        write_response(&mut buffer, &response),
        Err(KvportError::Protocol(_))
    ));
    assert!(buffer.is_empty());
}

#[test]
fn test_put_response_bad_length() {
    let response = Response::ok(Some(vec![1, 2, 3]));
    assert!(matches!(response.into_put(), Err(KvportError::Protocol(_))));
}

#[test]
fn test_status_response_payload() {
    let report = StatusReport {
        endpoint: "127.0.0.1:2379".to_string(),
        member_id: 1,
        leader: 1,
        version: "0.1.0".to_string(),
        db_size: 1024,
        key_count: 10,
        revision: 42,
        raft_term: 3,
    };
    let wire = encode_response(&Response::status(&report).unwrap()).unwrap();
    assert_eq!(decode_response(&wire).unwrap().into_status().unwrap(), report);
}

#[test]
fn test_error_response_becomes_store_error() {
    let wire = encode_response(&Response::error("mvcc: required revision is a future revision")).unwrap();
    match decode_response(&wire).unwrap().into_range() {
        Err(KvportError::Store(message)) => assert!(message.contains("future revision")),
        other => panic!("Expected Store error, got {:?}", other),
    }
}

#[test]
fn test_pong_response() {
    assert!(Response::pong().into_pong().is_ok());
    assert!(matches!(
        Response::ok(None).into_pong(),
        Err(KvportError::Protocol(_))
    ));
}

// =============================================================================
// Stream Tests
// =============================================================================

#[test]
fn test_stream_multiple_commands() {
    let commands = vec![
        Command::Ping,
        Command::Put {
            key: b"/a".to_vec(),
            value: b"1".to_vec(),
        },
        Command::Range(RangeRequest::prefix("/").with_limit(10)),
        Command::Status,
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for cmd in &commands {
        assert_eq!(&read_command(&mut cursor).unwrap(), cmd);
    }
    assert!(matches!(read_command(&mut cursor), Err(KvportError::Io(_))));
}

#[test]
fn test_stream_response_round_trip() {
    let mut buffer = Vec::new();
    write_response(&mut buffer, &Response::put(PutResult { revision: 5 })).unwrap();
    write_response(&mut buffer, &Response::error("boom")).unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_response(&mut cursor).unwrap().into_put().unwrap().revision, 5);
    assert_eq!(read_response(&mut cursor).unwrap().status, Status::Error);
}
