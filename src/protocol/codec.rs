//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │     Payload (bincode)       │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Request Kind
//! - GET_TRAINER / DELETE_TRAINER: id (string)
//! - UPDATE_TRAINER:               UpdateTrainer
//! - CREATE_TRAINER:               NewTrainer
//! - LIST_TRAINERS:                name fragment (string)
//! - CREATE_END / PING:            empty
//!
//! ### Payload by Response Kind
//! - OK:            Reply
//! - ITEM:          Trainer
//! - ERROR:         (ErrorCode, message)
//! - END_OF_STREAM: empty

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;

use super::{ErrorCode, Request, Response, ResponseKind};
use crate::error::{Result, RosterError};

/// Header size: 1 byte kind + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
///
/// Format: kind (1) + payload_len (4) + payload
pub fn encode_request(request: &Request) -> Result<Bytes> {
    let payload = match request {
        Request::GetTrainer { id } | Request::DeleteTrainer { id } => bincode::serialize(id)?,
        Request::UpdateTrainer(update) => bincode::serialize(update)?,
        Request::CreateTrainer(input) => bincode::serialize(input)?,
        Request::ListTrainers { name } => bincode::serialize(name)?,
        Request::CreateEnd | Request::Ping => Vec::new(),
    };

    frame(request.kind() as u8, &payload)
}

/// Decode a request from bytes
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (kind, payload) = split_frame(bytes)?;

    match kind {
        0x01 => Ok(Request::GetTrainer {
            id: decode_payload(payload, "GET_TRAINER")?,
        }),
        0x02 => Ok(Request::DeleteTrainer {
            id: decode_payload(payload, "DELETE_TRAINER")?,
        }),
        0x03 => Ok(Request::UpdateTrainer(decode_payload(payload, "UPDATE_TRAINER")?)),
        0x04 => Ok(Request::CreateTrainer(decode_payload(payload, "CREATE_TRAINER")?)),
        0x05 => expect_empty(payload, "CREATE_END").map(|_| Request::CreateEnd),
        0x06 => Ok(Request::ListTrainers {
            name: decode_payload(payload, "LIST_TRAINERS")?,
        }),
        0x07 => expect_empty(payload, "PING").map(|_| Request::Ping),
        _ => Err(RosterError::Protocol(format!(
            "Unknown request kind: 0x{:02x}",
            kind
        ))),
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: kind (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Result<Bytes> {
    let payload = match response {
        Response::Ok(reply) => bincode::serialize(reply)?,
        Response::Item(trainer) => bincode::serialize(trainer)?,
        Response::Error { code, message } => bincode::serialize(&(code, message))?,
        Response::EndOfStream => Vec::new(),
    };

    frame(response.kind() as u8, &payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (kind, payload) = split_frame(bytes)?;

    match kind {
        k if k == ResponseKind::Ok as u8 => Ok(Response::Ok(decode_payload(payload, "OK")?)),
        k if k == ResponseKind::Item as u8 => Ok(Response::Item(decode_payload(payload, "ITEM")?)),
        k if k == ResponseKind::EndOfStream as u8 => {
            expect_empty(payload, "END_OF_STREAM").map(|_| Response::EndOfStream)
        }
        k if k == ResponseKind::Error as u8 => {
            let (code, message): (ErrorCode, String) = decode_payload(payload, "ERROR")?;
            Ok(Response::Error { code, message })
        }
        _ => Err(RosterError::Protocol(format!(
            "Unknown response kind: 0x{:02x}",
            kind
        ))),
    }
}

// =============================================================================
// Frame helpers
// =============================================================================

/// Prefix a payload with its header
fn frame(kind: u8, payload: &[u8]) -> Result<Bytes> {
    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(RosterError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(kind);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);

    Ok(message.freeze())
}

/// Parse a header and return the kind and exactly the payload it announces
fn split_frame(bytes: &[u8]) -> Result<(u8, &[u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(RosterError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let kind = header.get_u8();
    let payload_len = header.get_u32() as usize;

    // Validate payload length
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(RosterError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(RosterError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

fn decode_payload<T: DeserializeOwned>(payload: &[u8], what: &str) -> Result<T> {
    bincode::deserialize(payload)
        .map_err(|e| RosterError::Protocol(format!("{} frame: bad payload: {}", what, e)))
}

fn expect_empty(payload: &[u8], what: &str) -> Result<()> {
    if !payload.is_empty() {
        return Err(RosterError::Protocol(format!(
            "{} frame: unexpected payload of {} bytes",
            what,
            payload.len()
        )));
    }
    Ok(())
}

/// Read one whole frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let mut len_bytes = &header[1..];
    let payload_len = len_bytes.get_u32() as usize;
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(RosterError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

fn write_frame<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete request from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    decode_request(&read_frame(reader)?)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    write_frame(writer, &encode_request(request)?)
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    decode_response(&read_frame(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    write_frame(writer, &encode_response(response)?)
}
