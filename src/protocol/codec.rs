//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! Requests travel as inline text lines; replies carry a one-byte type
//! prefix followed by a CRLF-terminated header:
//!
//! ```text
//! +OK\r\n
//! -ERR unknown command 'FOO'\r\n
//! :1\r\n
//! $3\r\nbar\r\n
//! $-1\r\n
//! ```

use std::io::{self, BufRead, Write};

use crate::error::{EmberError, Result};
use super::Reply;

/// Reply line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Maximum bulk payload accepted by the decoder (16 MB)
pub const MAX_BULK_LEN: usize = 16 * 1024 * 1024;

// =============================================================================
// Reply Encoding/Decoding
// =============================================================================

/// Encode a reply to bytes
pub fn encode_reply(reply: &Reply) -> Vec<u8> {
    match reply {
        Reply::Simple(text) => framed(b'+', text.as_bytes()),
        Reply::Error(text) => framed(b'-', text.as_bytes()),
        Reply::Integer(n) => framed(b':', n.to_string().as_bytes()),
        Reply::Bulk(data) => {
            let len = data.len().to_string();
            let mut message = Vec::with_capacity(1 + len.len() + data.len() + 4);
            message.push(b'$');
            message.extend_from_slice(len.as_bytes());
            message.extend_from_slice(CRLF);
            message.extend_from_slice(data);
            message.extend_from_slice(CRLF);
            message
        }
        Reply::Null => b"$-1\r\n".to_vec(),
    }
}

fn framed(prefix: u8, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(1 + body.len() + 2);
    message.push(prefix);
    message.extend_from_slice(body);
    message.extend_from_slice(CRLF);
    message
}

/// Decode one reply from the front of `bytes`
///
/// Returns the reply and the number of bytes consumed, or `Ok(None)` when
/// `bytes` does not yet hold a complete reply.
pub fn decode_reply(bytes: &[u8]) -> Result<Option<(Reply, usize)>> {
    let Some(&prefix) = bytes.first() else {
        return Ok(None);
    };
    let Some(line_end) = find_crlf(bytes) else {
        return Ok(None);
    };

    let line = &bytes[1..line_end];
    let header_len = line_end + CRLF.len();

    match prefix {
        b'+' => Ok(Some((Reply::Simple(utf8(line)?), header_len))),
        b'-' => Ok(Some((Reply::Error(utf8(line)?), header_len))),
        b':' => Ok(Some((Reply::Integer(parse_int(line)?), header_len))),
        b'$' => {
            let Some(len) = bulk_len(line)? else {
                return Ok(Some((Reply::Null, header_len)));
            };

            let total_len = header_len + len + CRLF.len();
            if bytes.len() < total_len {
                return Ok(None);
            }
            if &bytes[header_len + len..total_len] != CRLF {
                return Err(EmberError::Protocol(format!(
                    "Bulk reply of {} bytes not terminated by CRLF",
                    len
                )));
            }

            let data = bytes[header_len..header_len + len].to_vec();
            Ok(Some((Reply::Bulk(data), total_len)))
        }
        _ => Err(EmberError::Protocol(format!(
            "Unknown reply type: 0x{:02x}",
            prefix
        ))),
    }
}

fn find_crlf(bytes: &[u8]) -> Option<usize> {
    bytes.windows(CRLF.len()).position(|window| window == CRLF)
}

fn utf8(line: &[u8]) -> Result<String> {
    String::from_utf8(line.to_vec())
        .map_err(|_| EmberError::Protocol("Reply line is not valid UTF-8".to_string()))
}

fn parse_int(line: &[u8]) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            EmberError::Protocol(format!(
                "Invalid integer: {:?}",
                String::from_utf8_lossy(line)
            ))
        })
}

/// Parse a bulk header; `None` means the null bulk
fn bulk_len(line: &[u8]) -> Result<Option<usize>> {
    match parse_int(line)? {
        -1 => Ok(None),
        len if len < 0 => Err(EmberError::Protocol(format!(
            "Negative bulk length: {}",
            len
        ))),
        len => {
            let len = len as usize;
            if len > MAX_BULK_LEN {
                return Err(EmberError::Protocol(format!(
                    "Bulk reply too large: {} bytes (max {})",
                    len, MAX_BULK_LEN
                )));
            }
            Ok(Some(len))
        }
    }
}

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode an inline request line
///
/// Fails if an argument is empty or contains whitespace, since neither
/// survives tokenization on the server.
pub fn encode_request(verb: &str, args: &[&[u8]]) -> Result<Vec<u8>> {
    if verb.is_empty() || verb.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(EmberError::Protocol(format!("Invalid verb: {:?}", verb)));
    }

    let args_len: usize = args.iter().map(|arg| arg.len() + 1).sum();
    let mut message = Vec::with_capacity(verb.len() + args_len + CRLF.len());
    message.extend_from_slice(verb.as_bytes());

    for arg in args {
        if arg.is_empty() || arg.iter().any(|b| b.is_ascii_whitespace()) {
            return Err(EmberError::Protocol(format!(
                "Argument cannot be expressed inline: {:?}",
                String::from_utf8_lossy(arg)
            )));
        }
        message.push(b' ');
        message.extend_from_slice(arg);
    }

    message.extend_from_slice(CRLF);
    Ok(message)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a request line to a stream
pub fn write_request<W: Write>(writer: &mut W, verb: &str, args: &[&[u8]]) -> Result<()> {
    let bytes = encode_request(verb, args)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete reply from a stream
///
/// Blocks until a complete reply is received or an error occurs
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    // Header line first
    let mut frame = Vec::new();
    if reader.read_until(b'\n', &mut frame)? == 0 {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }

    // Bulk payload follows the header
    if frame.first() == Some(&b'$') {
        if let Some(header) = frame.strip_suffix(CRLF) {
            if let Some(len) = bulk_len(&header[1..])? {
                let start = frame.len();
                frame.resize(start + len + CRLF.len(), 0);
                reader.read_exact(&mut frame[start..])?;
            }
        }
    }

    match decode_reply(&frame)? {
        Some((reply, _)) => Ok(reply),
        None => Err(EmberError::Protocol(format!(
            "Truncated reply: {:?}",
            String::from_utf8_lossy(&frame)
        ))),
    }
}
