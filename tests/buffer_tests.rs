//! Connection Buffer Tests
//!
//! Tests verify:
//! - Lines are cut at `\n`, terminator included
//! - Partial input stays buffered across chunks
//! - Several lines in one chunk come out in order
//! - Iteration is lazy and resumable

use emberkv::network::ConnectionBuffer;

fn collect(buffer: &mut ConnectionBuffer, chunk: &[u8]) -> Vec<Vec<u8>> {
    buffer.feed(chunk).map(|line| line.to_vec()).collect()
}

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_single_complete_line() {
    let mut buffer = ConnectionBuffer::new();

    let lines = collect(&mut buffer, b"SET foo bar\r\n");

    assert_eq!(lines, vec![b"SET foo bar\r\n".to_vec()]);
    assert!(buffer.is_empty());
}

#[test]
fn test_no_terminator_keeps_everything() {
    let mut buffer = ConnectionBuffer::new();

    let lines = collect(&mut buffer, b"SET a ");

    assert!(lines.is_empty());
    assert_eq!(buffer.pending(), b"SET a ");
    assert_eq!(buffer.partial_len(), 6);
}

#[test]
fn test_line_split_across_chunks() {
    let mut buffer = ConnectionBuffer::new();

    assert!(collect(&mut buffer, b"SET a ").is_empty());
    let lines = collect(&mut buffer, b"b\r\n");

    assert_eq!(lines, vec![b"SET a b\r\n".to_vec()]);
    assert!(buffer.is_empty());
}

#[test]
fn test_terminator_split_from_carriage_return() {
    let mut buffer = ConnectionBuffer::new();

    assert!(collect(&mut buffer, b"PING\r").is_empty());
    let lines = collect(&mut buffer, b"\n");

    assert_eq!(lines, vec![b"PING\r\n".to_vec()]);
}

#[test]
fn test_many_lines_in_one_chunk() {
    let mut buffer = ConnectionBuffer::new();

    let lines = collect(&mut buffer, b"SET a 1\r\nGET a\nDEL a\r\nEXI");

    assert_eq!(
        lines,
        vec![
            b"SET a 1\r\n".to_vec(),
            b"GET a\n".to_vec(),
            b"DEL a\r\n".to_vec(),
        ]
    );
    assert_eq!(buffer.pending(), b"EXI");
}

#[test]
fn test_empty_lines_are_still_lines() {
    let mut buffer = ConnectionBuffer::new();

    let lines = collect(&mut buffer, b"\r\n\n");

    assert_eq!(lines, vec![b"\r\n".to_vec(), b"\n".to_vec()]);
}

#[test]
fn test_one_byte_at_a_time() {
    let mut buffer = ConnectionBuffer::new();
    let input = b"GET key\r\nPING\r\n";
    let mut lines = Vec::new();

    for byte in input.iter() {
        lines.extend(collect(&mut buffer, std::slice::from_ref(byte)));
    }

    assert_eq!(lines, vec![b"GET key\r\n".to_vec(), b"PING\r\n".to_vec()]);
    assert!(buffer.is_empty());
}

// =============================================================================
// Laziness Tests
// =============================================================================

#[test]
fn test_lines_are_extracted_on_demand() {
    let mut buffer = ConnectionBuffer::new();
    buffer.extend(b"A\nB\nC\n");

    let first = buffer.lines().next().unwrap();
    assert_eq!(&first[..], b"A\n");
    assert_eq!(buffer.pending(), b"B\nC\n");

    let rest: Vec<_> = buffer.lines().map(|line| line.to_vec()).collect();
    assert_eq!(rest, vec![b"B\n".to_vec(), b"C\n".to_vec()]);
    assert!(buffer.lines().next().is_none());
}

#[test]
fn test_clear_discards_partial_input() {
    let mut buffer = ConnectionBuffer::with_capacity(64);
    buffer.extend(b"half a line");

    buffer.clear();

    assert!(buffer.is_empty());
    assert_eq!(buffer.partial_len(), 0);
    assert!(collect(&mut buffer, b"\n").len() == 1);
}
