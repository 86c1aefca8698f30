//! Connection State
//!
//! Per-client state owned by the event loop: the socket, the inbound line
//! buffer and the outbound reply buffer.

use std::io::{self, Read, Write};
use std::net::SocketAddr;

use bytes::{Buf, BytesMut};
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

use super::buffer::ConnectionBuffer;
use super::LineHandler;

/// Lifecycle of a client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted, not yet registered with the poller
    Connecting,

    /// Registered and serving commands
    Open,

    /// Deregistered; resources released
    Closed,
}

/// Result of draining a readable socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadStatus {
    /// Read until would-block
    Drained,

    /// Zero-length read
    PeerClosed,

    /// Buffered input reached the bound; dispatch before reading more
    Full,

    /// Unterminated input grew past the configured bound
    Overflow,
}

/// A single client connection
pub(crate) struct Connection {
    /// Non-blocking socket
    stream: TcpStream,

    /// Poller token for this connection
    token: Token,

    /// Peer address for logging
    peer_addr: SocketAddr,

    /// Bytes received but not yet framed into lines
    inbound: ConnectionBuffer,

    /// Reply bytes not yet accepted by the socket
    outbound: BytesMut,

    /// Interest currently registered with the poller
    interest: Interest,

    state: ConnectionState,

    /// Set once a handler asked for the connection to be closed
    close_requested: bool,
}

impl Connection {
    pub fn new(stream: TcpStream, peer_addr: SocketAddr, token: Token) -> Self {
        Self {
            stream,
            token,
            peer_addr,
            inbound: ConnectionBuffer::new(),
            outbound: BytesMut::new(),
            interest: Interest::READABLE,
            state: ConnectionState::Connecting,
            close_requested: false,
        }
    }

    /// Register for read readiness (CONNECTING -> OPEN)
    pub fn register(&mut self, registry: &Registry) -> io::Result<()> {
        // Disable Nagle's algorithm for low latency
        if let Err(e) = self.stream.set_nodelay(true) {
            tracing::debug!("Could not set TCP_NODELAY for {}: {}", self.peer_addr, e);
        }

        registry.register(&mut self.stream, self.token, self.interest)?;
        self.state = ConnectionState::Open;
        Ok(())
    }

    /// Read until the socket would block, appending to the inbound buffer
    ///
    /// Expects every complete line to have been dispatched already, so the
    /// whole buffer is one unterminated line when this is entered. Stops as
    /// soon as `max_buffered` bytes are held.
    pub fn read_available(
        &mut self,
        chunk: &mut [u8],
        max_buffered: usize,
    ) -> io::Result<ReadStatus> {
        if self.inbound.partial_len() > max_buffered {
            return Ok(ReadStatus::Overflow);
        }

        loop {
            match self.stream.read(chunk) {
                Ok(0) => return Ok(ReadStatus::PeerClosed),
                Ok(n) => {
                    self.inbound.extend(&chunk[..n]);
                    if self.inbound.len() >= max_buffered {
                        return Ok(ReadStatus::Full);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadStatus::Drained),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Read and drop input while a close is pending
    pub fn discard_available(&mut self, chunk: &mut [u8]) -> io::Result<ReadStatus> {
        loop {
            match self.stream.read(chunk) {
                Ok(0) => return Ok(ReadStatus::PeerClosed),
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadStatus::Drained),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Run buffered lines through `handler`, in order
    ///
    /// Each reply is queued and flushed before the next line is processed.
    /// Stops once a handler requests a close, or while `max_outbound` reply
    /// bytes are waiting for the peer to read them.
    pub fn dispatch<H: LineHandler + ?Sized>(
        &mut self,
        handler: &mut H,
        max_outbound: usize,
    ) -> io::Result<()> {
        while !self.close_requested && !self.is_backed_up(max_outbound) {
            let Some(line) = self.inbound.next_line() else {
                break;
            };

            let outcome = handler.handle_line(&line);
            if !outcome.reply.is_empty() {
                self.queue(&outcome.reply);
                self.flush()?;
            }
            if outcome.close {
                tracing::trace!("Close requested by {}", self.peer_addr);
                self.close_requested = true;
            }
        }
        Ok(())
    }

    /// Queue a final reply behind any pending ones and drop unread input
    pub fn reject(&mut self, reply: &[u8]) {
        self.inbound.clear();
        self.queue(reply);
        self.close_requested = true;
    }

    /// Append bytes to the outbound buffer without writing
    pub fn queue(&mut self, bytes: &[u8]) {
        self.outbound.extend_from_slice(bytes);
    }

    /// Write queued bytes until done or the socket would block
    ///
    /// Returns `true` when the outbound buffer is empty.
    pub fn flush(&mut self) -> io::Result<bool> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => self.outbound.advance(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    /// Ask for write readiness only while replies are pending
    pub fn update_interest(&mut self, registry: &Registry) -> io::Result<()> {
        let wanted = if self.wants_write() {
            Interest::READABLE | Interest::WRITABLE
        } else {
            Interest::READABLE
        };

        if wanted != self.interest {
            registry.reregister(&mut self.stream, self.token, wanted)?;
            self.interest = wanted;
        }
        Ok(())
    }

    /// Deregister and release the socket (OPEN -> CLOSED)
    pub fn close(&mut self, registry: &Registry) {
        if self.state == ConnectionState::Open {
            if let Err(e) = registry.deregister(&mut self.stream) {
                tracing::debug!("Deregister failed for {}: {}", self.peer_addr, e);
            }
        }
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
        self.inbound.clear();
        self.outbound.clear();
        self.state = ConnectionState::Closed;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn wants_write(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// At least `limit` reply bytes are still queued
    pub fn is_backed_up(&self, limit: usize) -> bool {
        self.outbound.len() >= limit
    }

    pub fn is_close_requested(&self) -> bool {
        self.close_requested
    }
}
