//! TCP Server
//!
//! Single-threaded, readiness-driven event loop built on `mio`.
//!
//! ## Loop
//! 1. Block in `poll` until something is ready (no timeout)
//! 2. Listener readable: accept until would-block
//! 3. Client readable: alternate reading and dispatching complete lines
//!    until the socket would block, queueing each reply
//! 4. Client writable: flush queued replies, then resume reading
//! 5. Client error/hangup, zero-length read or I/O failure: close it
//!
//! A connection with `max_outbound_bytes` of replies queued stops reading
//! until the peer drains them.
//!
//! Per-connection failures never leave this module; only setup failures
//! and a broken poller are returned to the caller.

use std::collections::HashMap;
use std::io::{self, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mio::event::Event;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use socket2::{Domain, Protocol, Socket, Type};

use crate::config::Config;
use crate::error::{EmberError, Result};
use super::connection::{Connection, ConnectionState, ReadStatus};
use super::LineHandler;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

const MAX_CLIENTS_REPLY: &[u8] = b"-ERR max number of clients reached\r\n";
const OVERFLOW_REPLY: &[u8] = b"-ERR Protocol error: too big inline request\r\n";

/// Why a connection was closed
#[derive(Debug)]
enum CloseReason {
    PeerClosed,
    Hangup,
    Requested,
    ReadFailed(io::Error),
    WriteFailed(io::Error),
    Reregister(io::Error),
}

impl CloseReason {
    /// Operation that failed, for closes caused by an I/O error
    fn failure(&self) -> Option<(&'static str, &io::Error)> {
        match self {
            CloseReason::ReadFailed(e) => Some(("read", e)),
            CloseReason::WriteFailed(e) => Some(("write", e)),
            CloseReason::Reregister(e) => Some(("poller reregister", e)),
            CloseReason::PeerClosed | CloseReason::Hangup | CloseReason::Requested => None,
        }
    }
}

enum Verdict {
    Keep,
    Close(CloseReason),
}

/// Event loop owning the listener and every client connection
///
/// `H` is the line-processing callback; it runs on the loop thread, one
/// line at a time.
pub struct Server<H> {
    config: Config,
    poll: Poll,
    listener: TcpListener,
    local_addr: SocketAddr,
    waker: Arc<Waker>,
    shutdown: Arc<AtomicBool>,
    connections: HashMap<Token, Connection>,
    next_token: usize,
    handler: H,
}

/// Cloneable handle for stopping a running [`Server`] from another thread
#[derive(Debug, Clone)]
pub struct ServerHandle {
    waker: Arc<Waker>,
    shutdown: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl ServerHandle {
    /// Ask the loop to close every connection and return from `run`
    pub fn shutdown(&self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        self.waker.wake()?;
        Ok(())
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl<H: LineHandler> Server<H> {
    /// Create the listener and poller
    ///
    /// Every failure here is fatal: bad config, address resolution, bind,
    /// listen, or poller creation.
    pub fn bind(config: Config, handler: H) -> Result<Self> {
        config.validate()?;

        let addr = resolve(&config.listen_addr())?;
        let mut listener = bind_listener(addr, config.backlog)
            .map_err(|e| EmberError::Network(format!("Failed to listen on {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);

        tracing::info!("Listening on {}", local_addr);

        Ok(Self {
            config,
            poll,
            listener,
            local_addr,
            waker,
            shutdown: Arc::new(AtomicBool::new(false)),
            connections: HashMap::new(),
            next_token: FIRST_CONNECTION,
            handler,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for shutting the loop down
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            waker: Arc::clone(&self.waker),
            shutdown: Arc::clone(&self.shutdown),
            local_addr: self.local_addr,
        }
    }

    /// Run the event loop (blocking)
    ///
    /// Returns `Ok(())` after a [`ServerHandle::shutdown`], or an error if
    /// the poller itself fails.
    pub fn run(&mut self) -> Result<()> {
        let mut events = Events::with_capacity(self.config.events_capacity);
        let mut chunk = vec![0u8; self.config.read_chunk_size];

        loop {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_pending(),
                    WAKER => {
                        if self.shutdown.load(Ordering::Acquire) {
                            tracing::info!(
                                "Shutdown requested, closing {} connections",
                                self.connections.len()
                            );
                            self.close_all();
                            return Ok(());
                        }
                    }
                    token => self.connection_event(token, event, &mut chunk),
                }
            }
        }
    }

    // =========================================================================
    // Accepting
    // =========================================================================

    /// Accept every pending connection
    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer_addr)) => self.admit(stream, peer_addr),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if is_per_candidate_error(&e) => {
                    tracing::warn!("Skipping connection that failed during accept: {}", e);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    break;
                }
            }
        }
    }

    fn admit(&mut self, mut stream: TcpStream, peer_addr: SocketAddr) {
        if self.connections.len() >= self.config.max_connections {
            tracing::warn!(
                "Rejecting {}: connection limit of {} reached",
                peer_addr,
                self.config.max_connections
            );
            let _ = stream.write(MAX_CLIENTS_REPLY);
            return;
        }

        let token = self.next_token();
        let mut connection = Connection::new(stream, peer_addr, token);

        if let Err(e) = connection.register(self.poll.registry()) {
            tracing::warn!("Failed to register {}: {}", peer_addr, e);
            return;
        }

        tracing::debug!("Connection established from {} ({:?})", peer_addr, token);
        self.connections.insert(token, connection);
    }

    fn next_token(&mut self) -> Token {
        loop {
            let token = Token(self.next_token);
            self.next_token = if self.next_token == usize::MAX - 1 {
                FIRST_CONNECTION
            } else {
                self.next_token + 1
            };

            if !self.connections.contains_key(&token) {
                return token;
            }
        }
    }

    // =========================================================================
    // Client I/O
    // =========================================================================

    fn connection_event(&mut self, token: Token, event: &Event, chunk: &mut [u8]) {
        // Already closed earlier in this batch
        let Some(connection) = self.connections.get_mut(&token) else {
            return;
        };

        let verdict = match service(connection, &mut self.handler, event, chunk, &self.config) {
            Verdict::Keep => match connection.update_interest(self.poll.registry()) {
                Ok(()) => Verdict::Keep,
                Err(e) => Verdict::Close(CloseReason::Reregister(e)),
            },
            close => close,
        };

        if let Verdict::Close(reason) = verdict {
            self.close_connection(token, reason);
        }
    }

    fn close_connection(&mut self, token: Token, reason: CloseReason) {
        let Some(mut connection) = self.connections.remove(&token) else {
            return;
        };

        debug_assert_eq!(connection.state(), ConnectionState::Open);

        match reason.failure() {
            Some((op, e)) => {
                tracing::warn!("Closing {} after {} failure: {}", connection.peer_addr(), op, e);
            }
            None => {
                tracing::debug!("Client {} disconnected ({:?})", connection.peer_addr(), reason);
            }
        }

        connection.close(self.poll.registry());
    }

    fn close_all(&mut self) {
        for (_, mut connection) in self.connections.drain() {
            connection.close(self.poll.registry());
        }
    }
}

/// Handle one readiness event for one connection
fn service<H: LineHandler>(
    connection: &mut Connection,
    handler: &mut H,
    event: &Event,
    chunk: &mut [u8],
    config: &Config,
) -> Verdict {
    if event.is_error() {
        return Verdict::Close(CloseReason::Hangup);
    }

    if event.is_writable() {
        if let Err(e) = connection.flush() {
            return Verdict::Close(CloseReason::WriteFailed(e));
        }
    }

    if let Err(reason) = pump(connection, handler, chunk, config) {
        return Verdict::Close(reason);
    }

    if connection.is_close_requested() && !connection.wants_write() {
        return Verdict::Close(CloseReason::Requested);
    }

    if event.is_read_closed() && event.is_write_closed() {
        return Verdict::Close(CloseReason::Hangup);
    }

    Verdict::Keep
}

/// Alternate dispatching and reading until the socket would block or the
/// peer has to read replies before more input is taken
///
/// Runs on writable events too: a connection that stopped reading for
/// backpressure gets no further readable edge for data already queued.
fn pump<H: LineHandler>(
    connection: &mut Connection,
    handler: &mut H,
    chunk: &mut [u8],
    config: &Config,
) -> std::result::Result<(), CloseReason> {
    let mut drained = false;

    loop {
        if connection.is_close_requested() {
            // Unread input would turn the final close into a reset
            return connection
                .discard_available(chunk)
                .map(|_| ())
                .map_err(CloseReason::ReadFailed);
        }

        connection
            .dispatch(handler, config.max_outbound_bytes)
            .map_err(CloseReason::WriteFailed)?;

        if connection.is_close_requested() {
            continue;
        }
        if drained || connection.is_backed_up(config.max_outbound_bytes) {
            return Ok(());
        }

        match connection.read_available(chunk, config.max_buffered_bytes) {
            Ok(ReadStatus::Drained) => drained = true,
            Ok(ReadStatus::Full) => {}
            Ok(ReadStatus::PeerClosed) => return Err(CloseReason::PeerClosed),
            Ok(ReadStatus::Overflow) => {
                tracing::debug!(
                    "Client {} sent more than {} bytes without a newline",
                    connection.peer_addr(),
                    config.max_buffered_bytes
                );
                connection.reject(OVERFLOW_REPLY);
                connection.flush().map_err(CloseReason::WriteFailed)?;
            }
            Err(e) => return Err(CloseReason::ReadFailed(e)),
        }
    }
}

/// Accept failures that concern only the candidate connection
fn is_per_candidate_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

fn resolve(addr: &str) -> Result<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(|e| EmberError::Network(format!("Cannot resolve {}: {}", addr, e)))?
        .next()
        .ok_or_else(|| EmberError::Network(format!("{} did not resolve to any address", addr)))
}

/// Non-blocking listener with SO_REUSEADDR and an explicit backlog
fn bind_listener(addr: SocketAddr, backlog: i32) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    Ok(TcpListener::from_std(socket.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_reason_names_failing_operation() {
        let err = || io::Error::from(io::ErrorKind::Other);

        assert_eq!(CloseReason::ReadFailed(err()).failure().map(|f| f.0), Some("read"));
        assert_eq!(CloseReason::WriteFailed(err()).failure().map(|f| f.0), Some("write"));
        assert_eq!(
            CloseReason::Reregister(err()).failure().map(|f| f.0),
            Some("poller reregister")
        );
        assert!(CloseReason::Requested.failure().is_none());
        assert!(CloseReason::PeerClosed.failure().is_none());
    }

    #[test]
    fn test_per_candidate_accept_errors() {
        assert!(is_per_candidate_error(&io::ErrorKind::ConnectionAborted.into()));
        assert!(is_per_candidate_error(&io::ErrorKind::Interrupted.into()));
        assert!(!is_per_candidate_error(&io::ErrorKind::Other.into()));
    }
}
