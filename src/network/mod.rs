//! Network Module
//!
//! The single point of I/O: a readiness-driven event loop plus the
//! per-connection buffering that turns byte streams into command lines.
//!
//! ## Architecture
//! - One thread, one `mio::Poll`
//! - Listener drained on every readiness event
//! - Each connection: inbound line buffer, outbound reply buffer
//! - Lines handed to an injected [`LineHandler`]; replies written in order

mod buffer;
mod connection;
mod server;

pub use buffer::{ConnectionBuffer, Lines};
pub use connection::ConnectionState;
pub use server::{Server, ServerHandle};

/// What the event loop should do with one processed line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Bytes to send back; empty means send nothing
    pub reply: Vec<u8>,

    /// Close the connection once the reply is out
    pub close: bool,
}

impl Outcome {
    /// Send `reply` and keep the connection open
    pub fn reply(reply: Vec<u8>) -> Self {
        Self { reply, close: false }
    }

    /// Send nothing
    pub fn silent() -> Self {
        Self::default()
    }

    /// Send `reply`, then close the connection
    pub fn close(reply: Vec<u8>) -> Self {
        Self { reply, close: true }
    }
}

impl From<Vec<u8>> for Outcome {
    fn from(reply: Vec<u8>) -> Self {
        Outcome::reply(reply)
    }
}

impl From<String> for Outcome {
    fn from(reply: String) -> Self {
        Outcome::reply(reply.into_bytes())
    }
}

/// Callback the event loop runs for every complete line
///
/// Implemented for any `FnMut(&[u8]) -> impl Into<Outcome>`, so a plain
/// closure returning the reply bytes works.
pub trait LineHandler {
    fn handle_line(&mut self, line: &[u8]) -> Outcome;
}

impl<F, O> LineHandler for F
where
    F: FnMut(&[u8]) -> O,
    O: Into<Outcome>,
{
    fn handle_line(&mut self, line: &[u8]) -> Outcome {
        self(line).into()
    }
}
