//! Command Handler
//!
//! Routes commands to the store and formats replies.

use std::sync::Arc;

use crate::network::Outcome;
use crate::store::Store;
use super::{encode_reply, parse_line, Command, Reply};

/// Dispatch unit between the event loop and the store
///
/// Holds a shared handle to the store; it never sees connections.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    store: Arc<Store>,
}

impl CommandHandler {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// The store commands run against
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Execute a command and return a reply
    pub fn execute(&self, command: Command) -> Reply {
        match command {
            Command::Set { key, value } => {
                self.store.set(key, value);
                Reply::ok()
            }
            Command::Get { key } => match self.store.get(&key) {
                Some(value) => Reply::Bulk(value),
                None => Reply::Null,
            },
            Command::Del { keys } => {
                let removed = keys.iter().filter(|key| self.store.del(key)).count();
                Reply::Integer(removed as i64)
            }
            Command::Exists { key } => Reply::from_bool(self.store.exists(&key)),
            Command::Ping { message: None } => Reply::pong(),
            Command::Ping { message: Some(message) } => Reply::Bulk(message),
            Command::Quit => Reply::ok(),
        }
    }

    /// Process one raw line into the bytes to send back
    ///
    /// A blank line yields an empty reply, which the event loop does not send.
    pub fn handle_line(&self, raw: &[u8]) -> Outcome {
        let Some(request) = parse_line(raw) else {
            return Outcome::silent();
        };

        tracing::trace!(verb = %request.verb, args = request.args.len(), "Dispatching");

        match Command::from_request(request) {
            Ok(command) => {
                let close = command == Command::Quit;
                let reply = encode_reply(&self.execute(command));
                if close {
                    Outcome::close(reply)
                } else {
                    Outcome::reply(reply)
                }
            }
            Err(err) => {
                tracing::debug!("Rejected request: {}", err);
                Outcome::reply(encode_reply(&Reply::from(err)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> CommandHandler {
        CommandHandler::new(Arc::new(Store::new()))
    }

    #[test]
    fn test_blank_line_is_silent() {
        let outcome = handler().handle_line(b"\r\n");
        assert!(outcome.reply.is_empty());
        assert!(!outcome.close);
    }

    #[test]
    fn test_quit_requests_close() {
        let outcome = handler().handle_line(b"quit\r\n");
        assert_eq!(outcome.reply, b"+OK\r\n");
        assert!(outcome.close);
    }

    #[test]
    fn test_del_counts_only_present_keys() {
        let handler = handler();
        handler.store().set("a", "1");
        handler.store().set("c", "3");

        let reply = handler.execute(Command::Del {
            keys: vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"a".to_vec()],
        });
        assert_eq!(reply, Reply::Integer(2));
    }
}
