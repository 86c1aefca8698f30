//! Reply definitions
//!
//! Represents replies sent to clients.

use std::fmt;

use super::CommandError;

/// A reply in one of the five wire shapes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+TEXT`
    Simple(String),

    /// `-TEXT`, where TEXT starts with the error kind (`ERR ...`)
    Error(String),

    /// `:N`
    Integer(i64),

    /// `$LEN` followed by the bytes
    Bulk(Vec<u8>),

    /// `$-1`
    Null,
}

impl Reply {
    /// `+OK`
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    /// `+PONG`
    pub fn pong() -> Self {
        Reply::Simple("PONG".to_string())
    }

    /// `-ERR <message>`
    pub fn error(message: impl fmt::Display) -> Self {
        Reply::Error(format!("ERR {}", message))
    }

    /// Integer reply for a boolean, `:1` or `:0`
    pub fn from_bool(value: bool) -> Self {
        Reply::Integer(i64::from(value))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::error(err)
    }
}

/// Renders the way redis-cli prints replies
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Simple(text) => write!(f, "{}", text),
            Reply::Error(text) => write!(f, "(error) {}", text),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(bytes) => write!(f, "\"{}\"", String::from_utf8_lossy(bytes)),
            Reply::Null => write!(f, "(nil)"),
        }
    }
}
