//! Command definitions
//!
//! Tokenizes raw lines and turns them into typed commands.

use thiserror::Error;

/// A tokenized request line: upper-cased verb plus positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub verb: String,
    pub args: Vec<Vec<u8>>,
}

/// Split a raw line into a [`Request`]
///
/// Line terminators are whitespace to the tokenizer, so `\r\n`, `\n` and a
/// missing terminator all parse the same. Returns `None` for a line with no
/// tokens.
pub fn parse_line(raw: &[u8]) -> Option<Request> {
    let mut tokens = raw
        .split(|b| b.is_ascii_whitespace())
        .filter(|token| !token.is_empty());

    let verb = String::from_utf8_lossy(tokens.next()?).to_ascii_uppercase();
    let args = tokens.map(<[u8]>::to_vec).collect();

    Some(Request { verb, args })
}

/// A validated command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Upsert a key
    Set { key: Vec<u8>, value: Vec<u8> },

    /// Get a value by key
    Get { key: Vec<u8> },

    /// Delete one or more keys
    Del { keys: Vec<Vec<u8>> },

    /// Check whether a key is present
    Exists { key: Vec<u8> },

    /// Health check, optionally echoing a message
    Ping { message: Option<Vec<u8>> },

    /// Close the connection after replying
    Quit,
}

/// Why a request could not become a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("unknown command '{0}'")]
    Unknown(String),
}

impl Command {
    /// Check arity and build the typed command
    pub fn from_request(request: Request) -> Result<Command, CommandError> {
        let Request { verb, args } = request;

        match verb.as_str() {
            "SET" => {
                let [key, value] = exact::<2>(&verb, args)?;
                Ok(Command::Set { key, value })
            }
            "GET" => {
                let [key] = exact::<1>(&verb, args)?;
                Ok(Command::Get { key })
            }
            "DEL" => {
                if args.is_empty() {
                    return Err(CommandError::WrongArity(verb.clone()));
                }
                Ok(Command::Del { keys: args })
            }
            "EXISTS" => {
                let [key] = exact::<1>(&verb, args)?;
                Ok(Command::Exists { key })
            }
            "PING" => match args.len() {
                0 => Ok(Command::Ping { message: None }),
                1 => Ok(Command::Ping {
                    message: args.into_iter().next(),
                }),
                _ => Err(CommandError::WrongArity(verb.clone())),
            },
            "QUIT" => {
                let [] = exact::<0>(&verb, args)?;
                Ok(Command::Quit)
            }
            _ => Err(CommandError::Unknown(verb.clone())),
        }
    }

    /// Upper-case verb of this command
    pub fn name(&self) -> &'static str {
        match self {
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
            Command::Del { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::Ping { .. } => "PING",
            Command::Quit => "QUIT",
        }
    }
}

fn exact<const N: usize>(verb: &str, args: Vec<Vec<u8>>) -> Result<[Vec<u8>; N], CommandError> {
    <[Vec<u8>; N]>::try_from(args).map_err(|_| CommandError::WrongArity(verb.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(line: &str) -> Request {
        parse_line(line.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_uppercases_verb_only() {
        let req = request("set Foo Bar\r\n");
        assert_eq!(req.verb, "SET");
        assert_eq!(req.args, vec![b"Foo".to_vec(), b"Bar".to_vec()]);
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        let req = request("  GET \t  key   \n");
        assert_eq!(req.verb, "GET");
        assert_eq!(req.args, vec![b"key".to_vec()]);
    }

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(parse_line(b"\r\n"), None);
        assert_eq!(parse_line(b"   \n"), None);
        assert_eq!(parse_line(b""), None);
    }

    #[test]
    fn test_arity_checks() {
        assert_eq!(
            Command::from_request(request("SET a")),
            Err(CommandError::WrongArity("SET".to_string()))
        );
        assert_eq!(
            Command::from_request(request("GET a b")),
            Err(CommandError::WrongArity("GET".to_string()))
        );
        assert_eq!(
            Command::from_request(request("DEL")),
            Err(CommandError::WrongArity("DEL".to_string()))
        );
        assert_eq!(
            Command::from_request(request("PING a b")),
            Err(CommandError::WrongArity("PING".to_string()))
        );
        assert_eq!(
            Command::from_request(request("QUIT now")),
            Err(CommandError::WrongArity("QUIT".to_string()))
        );
    }

    #[test]
    fn test_unknown_verb_is_named() {
        let err = Command::from_request(request("foo bar")).unwrap_err();
        assert_eq!(err.to_string(), "unknown command 'FOO'");
    }

    #[test]
    fn test_del_keeps_all_keys() {
        let cmd = Command::from_request(request("DEL a b c")).unwrap();
        assert_eq!(
            cmd,
            Command::Del {
                keys: vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]
            }
        );
        assert_eq!(cmd.name(), "DEL");
    }
}
