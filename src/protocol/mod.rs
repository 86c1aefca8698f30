//! Protocol Module
//!
//! Defines the line-oriented text protocol spoken with clients.
//!
//! ## Request Format
//! ```text
//! VERB arg1 arg2 ...\r\n
//! ```
//! - Fields are separated by ASCII whitespace; `\r` before `\n` is optional
//! - The verb is case-insensitive and normalized to upper case
//! - Arguments cannot contain whitespace (requests are not binary safe)
//! - A blank line produces no reply at all
//!
//! ## Reply Format
//! | Shape         | Wire                       |
//! |---------------|----------------------------|
//! | Simple string | `+TEXT\r\n`                |
//! | Error         | `-ERR message\r\n`         |
//! | Integer       | `:N\r\n`                   |
//! | Bulk string   | `$LEN\r\n<LEN bytes>\r\n`  |
//! | Null bulk     | `$-1\r\n`                  |
//!
//! ### Commands
//! - `SET key value`   -> `+OK`
//! - `GET key`         -> bulk or null bulk
//! - `DEL key [key..]` -> integer (keys removed)
//! - `EXISTS key`      -> integer 0/1
//! - `PING [message]`  -> `+PONG` or the message as bulk
//! - `QUIT`            -> `+OK`, then the server closes the connection

mod command;
mod reply;
mod codec;
mod handler;

pub use command::{parse_line, Command, CommandError, Request};
pub use reply::Reply;
pub use codec::{
    decode_reply, encode_reply, encode_request, read_reply, write_request, CRLF, MAX_BULK_LEN,
};
pub use handler::CommandHandler;
