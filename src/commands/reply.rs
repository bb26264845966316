//! Console Replies
//!
//! Replies are rendered the way `redis-cli` shows RESP values, so the admin
//! console feels familiar:
//!
//! - Simple string: `"OK"`
//! - Error: `(error) ERR unknown command 'FOO'`
//! - Integer: `(integer) 1`
//! - Bulk string: the raw text

use bytes::Bytes;
use std::fmt;

/// A reply produced by the [`CommandHandler`](super::CommandHandler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Short status text such as `OK` or `PONG`
    Simple(String),

    /// A command failure
    Error(String),

    /// A signed integer
    Integer(i64),

    /// Arbitrary text, possibly spanning several lines
    Bulk(Bytes),
}

impl Reply {
    /// Creates a new simple string reply.
    pub fn simple(s: impl Into<String>) -> Self {
        Reply::Simple(s.into())
    }

    /// Creates a new error reply.
    pub fn error(s: impl Into<String>) -> Self {
        Reply::Error(s.into())
    }

    /// Creates a new integer reply.
    pub fn integer(n: i64) -> Self {
        Reply::Integer(n)
    }

    /// Creates a new bulk reply.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Reply::Bulk(data.into())
    }

    /// Common reply for successful operations
    pub fn ok() -> Self {
        Reply::simple("OK")
    }

    /// Common reply for PING
    pub fn pong() -> Self {
        Reply::simple("PONG")
    }

    /// Returns `true` if this is an error reply.
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Simple(s) => write!(f, "\"{}\"", s),
            Reply::Error(s) => write!(f, "(error) {}", s),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "{}", s.trim_end()),
                Err(_) => write!(f, "(binary data, {} bytes)", data.len()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Reply::ok().to_string(), "\"OK\"");
        assert_eq!(Reply::integer(3).to_string(), "(integer) 3");
        assert_eq!(Reply::error("ERR nope").to_string(), "(error) ERR nope");
        assert_eq!(Reply::bulk("a:1\r\nb:2\r\n").to_string(), "a:1\r\nb:2");
    }

    #[test]
    fn test_simple_constructors() {
        assert_eq!(Reply::ok(), Reply::Simple("OK".to_string()));
        assert_eq!(Reply::pong(), Reply::simple("PONG"));
        assert_eq!(Reply::simple("QUEUED").to_string(), "\"QUEUED\"");
    }

    #[test]
    fn test_binary_bulk() {
        let reply = Reply::bulk(Bytes::from_static(&[0xff, 0xfe]));
        assert_eq!(reply.to_string(), "(binary data, 2 bytes)");
    }

    #[test]
    fn test_is_error() {
        assert!(Reply::error("ERR").is_error());
        assert!(!Reply::pong().is_error());
    }
}
