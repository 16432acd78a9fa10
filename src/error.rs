use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Structured error type for the console. Every failure a command can hit is
/// one of these; `registry::execute` turns them into error transcript entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
#[serde(tag = "code", content = "detail")]
pub enum ConsoleError {
    /// No registered command has this name.
    NotFound { name: String },
    /// A positional argument that must be numeric did not parse as a finite number.
    InvalidNumber { token: String },
    /// Arguments parsed but violate a constraint.
    Validation { message: String },
    /// A required argument is missing.
    Usage { message: String },
    /// A caller-side timeout fired before the host replied.
    Timeout { request: String, waited_ms: u64 },
    /// The host answered with an `error` reply.
    Host { context: String, message: String },
    /// The bus was torn down while a request was pending.
    BridgeClosed,
    /// A line on the host transport that is not a valid message.
    Protocol { message: String },
    Io { message: String },
    Settings { message: String },
}

impl ConsoleError {
    pub fn validation(message: impl Into<String>) -> Self {
        ConsoleError::Validation {
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        ConsoleError::Usage {
            message: message.into(),
        }
    }

    pub fn timeout(request: &str, waited: Duration) -> Self {
        ConsoleError::Timeout {
            request: request.to_string(),
            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::NotFound { name } => write!(f, "Command \"{name}\" not found"),
            ConsoleError::InvalidNumber { token } => write!(f, "Invalid number: {token}"),
            ConsoleError::Validation { message } | ConsoleError::Usage { message } => {
                write!(f, "{message}")
            }
            ConsoleError::Timeout { request, waited_ms } => {
                write!(f, "No reply to {request} within {waited_ms}ms")
            }
            ConsoleError::Host { message, .. } => write!(f, "{message}"),
            ConsoleError::BridgeClosed => write!(f, "Host bridge closed"),
            ConsoleError::Protocol { message } => write!(f, "Malformed message: {message}"),
            ConsoleError::Io { message } => write!(f, "I/O error: {message}"),
            ConsoleError::Settings { message } => write!(f, "Settings error: {message}"),
        }
    }
}

impl std::error::Error for ConsoleError {}

impl From<std::io::Error> for ConsoleError {
    fn from(e: std::io::Error) -> Self {
        ConsoleError::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        ConsoleError::Protocol {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_quotes_the_name() {
        let e = ConsoleError::NotFound { name: "foo".into() };
        assert_eq!(e.to_string(), "Command \"foo\" not found");
    }

    #[test]
    fn timeout_reports_milliseconds() {
        let e = ConsoleError::timeout("get-analytics", Duration::from_secs(2));
        assert_eq!(e.to_string(), "No reply to get-analytics within 2000ms");
    }

    #[test]
    fn host_error_shows_host_message_only() {
        let e = ConsoleError::Host {
            context: "creating shape".into(),
            message: "Error creating shape: boom".into(),
        };
        assert_eq!(e.to_string(), "Error creating shape: boom");
    }
}
