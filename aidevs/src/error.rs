//! Error types shared by every component.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration value is missing or empty.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport failure or non-2xx status. `status` is `None` when no
    /// response was received at all (DNS, connect, timeout).
    #[error("network error{}: {reason}", status_suffix(.status))]
    Network { status: Option<u16>, reason: String },

    /// The model provider failed or answered with something unusable.
    /// `status` carries the upstream HTTP status when there was one.
    #[error("provider error{}: {reason}", status_suffix(.status))]
    Provider { status: Option<u16>, reason: String },

    /// A response did not have the expected shape or marker.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("gave up after {attempts} consecutive failures: {last}")]
    RetriesExhausted { attempts: u32, last: Box<Error> },
}

impl Error {
    pub fn network(status: Option<u16>, reason: impl Into<String>) -> Self {
        Error::Network {
            status,
            reason: reason.into(),
        }
    }

    pub fn provider(reason: impl Into<String>) -> Self {
        Error::Provider {
            status: None,
            reason: reason.into(),
        }
    }

    /// Wraps a failed provider call, keeping the HTTP status of the cause.
    pub fn provider_call(context: &str, cause: Error) -> Self {
        let status = match &cause {
            Error::Network { status, .. } | Error::Provider { status, .. } => *status,
            _ => None,
        };
        Error::Provider {
            status,
            reason: format!("{}: {}", context, cause),
        }
    }

    /// Failures that cannot go away by retrying the same call.
    pub fn is_permanent(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidInput(_) => true,
            Error::Network {
                status: Some(401 | 403),
                ..
            }
            | Error::Provider {
                status: Some(401 | 403),
                ..
            } => true,
            Error::RetriesExhausted { .. } => true,
            _ => false,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_permanent_failures() {
        assert!(Error::Config("URL_REPORT".into()).is_permanent());
        assert!(Error::network(Some(401), "unauthorized").is_permanent());
        assert!(!Error::network(Some(503), "unavailable").is_permanent());
        assert!(!Error::network(None, "connection refused").is_permanent());
        assert!(!Error::Parse("no marker".into()).is_permanent());
    }

    #[test]
    fn provider_call_keeps_rejected_credentials_permanent() {
        let rejected = Error::provider_call("chat completion", Error::network(Some(401), "Unauthorized"));
        assert!(matches!(rejected, Error::Provider { status: Some(401), .. }));
        assert!(rejected.is_permanent());

        let throttled = Error::provider_call("chat completion", Error::network(Some(429), "slow down"));
        assert!(!throttled.is_permanent());
        assert!(!Error::provider("empty answer").is_permanent());
        assert_eq!(
            Error::provider_call("embedding", Error::network(Some(403), "Forbidden")).to_string(),
            "provider error (403): embedding: network error (403): Forbidden"
        );
    }

    #[test]
    fn network_display_includes_status_when_known() {
        let with = Error::network(Some(500), "boom").to_string();
        let without = Error::network(None, "boom").to_string();
        assert_eq!(with, "network error (500): boom");
        assert_eq!(without, "network error: boom");
    }
}
