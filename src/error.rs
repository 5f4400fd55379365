//! Error types for arena-supervisor.
//!
//! [`AgentError`] covers everything that can go wrong while talking to the
//! inference endpoint or orchestrating agents. [`CommandError`] covers CLI
//! failures. [`Error`] is the umbrella type returned by command handlers.

use std::time::Duration;

use thiserror::Error;

/// Result alias used by command handlers.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the binary and command layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent or inference failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O failure (reading form files, writing config).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete.
    #[error("command failed: {0}")]
    ExecutionFailed(String),

    /// Output could not be rendered in the requested format.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),

    /// A required argument or environment variable is missing.
    #[error("missing input: {0}")]
    MissingInput(String),
}

/// Errors from the inference client and the orchestration layer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The deadline for one remote call elapsed before it completed.
    #[error("inference call timed out after {}s", timeout.as_secs())]
    Timeout {
        /// Deadline that was exceeded.
        timeout: Duration,
    },

    /// The inference endpoint answered with a non-2xx status.
    #[error("inference endpoint returned HTTP {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A 2xx response carried no extractable answer text.
    #[error("inference endpoint returned no answer text")]
    EmptyResponse,

    /// Connection, TLS, or body decoding failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error description.
        message: String,
    },

    /// AI-assisted routing produced output that is not a usable strategy.
    #[error("routing decision could not be parsed: {message}")]
    RoutingParse {
        /// What was wrong with the reply.
        message: String,
        /// Raw reply content.
        content: String,
    },

    /// The secondary synthesis call failed.
    #[error("response synthesis failed: {message}")]
    Synthesis {
        /// Error description.
        message: String,
    },

    /// Configuration or roster is invalid.
    #[error("configuration error: {message}")]
    Config {
        /// Error description.
        message: String,
    },

    /// Caller supplied malformed input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Error description.
        message: String,
    },
}

impl AgentError {
    /// Whether this error is a deadline expiry (eligible for escalation).
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the transient retry budget applies to this error.
    ///
    /// Timeouts are excluded: they belong to the escalator.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. } | Self::Transport { .. } | Self::EmptyResponse
        )
    }
}

/// Absorbs a soft failure, substituting a fallback value.
///
/// Used where an optional enhancement (AI routing, AI synthesis) fails and a
/// deterministic result must be used instead. The failure is logged, never
/// propagated.
pub fn absorb<T>(
    result: std::result::Result<T, AgentError>,
    what: &str,
    fallback: impl FnOnce() -> T,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "{what} failed, using fallback");
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_not_transient() {
        let err = AgentError::Timeout {
            timeout: Duration::from_secs(30),
        };
        assert!(err.is_timeout());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_upstream_is_transient() {
        let err = AgentError::Upstream {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(err.is_transient());
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_absorb_substitutes_fallback() {
        let failed: std::result::Result<u32, AgentError> = Err(AgentError::Synthesis {
            message: "boom".to_string(),
        });
        assert_eq!(absorb(failed, "synthesis", || 7), 7);
        assert_eq!(absorb(Ok(3), "synthesis", || 7), 3);
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = AgentError::EmptyResponse.into();
        assert!(matches!(err, Error::Agent(AgentError::EmptyResponse)));
        let err: Error = CommandError::MissingInput("token".to_string()).into();
        assert!(err.to_string().contains("token"));
    }
}
