//! Typed failures surfaced by the resolver.
//!
//! Each kind is distinct so the caller can map it to its own message and
//! exit status. `ConditionsNotMet` is an expected "not ready yet" outcome
//! rather than a crash.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("No image matching {pattern} found at {url}")]
    NotFound { url: String, pattern: String },

    #[error("Image conditions not met after {attempts} attempt(s): {}", .unmet.join(", "))]
    ConditionsNotMet { attempts: u32, unmet: Vec<String> },

    #[error("Checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    #[error("Signature verification failed for {filename}: {reason}")]
    SignatureVerification { filename: String, reason: String },

    #[error("Failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Image contains disallowed packages: {}", .0.join(", "))]
    DisallowedPackages(Vec<String>),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    /// Wrap a transport failure for `url`.
    pub fn network(url: &str, err: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }

    /// Create a parse error with context for diagnostics.
    pub fn parse(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Process exit status for this failure; never 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConditionsNotMet { .. } => 2,
            Self::Network { .. } => 3,
            Self::NotFound { .. } => 4,
            Self::ChecksumMismatch { .. } => 5,
            Self::SignatureVerification { .. } => 6,
            Self::Parse { .. } => 7,
            Self::DisallowedPackages(_) => 8,
            Self::Io(_) => 9,
            Self::Config(_) => 10,
        }
    }

    /// True for the "image not ready yet" outcome of the condition poller.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::ConditionsNotMet { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn exit_codes_are_distinct_and_nonzero() {
        let errors = [
            ResolveError::network("u", "refused"),
            ResolveError::NotFound {
                url: "u".into(),
                pattern: "p".into(),
            },
            ResolveError::ConditionsNotMet {
                attempts: 1,
                unmet: vec![],
            },
            ResolveError::ChecksumMismatch {
                filename: "f".into(),
                expected: "a".into(),
                actual: "b".into(),
            },
            ResolveError::SignatureVerification {
                filename: "f".into(),
                reason: "r".into(),
            },
            ResolveError::parse("manifest", "bad"),
            ResolveError::DisallowedPackages(vec![]),
            ResolveError::Io(std::io::Error::other("disk")),
            ResolveError::Config("c".into()),
        ];

        let codes: HashSet<i32> = errors.iter().map(ResolveError::exit_code).collect();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn conditions_not_met_lists_unmet() {
        let err = ResolveError::ConditionsNotMet {
            attempts: 3,
            unmet: vec!["bash >= 5".into(), "image == 1.2".into()],
        };
        assert!(err.is_not_ready());
        assert_eq!(
            err.to_string(),
            "Image conditions not met after 3 attempt(s): bash >= 5, image == 1.2"
        );
    }
}
