use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum, including failures of the cryptographic
    /// primitives and of the operating system's randomness source.
    Internal,

    /// The user invoked the tool incorrectly, e.g. without a secret.
    User,

    /// The recipient public key the tool was built or configured with is
    /// unusable. This is a build or deployment defect, never something the
    /// person running the tool can fix by changing their input.
    Configuration,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// No secret (or an empty one) was supplied.
    MissingSecret,
    /// The recipient public key is not valid base64.
    PublicKeyEncoding,
    /// The recipient public key did not decode to exactly 32 bytes.
    PublicKeyLength,
    /// Base64 decoding of an armored payload failed.
    ArmoringDecode,
    /// The operating system could not provide randomness for the ephemeral key.
    EntropyUnavailable,
    /// The XSalsa20Poly1305 box failed to seal the plaintext.
    SealFailure,
    /// Writing the encrypted value to stdout failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct SealError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Any code consuming errors MUST
    /// handle the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl SealError {
    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }

    /// Whether repeating the operation with fresh randomness may succeed.
    ///
    /// Only a failure to gather entropy qualifies. Every other failure is
    /// deterministic given the same inputs.
    pub fn is_retryable(&self) -> bool {
        self.kind == Some(ErrorKind::EntropyUnavailable)
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_preserves_category_and_kind() {
        let inner = SealError::with_kind(
            ErrorCategory::Configuration,
            ErrorKind::PublicKeyLength,
            "public key must be 32 bytes",
        );
        let outer = inner.with_context("invalid recipient public key");

        assert_eq!(outer.category, ErrorCategory::Configuration);
        assert_eq!(outer.kind, Some(ErrorKind::PublicKeyLength));
        assert_eq!(outer.message(), "invalid recipient public key");
        assert_eq!(outer.to_string(), "invalid recipient public key");

        let source = outer.source_error().expect("context should keep the source");
        assert_eq!(source.to_string(), "public key must be 32 bytes");
    }

    #[test]
    fn test_only_entropy_failures_are_retryable() {
        let entropy = SealError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::EntropyUnavailable,
            "no entropy",
        );
        assert!(entropy.is_retryable());
        assert!(entropy.with_context("sealing failed").is_retryable());

        let seal = SealError::with_kind(ErrorCategory::Internal, ErrorKind::SealFailure, "boom");
        assert!(!seal.is_retryable());
        assert!(!seal.with_context("sealing failed").is_retryable());
    }
}
