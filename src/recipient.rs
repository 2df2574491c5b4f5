//! The recipient public key secrets are sealed to
//!
//! A built-in key is compiled into the tool. Deployments and tests can point
//! the tool at a different keypair by setting [`PUBLIC_KEY_ENV`].

use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;

use crypto_box::{KEY_SIZE, PublicKey};
use tracing::debug;

use crate::armor;
use crate::error::{ErrorCategory, ErrorKind, Result, SealError};

/// Organization public key (standard base64, 32 bytes once decoded).
pub const DEFAULT_PUBLIC_KEY: &str = "FCgAbrpmBl+K8b8vT+XLaytWQaO8KQHHNG/ABS+tKQU=";

/// Environment variable that overrides [`DEFAULT_PUBLIC_KEY`] when set and non-empty.
pub const PUBLIC_KEY_ENV: &str = "ENCRYPT_SECRET_PUBLIC_KEY";

/// Where the recipient key in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    BuiltIn,
    Environment,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::BuiltIn => f.write_str("built-in"),
            KeySource::Environment => write!(f, "environment ({})", PUBLIC_KEY_ENV),
        }
    }
}

/// A validated Curve25519 public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientKey {
    key: PublicKey,
}

impl RecipientKey {
    /// Parse a standard-base64 encoded public key.
    ///
    /// Surrounding whitespace is ignored so values copied from files or
    /// shell variables with a trailing newline still work. Every failure is
    /// reported under [`ErrorCategory::Configuration`].
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = armor::unwrap(encoded.trim()).map_err(|e| {
            SealError::with_kind_and_source(
                ErrorCategory::Configuration,
                ErrorKind::PublicKeyEncoding,
                "recipient public key is not valid base64",
                e,
            )
        })?;

        let bytes: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            SealError::with_kind(
                ErrorCategory::Configuration,
                ErrorKind::PublicKeyLength,
                format!(
                    "recipient public key must be {} bytes, got {}",
                    KEY_SIZE,
                    bytes.len()
                ),
            )
        })?;

        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self {
            key: PublicKey::from(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        self.key.as_bytes()
    }

    pub fn to_base64(&self) -> String {
        armor::wrap(self.as_bytes())
    }

    pub(crate) fn public_key(&self) -> &PublicKey {
        &self.key
    }
}

impl From<PublicKey> for RecipientKey {
    fn from(key: PublicKey) -> Self {
        Self { key }
    }
}

impl FromStr for RecipientKey {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_base64(s)
    }
}

impl fmt::Display for RecipientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// Resolve the recipient key from the process environment, falling back
/// to the built-in key.
pub fn resolve() -> Result<(RecipientKey, KeySource)> {
    resolve_from(std::env::var_os(PUBLIC_KEY_ENV))
}

/// Resolve the recipient key given the raw value of [`PUBLIC_KEY_ENV`].
pub fn resolve_from(env_value: Option<OsString>) -> Result<(RecipientKey, KeySource)> {
    let (key, source) = match env_value.filter(|v| !v.is_empty()) {
        Some(value) => {
            let value = value.into_string().map_err(|_| {
                SealError::with_kind(
                    ErrorCategory::Configuration,
                    ErrorKind::PublicKeyEncoding,
                    format!("{} is not valid UTF-8", PUBLIC_KEY_ENV),
                )
            })?;
            let key = RecipientKey::from_base64(&value)
                .map_err(|e| e.with_context(format!("invalid public key in {}", PUBLIC_KEY_ENV)))?;
            (key, KeySource::Environment)
        }
        None => {
            let key = RecipientKey::from_base64(DEFAULT_PUBLIC_KEY)
                .map_err(|e| e.with_context("invalid built-in public key"))?;
            (key, KeySource::BuiltIn)
        }
    };

    debug!(%source, "resolved recipient public key");
    Ok((key, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_is_valid() {
        let key = RecipientKey::from_base64(DEFAULT_PUBLIC_KEY).unwrap();
        assert_eq!(key.as_bytes().len(), KEY_SIZE);
        assert_eq!(key.to_base64(), DEFAULT_PUBLIC_KEY);
        assert_eq!(key.to_string(), DEFAULT_PUBLIC_KEY);
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let key: RecipientKey = format!("  {}\n", DEFAULT_PUBLIC_KEY).parse().unwrap();
        assert_eq!(key.to_base64(), DEFAULT_PUBLIC_KEY);
    }

    #[test]
    fn test_bad_base64_is_configuration_error() {
        let err = RecipientKey::from_base64("not base64!").expect_err("expected decode failure");
        assert_eq!(err.category, ErrorCategory::Configuration);
        assert_eq!(err.kind, Some(ErrorKind::PublicKeyEncoding));
        assert!(err.source_error().is_some());
    }

    #[test]
    fn test_short_key_is_configuration_error() {
        // 31 bytes
        let err = RecipientKey::from_base64(&armor::wrap(&[7u8; 31]))
            .expect_err("expected length failure");
        assert_eq!(err.category, ErrorCategory::Configuration);
        assert_eq!(err.kind, Some(ErrorKind::PublicKeyLength));
        assert_eq!(err.message(), "recipient public key must be 32 bytes, got 31");
    }

    #[test]
    fn test_long_key_is_configuration_error() {
        let err = RecipientKey::from_base64(&armor::wrap(&[7u8; 33]))
            .expect_err("expected length failure");
        assert_eq!(err.kind, Some(ErrorKind::PublicKeyLength));
    }

    #[test]
    fn test_empty_key_is_configuration_error() {
        let err = RecipientKey::from_base64("").expect_err("expected length failure");
        assert_eq!(err.kind, Some(ErrorKind::PublicKeyLength));
    }

    #[test]
    fn test_resolve_without_override_uses_builtin() {
        let (key, source) = resolve_from(None).unwrap();
        assert_eq!(source, KeySource::BuiltIn);
        assert_eq!(key.to_base64(), DEFAULT_PUBLIC_KEY);
    }

    #[test]
    fn test_resolve_empty_override_uses_builtin() {
        let (_, source) = resolve_from(Some(OsString::new())).unwrap();
        assert_eq!(source, KeySource::BuiltIn);
    }

    #[test]
    fn test_resolve_with_override() {
        let other = armor::wrap(&[9u8; KEY_SIZE]);
        let (key, source) = resolve_from(Some(OsString::from(other.clone()))).unwrap();
        assert_eq!(source, KeySource::Environment);
        assert_eq!(key.to_base64(), other);
    }

    #[test]
    fn test_resolve_with_malformed_override() {
        let err = resolve_from(Some(OsString::from("AAAA"))).expect_err("expected failure");
        assert_eq!(err.category, ErrorCategory::Configuration);
        assert_eq!(err.kind, Some(ErrorKind::PublicKeyLength));
        assert_eq!(
            err.message(),
            "invalid public key in ENCRYPT_SECRET_PUBLIC_KEY"
        );
    }
}
