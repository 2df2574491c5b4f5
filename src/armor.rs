//! Text armoring for binary data
//!
//! Sealed boxes and public keys travel as standard base64 (RFC 4648
//! alphabet, `=` padding). This is the format libsodium's own tooling
//! emits, and what the consumers of `terraform.tfvars` values expect.

use crate::error::{ErrorCategory, ErrorKind, Result, SealError};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Wrap bytes in armor, returning the armored string
pub fn wrap(body: &[u8]) -> String {
    STANDARD.encode(body)
}

/// Unwrap an armored string, returning the original bytes
pub fn unwrap(armored: &str) -> Result<Vec<u8>> {
    STANDARD.decode(armored).map_err(|e| {
        SealError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringDecode,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}
