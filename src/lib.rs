//! encrypt-secret - seal secrets to a Curve25519 public key
//!
//! Produces libsodium-compatible sealed boxes, armored as standard base64,
//! suitable for pasting into `terraform.tfvars`.

#![forbid(unsafe_code)]

pub mod armor;
pub mod error;
pub mod recipient;
pub mod sealedbox;

pub use error::{ErrorCategory, ErrorKind, Result, SealError};
pub use recipient::{DEFAULT_PUBLIC_KEY, KeySource, PUBLIC_KEY_ENV, RecipientKey};
pub use sealedbox::{SealedSecretEncryptor, encrypt};
