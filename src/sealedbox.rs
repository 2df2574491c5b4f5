//! Anonymous public-key encryption using libsodium-compatible sealed boxes
//!
//! A sealed box encrypts to a recipient's Curve25519 public key without
//! identifying the sender:
//! - a fresh ephemeral X25519 keypair is generated per message, with
//!   failures of the OS randomness source retried and reported separately
//! - the nonce is BLAKE2b-192(ephemeral_pk || recipient_pk)
//! - the plaintext is boxed (X25519 + XSalsa20Poly1305) from the ephemeral
//!   secret key to the recipient public key
//!
//! The binary format is identical to libsodium's `crypto_box_seal`:
//! - ephemeral public key: 32 bytes
//! - Poly1305 tag: 16 bytes
//! - XSalsa20 ciphertext: same length as the plaintext

use crypto_box::{KEY_SIZE, SEALBYTES};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::armor;
use crate::error::{ErrorCategory, ErrorKind, Result, SealError};
use crate::recipient::{self, KeySource, RecipientKey};

/// Length of the ephemeral public key prefix in bytes
pub const EPHEMERAL_KEY_LEN: usize = KEY_SIZE;

/// Length of the Poly1305 authentication tag in bytes
pub const TAG_LEN: usize = SEALBYTES - KEY_SIZE;

/// Bytes a sealed box adds on top of the plaintext
pub const SEAL_OVERHEAD: usize = SEALBYTES;

/// How often to ask the OS for ephemeral key material before giving up
const ENTROPY_ATTEMPTS: usize = 3;

/// Encrypts secrets to a single recipient public key.
#[derive(Debug, Clone)]
pub struct SealedSecretEncryptor {
    recipient: RecipientKey,
}

impl SealedSecretEncryptor {
    pub fn new(recipient: RecipientKey) -> Self {
        Self { recipient }
    }

    /// Build an encryptor for a standard-base64 encoded public key.
    pub fn from_base64(public_key: &str) -> Result<Self> {
        RecipientKey::from_base64(public_key).map(Self::new)
    }

    /// Build an encryptor for the configured recipient key, see [`recipient::resolve`].
    pub fn from_environment() -> Result<(Self, KeySource)> {
        let (key, source) = recipient::resolve()?;
        Ok((Self::new(key), source))
    }

    pub fn recipient(&self) -> &RecipientKey {
        &self.recipient
    }

    /// Seal `secret` and return the armored (standard base64) sealed box.
    ///
    /// Every call uses a fresh ephemeral key, so encrypting the same secret
    /// twice never yields the same output.
    pub fn encrypt(&self, secret: &str) -> Result<String> {
        let sealed = seal(&self.recipient, secret.as_bytes())?;
        Ok(armor::wrap(&sealed))
    }
}

/// Encrypt `secret` to the standard-base64 encoded `public_key`.
///
/// The key is validated before any encryption is attempted; a malformed key
/// fails with [`ErrorCategory::Configuration`].
pub fn encrypt(secret: &str, public_key: &str) -> Result<String> {
    SealedSecretEncryptor::from_base64(public_key)?.encrypt(secret)
}

/// Seal plaintext to `recipient` using a random ephemeral key
///
/// Returns the binary format: ephemeral_pk(32) + tag(16) + ciphertext(variable)
pub fn seal(recipient: &RecipientKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let ephemeral_secret = ephemeral_secret(&mut OsRng)?;
    seal_deterministic(recipient, plaintext, &ephemeral_secret)
}

/// Seal plaintext to `recipient` using the provided ephemeral secret key
///
/// This function is ONLY for testing purposes to generate deterministic output.
/// NEVER use this in production - always use `seal()` which generates a random
/// ephemeral key. Reusing an ephemeral key across messages reuses the nonce.
pub fn seal_deterministic(
    recipient: &RecipientKey,
    plaintext: &[u8],
    ephemeral_secret: &[u8; KEY_SIZE],
) -> Result<Vec<u8>> {
    let mut rng = EphemeralKeyRng::new(ephemeral_secret);
    let output = recipient
        .public_key()
        .seal(&mut rng, plaintext)
        .map_err(|e| {
            SealError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::SealFailure,
                "encryption failed",
                e,
            )
        })?;

    debug!(
        plaintext_len = plaintext.len(),
        sealed_len = output.len(),
        "sealed secret"
    );

    Ok(output)
}

/// Draw a fresh ephemeral secret key from `rng`
///
/// Entropy failures are usually transient, so they are retried a few times
/// before being reported.
fn ephemeral_secret(rng: &mut impl RngCore) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
    let mut secret = Zeroizing::new([0u8; KEY_SIZE]);
    let mut attempt = 1;
    loop {
        match rng.try_fill_bytes(&mut *secret) {
            Ok(()) => return Ok(secret),
            Err(e) if attempt < ENTROPY_ATTEMPTS => {
                warn!(attempt, error = %e, "failed to gather entropy, retrying");
                attempt += 1;
            }
            Err(e) => {
                return Err(SealError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::EntropyUnavailable,
                    format!(
                        "failed to gather entropy for ephemeral key after {} attempts",
                        ENTROPY_ATTEMPTS
                    ),
                    e,
                ));
            }
        }
    }
}

/// Hands `crypto_box` an ephemeral secret key that was already drawn.
///
/// `PublicKey::seal` reads exactly one key's worth of bytes from its RNG.
/// Only ever constructed over key material that came from the OS (or a
/// fixed test key), which is what makes the `CryptoRng` marker hold.
struct EphemeralKeyRng<'a> {
    key: &'a [u8; KEY_SIZE],
    pos: usize,
}

impl<'a> EphemeralKeyRng<'a> {
    fn new(key: &'a [u8; KEY_SIZE]) -> Self {
        Self { key, pos: 0 }
    }
}

impl RngCore for EphemeralKeyRng<'_> {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest {
            *byte = self.key[self.pos % KEY_SIZE];
            self.pos += 1;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for EphemeralKeyRng<'_> {}
