//! encrypt-secret CLI
//!
//! Encrypts a secret value to the organization public key and prints it
//! ready to be copied into `terraform.tfvars`.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use encrypt_secret::{ErrorCategory, ErrorKind, Result, SealError, SealedSecretEncryptor};

const USAGE: &str = "Usage: encrypt-secret 'your-secret-value'";

const OUTPUT_LABEL: &str = "Encrypted value (copy this to terraform.tfvars):";

#[derive(Parser)]
#[command(name = "encrypt-secret")]
#[command(version)]
#[command(about = "Encrypt a secret with the organization public key.", long_about = None)]
struct Cli {
    /// The secret value to encrypt
    #[arg(value_name = "SECRET", allow_hyphen_values = true)]
    secret: Option<String>,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();

    match require_secret(cli.secret).and_then(|secret| run(&secret)) {
        Ok(()) => {}
        Err(e) if e.kind == Some(ErrorKind::MissingSecret) => {
            println!("{}", e.message());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn require_secret(secret: Option<String>) -> Result<Zeroizing<String>> {
    match secret {
        Some(secret) if !secret.is_empty() => Ok(Zeroizing::new(secret)),
        _ => Err(SealError::with_kind(
            ErrorCategory::User,
            ErrorKind::MissingSecret,
            USAGE,
        )),
    }
}

fn run(secret: &str) -> Result<()> {
    let (encryptor, source) = SealedSecretEncryptor::from_environment()?;
    debug!(%source, recipient = %encryptor.recipient(), "encrypting secret");

    let encrypted = encryptor.encrypt(secret)?;

    write_output(&mut io::stdout().lock(), &encrypted).map_err(|e| {
        SealError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to write to stdout: {}", e),
            e,
        )
    })
}

/// The label is only written once the sealed value exists, so a failure
/// never leaves partial output behind.
fn write_output(out: &mut impl Write, encrypted: &str) -> io::Result<()> {
    writeln!(out, "{}", OUTPUT_LABEL)?;
    writeln!(out, "{}", encrypted)?;
    out.flush()
}

/// Log to stderr so stdout only ever carries the encrypted value.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();
}
