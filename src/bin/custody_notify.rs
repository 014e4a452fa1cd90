//! Custody notification decoder
//!
//! Decrypts a webhook payload with the keys configured through `CUSTODY_*`
//! environment variables and prints the JSON document.
//!
//! ```text
//! custody-notify [notify|verify] [CIPHER]
//! ```
//!
//! The first argument is the cipher unless it is exactly `notify` or
//! `verify`, in which case it selects the payload kind (default `notify`).
//! The cipher is read from stdin when not given as an argument.

use chainup_custody::crypto::RsaCryptoProvider;
use chainup_custody::notify::NotifyDecoder;
use chainup_custody::types::CustodyConfig;
use std::env;
use std::io::Read;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Notify,
    Verify,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::Notify => "notify",
            Mode::Verify => "verify",
        }
    }
}

/// Split the command line into the payload kind and an inline cipher
fn parse_args<I>(args: I) -> (Mode, Option<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().peekable();
    let mode = match args.peek().map(String::as_str) {
        Some("notify") => Some(Mode::Notify),
        Some("verify") => Some(Mode::Verify),
        _ => None,
    };
    if mode.is_some() {
        args.next();
    }

    (mode.unwrap_or(Mode::Notify), args.next())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let (mode, cipher) = parse_args(env::args().skip(1));
    let cipher = match cipher {
        Some(cipher) => cipher,
        None => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            input
        }
    };

    let config = CustodyConfig::from_env()?;
    let provider = RsaCryptoProvider::new(
        &config.private_key,
        &config.public_key,
        &config.sign_private_key,
    )?;
    let decoder = NotifyDecoder::new(Arc::new(provider));

    let document = match mode {
        Mode::Notify => decoder.decode_notification(cipher.trim())?,
        Mode::Verify => decoder.decode_verify_request(cipher.trim())?,
    };

    tracing::info!("Decoded {} payload for app {}", mode.as_str(), config.app_id);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
