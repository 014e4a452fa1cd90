//! # ChainUp Custody Rust SDK
//!
//! A **type-safe** Rust client for the ChainUp custody WaaS and MPC wallet APIs.
//!
//! ## Features
//!
//! - 🔐 **Segmented RSA transport codec**: byte-compatible with the platform's private-key encryption scheme
//! - ✍️ **Transaction signing**: canonical parameter strings signed with MD5-then-RSA-SHA256
//! - 🔑 **Tolerant key loading**: PEM, bare base64, PKCS#1 and PKCS#8 keys with any line breaks
//! - 🧩 **Pluggable crypto**: bring your own HSM or KMS through the [`CryptoProvider`] trait
//! - 🌐 **Async HTTP client**: `reqwest` based client for both WaaS and MPC platforms
//! - 📬 **Webhook decoding**: deposit, withdrawal and second-verification callbacks
//!
//! ## Quick Start
//!
//! ### Signed MPC withdrawal
//!
//! ```rust,no_run
//! use chainup_custody::{CustodyClient, CustodyConfig, WithdrawRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CustodyConfig::mpc("your-app-id")
//!         .with_private_key(std::fs::read_to_string("private.pem")?)
//!         .with_public_key(std::fs::read_to_string("chainup_public.pem")?)
//!         .with_sign_private_key(std::fs::read_to_string("sign_private.pem")?);
//!
//!     let client = CustodyClient::new(config)?;
//!
//!     let request = WithdrawRequest::new("req-20240101-01", 1000537, "USDTERC20", "12.5", "0x5a8b...")
//!         .with_transaction_sign(true);
//!     let result = client.withdraw(&request).await?;
//!     println!("withdraw_id: {}", result["withdraw_id"]);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Decoding a webhook
//!
//! ```rust,no_run
//! use chainup_custody::CustodyClient;
//!
//! # fn example(client: &CustodyClient, body: &str) -> chainup_custody::Result<()> {
//! let notification = client.notify_decoder().decode_notification(body)?;
//! println!("{} of {} {}", notification["side"], notification["amount"], notification["symbol"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`crypto`**: key loading, transport codec, canonical signer and crypto providers
//! - **`client`**: encrypted request pipeline and response envelope handling
//! - **`notify`**: webhook payload decoding
//! - **`types`**: configuration and transaction request types
//! - **`error`**: error taxonomy
//!
//! ## Configuration
//!
//! [`CustodyConfig`] can be built in code, loaded from a JSON file with
//! [`CustodyConfig::from_json_file`], or read from `CUSTODY_*` environment
//! variables with [`CustodyConfig::from_env`].

pub mod client;
pub mod crypto;
pub mod error;
pub mod notify;
pub mod types;

// Re-exports for convenience
pub use client::CustodyClient;
pub use crypto::{CryptoProvider, RsaCryptoProvider};
pub use error::{CustodyError, Result};
pub use notify::NotifyDecoder;
pub use types::*;

/// Current version of the custody SDK
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
