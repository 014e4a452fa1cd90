//! Webhook notification decoding
//!
//! Deposit and withdrawal notifications, as well as withdrawal
//! second-verification callbacks, arrive as ciphertext produced by the
//! platform's private key. Verification answers travel back encrypted with
//! the local private key.

use crate::crypto::CryptoProvider;
use crate::{CustodyError, Result};
use serde_json::Value;
use std::sync::Arc;

/// Decrypts inbound callbacks and encrypts verification answers
#[derive(Clone)]
pub struct NotifyDecoder {
    provider: Arc<dyn CryptoProvider>,
}

impl std::fmt::Debug for NotifyDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyDecoder")
            .field("provider", &"<crypto provider>")
            .finish()
    }
}

impl NotifyDecoder {
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Decode a deposit or withdrawal notification
    pub fn decode_notification(&self, cipher: &str) -> Result<Value> {
        self.decode("notification", cipher)
    }

    /// Decode a withdrawal second-verification request
    pub fn decode_verify_request(&self, cipher: &str) -> Result<Value> {
        self.decode("verify request", cipher)
    }

    /// Encrypt the answer to a second-verification request
    pub fn encode_verify_response(&self, response: &Value) -> Result<String> {
        if is_empty_document(response) {
            return Err(CustodyError::validation(
                "verify_response",
                "response cannot be empty",
            ));
        }

        let raw = serde_json::to_string(response)?;
        self.provider.encrypt_with_private_key(&raw)
    }

    fn decode(&self, kind: &str, cipher: &str) -> Result<Value> {
        if cipher.trim().is_empty() {
            return Err(CustodyError::validation("cipher", "cannot be empty"));
        }

        let raw = self.provider.decrypt_with_public_key(cipher).map_err(|e| {
            tracing::warn!("Failed to decrypt {}: {}", kind, e);
            e
        })?;
        tracing::debug!("Decrypted {} ({} bytes)", kind, raw.len());

        if raw.trim().is_empty() {
            return Err(CustodyError::validation("cipher", "decrypted to an empty payload"));
        }

        let document: Value = serde_json::from_str(&raw)?;
        if is_empty_document(&document) {
            return Err(CustodyError::validation("cipher", "decoded to an empty document"));
        }

        Ok(document)
    }
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
