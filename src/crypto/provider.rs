//! Crypto provider abstraction
//!
//! The request pipeline, the notification decoder and the transaction signing
//! flows only depend on [`CryptoProvider`]. [`RsaCryptoProvider`] is the
//! built-in implementation; HSM or KMS backed implementations can be plugged
//! in through [`crate::client::CustodyClient::with_provider`].

use super::codec;
use super::keys::{KeyMaterial, KeyRole};
use super::sign;
use crate::{CustodyError, Result};

/// Capability bundle used for transport encryption and transaction signing
pub trait CryptoProvider: Send + Sync {
    /// Encrypt a payload with the local private key (URL-safe base64 output)
    fn encrypt_with_private_key(&self, data: &str) -> Result<String>;

    /// Decrypt a payload with the remote party's public key
    fn decrypt_with_public_key(&self, encrypted_data: &str) -> Result<String>;

    /// Sign canonical transaction data (standard base64 output)
    fn sign(&self, _data: &str) -> Result<String> {
        Err(CustodyError::crypto("sign is not supported by this provider"))
    }

    /// Verify a base64 RSA-SHA256 signature over the raw bytes of `data`
    fn verify(&self, _data: &str, _signature: &str) -> Result<bool> {
        Err(CustodyError::crypto("verify is not supported by this provider"))
    }
}

/// Default provider backed by in-process RSA keys.
///
/// Keys are loaded once at construction and never change afterwards. The
/// signing key falls back to the encryption private key when not supplied.
#[derive(Debug, Clone, Default)]
pub struct RsaCryptoProvider {
    encryption_private: Option<KeyMaterial>,
    encryption_public: Option<KeyMaterial>,
    signing_private: Option<KeyMaterial>,
}

impl RsaCryptoProvider {
    /// Create a provider from key strings; empty strings count as absent
    pub fn new(private_key: &str, public_key: &str, sign_private_key: &str) -> Result<Self> {
        Self::builder()
            .private_key(private_key)
            .public_key(public_key)
            .sign_private_key(sign_private_key)
            .build()
    }

    pub fn builder() -> RsaCryptoProviderBuilder {
        RsaCryptoProviderBuilder::default()
    }

    /// Create a provider from already loaded key material
    pub fn from_keys(
        encryption_private: Option<KeyMaterial>,
        encryption_public: Option<KeyMaterial>,
        signing_private: Option<KeyMaterial>,
    ) -> Result<Self> {
        for (key, role) in [
            (&encryption_private, KeyRole::Private),
            (&encryption_public, KeyRole::Public),
            (&signing_private, KeyRole::Private),
        ] {
            if let Some(key) = key {
                if key.role() != role {
                    return Err(CustodyError::key_format(format!(
                        "expected a {} key, got a {} key",
                        role.as_str(),
                        key.role().as_str()
                    )));
                }
            }
        }

        let signing_private = signing_private.or_else(|| encryption_private.clone());
        Ok(Self {
            encryption_private,
            encryption_public,
            signing_private,
        })
    }

    pub fn has_private_key(&self) -> bool {
        self.encryption_private.is_some()
    }

    pub fn has_public_key(&self) -> bool {
        self.encryption_public.is_some()
    }

    pub fn has_signing_key(&self) -> bool {
        self.signing_private.is_some()
    }

    /// Verify a signature produced by [`CryptoProvider::sign`] on this or a
    /// peer provider. The MD5 hex pre-hash is applied before RSA-SHA256.
    pub fn verify_transaction_sign(&self, data: &str, signature: &str) -> Result<bool> {
        sign::verify_transaction_sign_with_key(data, signature, self.public()?)
    }

    fn public(&self) -> Result<&KeyMaterial> {
        self.encryption_public
            .as_ref()
            .ok_or_else(|| CustodyError::crypto("public key is not set"))
    }
}

impl CryptoProvider for RsaCryptoProvider {
    fn encrypt_with_private_key(&self, data: &str) -> Result<String> {
        let key = self
            .encryption_private
            .as_ref()
            .ok_or_else(|| CustodyError::crypto("private key is not set"))?;
        codec::encrypt_with_private_key(data, key)
    }

    fn decrypt_with_public_key(&self, encrypted_data: &str) -> Result<String> {
        codec::decrypt_with_public_key(encrypted_data, self.public()?)
    }

    fn sign(&self, data: &str) -> Result<String> {
        let key = self
            .signing_private
            .as_ref()
            .ok_or_else(|| CustodyError::signature("neither sign private key nor private key is set"))?;
        sign::sign_with_key(data, key)
    }

    fn verify(&self, data: &str, signature: &str) -> Result<bool> {
        sign::verify_with_key(data, signature, self.public()?)
    }
}

/// Builder for [`RsaCryptoProvider`]
#[derive(Default)]
pub struct RsaCryptoProviderBuilder {
    private_key: Option<String>,
    public_key: Option<String>,
    sign_private_key: Option<String>,
}

impl RsaCryptoProviderBuilder {
    /// Private key used to encrypt outbound payloads
    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = non_empty(key.into());
        self
    }

    /// Remote public key used to decrypt inbound payloads
    pub fn public_key(mut self, key: impl Into<String>) -> Self {
        self.public_key = non_empty(key.into());
        self
    }

    /// Private key used for transaction signatures
    pub fn sign_private_key(mut self, key: impl Into<String>) -> Self {
        self.sign_private_key = non_empty(key.into());
        self
    }

    pub fn build(self) -> Result<RsaCryptoProvider> {
        let encryption_private = self
            .private_key
            .map(|raw| KeyMaterial::load(&raw, KeyRole::Private))
            .transpose()?;
        let encryption_public = self
            .public_key
            .map(|raw| KeyMaterial::load(&raw, KeyRole::Public))
            .transpose()?;
        let signing_private = self
            .sign_private_key
            .map(|raw| KeyMaterial::load_signing_key(&raw))
            .transpose()?;

        RsaCryptoProvider::from_keys(encryption_private, encryption_public, signing_private)
    }
}

impl std::fmt::Debug for RsaCryptoProviderBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaCryptoProviderBuilder")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("public_key", &self.public_key.is_some())
            .field(
                "sign_private_key",
                &self.sign_private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
