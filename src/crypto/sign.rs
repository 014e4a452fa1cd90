//! Canonical parameter signing for transaction authorization
//!
//! Signing process, shared with the remote verifier:
//! 1. Drop null and empty values, trim trailing zeros from `amount`
//! 2. Sort keys in byte order and join as `k1=v1&k2=v2`, lowercased
//! 3. MD5 the canonical string and hex-encode the digest
//! 4. Sign the hex string with RSA-SHA256 (PKCS#1 v1.5)
//! 5. Base64-encode the signature (standard alphabet, padded)

use super::keys::KeyMaterial;
use super::provider::CryptoProvider;
use crate::{CustodyError, Result};
use base64::{engine::general_purpose, Engine as _};
use md5::Md5;
use rsa::Pkcs1v15Sign;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Fields covered by a withdrawal signature
pub const WITHDRAW_SIGN_FIELDS: [&str; 7] = [
    "request_id",
    "sub_wallet_id",
    "symbol",
    "address_to",
    "amount",
    "memo",
    "outputs",
];

/// Fields covered by a Web3 transaction signature
pub const WEB3_SIGN_FIELDS: [&str; 6] = [
    "request_id",
    "sub_wallet_id",
    "main_chain_symbol",
    "interactive_contract",
    "amount",
    "input_data",
];

/// Build the canonical `key=value&...` string for a parameter set.
///
/// Scalars are rendered as-is; arrays and objects become compact JSON
/// (`["a","b"]`). Python SDKs render such values with `str()`, which gives
/// `['a', 'b']`, so callers building the raw map themselves should pass
/// structured values such as `outputs` pre-serialized as strings.
pub fn canonicalize(params: &Map<String, Value>) -> String {
    let mut sorted: BTreeMap<&str, String> = BTreeMap::new();

    for (key, value) in params {
        let Some(mut value) = value_to_string(value) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if key == "amount" {
            value = trim_amount(&value);
        }
        sorted.insert(key.as_str(), value);
    }

    sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
        .to_lowercase()
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// `1.0001000` becomes `1.0001`, `1.0` becomes `1`; integers are untouched
fn trim_amount(amount: &str) -> String {
    let mut trimmed = amount;
    if let Some(dot) = trimmed.rfind('.') {
        if trimmed[dot + 1..].bytes().all(|b| b.is_ascii_digit()) {
            trimmed = trimmed.trim_end_matches('0');
        }
    }
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}

/// Lowercase hex MD5 digest of a string
pub fn md5_hex(data: &str) -> String {
    hex::encode(Md5::digest(data.as_bytes()))
}

/// Sign canonical data with a key string in any supported private key format.
///
/// Empty data or an empty key yields an empty signature rather than an error.
pub fn sign(data: &str, signing_key: &str) -> Result<String> {
    if data.is_empty() || signing_key.trim().is_empty() {
        return Ok(String::new());
    }

    let key = KeyMaterial::load_signing_key(signing_key)?;
    sign_with_key(data, &key)
}

/// Sign canonical data with already loaded private key material
pub fn sign_with_key(data: &str, key: &KeyMaterial) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }

    let private_key = key
        .private_key()
        .ok_or_else(|| CustodyError::signature("signing requires a private key"))?;

    let digest = Sha256::digest(md5_hex(data).as_bytes());
    let signature = private_key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|e| CustodyError::signature(format!("RSA signing failed: {}", e)))?;

    Ok(general_purpose::STANDARD.encode(signature))
}

/// Check a base64 RSA-SHA256 (PKCS#1 v1.5) signature over the raw bytes of `data`
pub fn verify_with_key(data: &str, signature: &str, key: &KeyMaterial) -> Result<bool> {
    verify_digest(&Sha256::digest(data.as_bytes()), signature, key)
}

/// Check a transaction signature produced by [`sign_with_key`], which signs
/// the MD5 hex of `data` rather than `data` itself
pub fn verify_transaction_sign_with_key(
    data: &str,
    signature: &str,
    key: &KeyMaterial,
) -> Result<bool> {
    verify_digest(&Sha256::digest(md5_hex(data).as_bytes()), signature, key)
}

fn verify_digest(digest: &[u8], signature: &str, key: &KeyMaterial) -> Result<bool> {
    let public_key = key
        .public_key()
        .ok_or_else(|| CustodyError::crypto("verification requires a public key"))?;

    let Ok(signature) = general_purpose::STANDARD.decode(signature.trim()) else {
        return Ok(false);
    };

    Ok(public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), digest, &signature)
        .is_ok())
}

/// Sign the withdrawal field subset of a request through a provider
pub fn generate_withdraw_sign(
    request: &Map<String, Value>,
    provider: &dyn CryptoProvider,
) -> Result<String> {
    generate_sign(request, &WITHDRAW_SIGN_FIELDS, |data| provider.sign(data))
}

/// Sign the Web3 transaction field subset of a request through a provider
pub fn generate_web3_sign(
    request: &Map<String, Value>,
    provider: &dyn CryptoProvider,
) -> Result<String> {
    generate_sign(request, &WEB3_SIGN_FIELDS, |data| provider.sign(data))
}

/// Sign the withdrawal field subset of a request with a key string
pub fn generate_withdraw_sign_with_key(
    request: &Map<String, Value>,
    signing_key: &str,
) -> Result<String> {
    generate_sign(request, &WITHDRAW_SIGN_FIELDS, |data| sign(data, signing_key))
}

/// Sign the Web3 transaction field subset of a request with a key string
pub fn generate_web3_sign_with_key(
    request: &Map<String, Value>,
    signing_key: &str,
) -> Result<String> {
    generate_sign(request, &WEB3_SIGN_FIELDS, |data| sign(data, signing_key))
}

/// Pick `fields` out of `request` (absent fields count as empty)
pub fn select_fields(request: &Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
    fields
        .iter()
        .map(|field| {
            let value = request.get(*field).cloned().unwrap_or(Value::Null);
            (field.to_string(), value)
        })
        .collect()
}

fn generate_sign<F>(request: &Map<String, Value>, fields: &[&str], sign: F) -> Result<String>
where
    F: FnOnce(&str) -> Result<String>,
{
    if request.is_empty() {
        return Ok(String::new());
    }

    let canonical = canonicalize(&select_fields(request, fields));
    if canonical.is_empty() {
        return Ok(String::new());
    }

    tracing::debug!("Signing canonical params: {}", canonical);
    sign(&canonical)
}
