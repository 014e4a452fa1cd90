//! Segmented raw-RSA transport codec
//!
//! Payloads are confidentiality-protected by "encrypting" with the sender's
//! private exponent and "decrypting" with its public exponent. Each block
//! carries PKCS#1 v1.5 type-1 padding built by hand, so payloads of any length
//! are split into `byte_length - 11` byte segments.
//!
//! The padding is part of the wire format shared with the remote peer and
//! must not be replaced with OAEP or the standard PKCS#1 encryption scheme.

use super::keys::{KeyMaterial, KeyRole};
use crate::{CustodyError, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

/// Bytes of padding overhead per block: `0x00 0x01`, at least eight `0xFF`, `0x00`
pub const PADDING_OVERHEAD: usize = 11;

/// URL-safe base64 that emits no `=` and accepts input with or without it
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Maximum plaintext bytes carried by one block of a key of `byte_length` bytes
pub fn block_capacity(byte_length: usize) -> usize {
    byte_length.saturating_sub(PADDING_OVERHEAD)
}

/// Encrypt UTF-8 text with a private key, returning unpadded URL-safe base64
pub fn encrypt_with_private_key(plaintext: &str, key: &KeyMaterial) -> Result<String> {
    let ciphertext = encrypt_bytes(plaintext.as_bytes(), key)?;
    Ok(URL_SAFE_LENIENT.encode(ciphertext))
}

/// Decrypt URL-safe base64 ciphertext with a public key back to UTF-8 text
pub fn decrypt_with_public_key(ciphertext: &str, key: &KeyMaterial) -> Result<String> {
    let raw = URL_SAFE_LENIENT
        .decode(ciphertext.trim())
        .map_err(|e| CustodyError::crypto(format!("ciphertext is not valid base64: {}", e)))?;

    let plaintext = decrypt_bytes(&raw, key)?;
    String::from_utf8(plaintext)
        .map_err(|_| CustodyError::crypto("decrypted payload is not valid UTF-8"))
}

/// Segment, pad and encrypt raw bytes. The output is
/// `ceil(len / capacity) * byte_length` bytes long.
pub fn encrypt_bytes(plaintext: &[u8], key: &KeyMaterial) -> Result<Vec<u8>> {
    expect_role(key, KeyRole::Private)?;

    let k = key.byte_length();
    let capacity = block_capacity(k);
    if capacity == 0 {
        return Err(CustodyError::crypto(format!(
            "a {}-byte modulus is too small to carry any payload",
            k
        )));
    }

    let mut out = Vec::with_capacity(plaintext.len().div_ceil(capacity) * k);
    for chunk in plaintext.chunks(capacity) {
        let padded = pad_block(chunk, k);
        out.extend_from_slice(&key.apply(&padded)?);
    }

    Ok(out)
}

/// Decrypt and unpad consecutive `byte_length` blocks.
///
/// A short trailing block is processed as-is.
pub fn decrypt_bytes(ciphertext: &[u8], key: &KeyMaterial) -> Result<Vec<u8>> {
    expect_role(key, KeyRole::Public)?;

    let k = key.byte_length();
    let mut out = Vec::with_capacity(ciphertext.len());
    for block in ciphertext.chunks(k) {
        let decrypted = key.apply(block)?;
        out.extend_from_slice(unpad_block(&decrypted));
    }

    Ok(out)
}

/// Build a `k` byte PKCS#1 v1.5 type-1 block: `00 01 FF.. 00 || chunk`.
///
/// `chunk` must be at most `k - 11` bytes.
pub(crate) fn pad_block(chunk: &[u8], k: usize) -> Vec<u8> {
    debug_assert!(chunk.len() + PADDING_OVERHEAD <= k);

    let filler = k - chunk.len() - 3;
    let mut block = Vec::with_capacity(k);
    block.extend_from_slice(&[0x00, 0x01]);
    block.resize(2 + filler, 0xFF);
    block.push(0x00);
    block.extend_from_slice(chunk);
    block
}

/// Strip type-1 or type-2 padding from a decrypted block.
///
/// Without a recognizable header or separator, leading zero bytes are stripped
/// instead. This fallback is lossy for payloads that begin with `0x00`.
pub(crate) fn unpad_block(block: &[u8]) -> &[u8] {
    if block.len() >= PADDING_OVERHEAD && matches!(&block[..2], [0x00, 0x01] | [0x00, 0x02]) {
        if let Some(separator) = block[2..].iter().position(|&b| b == 0x00) {
            return &block[2 + separator + 1..];
        }
    }

    let start = block.iter().position(|&b| b != 0x00).unwrap_or(block.len());
    &block[start..]
}

fn expect_role(key: &KeyMaterial, role: KeyRole) -> Result<()> {
    if key.role() != role {
        return Err(CustodyError::crypto(format!(
            "operation requires a {} key, got a {} key",
            role.as_str(),
            key.role().as_str()
        )));
    }
    Ok(())
}
