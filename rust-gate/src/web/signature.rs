//! Plugin webhook signature verification.
//!
//! The kernel signs every plugin input with RSASSA-PKCS1-v1_5 over SHA-256.
//! The signed bytes are the compact JSON serialization of the payload with
//! the `signature` field removed, in the order the keys were received.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use serde_json::{Map, Value};
use sha2::Sha256;
use tracing::debug;

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";

/// Standard alphabet, padding optional and trailing bits ignored, like the
/// browser's `atob`.
const FORGIVING_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Failures that happen before a verification result can be computed.
///
/// Never reported as a `false` verification result: a broken key or an
/// undecodable signature is an internal error, not a mismatch.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("public key is not valid base64: {0}")]
    KeyEncoding(#[source] base64::DecodeError),

    #[error("failed to import public key: {0}")]
    KeyImport(#[from] rsa::pkcs8::spki::Error),

    #[error("signature is not valid base64: {0}")]
    SignatureEncoding(#[source] base64::DecodeError),

    #[error("failed to serialize payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Import a PEM SPKI public key as a verify-only PKCS#1 v1.5 / SHA-256 key.
pub fn import_public_key(public_key_pem: &str) -> Result<VerifyingKey<Sha256>, SignatureError> {
    let body: String = public_key_pem
        .replace(PEM_HEADER, "")
        .replace(PEM_FOOTER, "")
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let der = FORGIVING_BASE64
        .decode(body)
        .map_err(SignatureError::KeyEncoding)?;
    let public_key = RsaPublicKey::from_public_key_der(&der)?;

    Ok(VerifyingKey::<Sha256>::new(public_key))
}

/// Verify a plugin payload signature.
///
/// # Arguments
///
/// * `public_key_pem` - The configured PEM public key
/// * `payload` - The payload object, with the `signature` field already removed
/// * `signature` - Base64 signature taken from the payload
///
/// # Returns
///
/// `Ok(true)` if the signature matches, `Ok(false)` if it does not, and an
/// error if the key or signature could not be decoded.
pub fn verify_signature(
    public_key_pem: &str,
    payload: &Map<String, Value>,
    signature: &str,
) -> Result<bool, SignatureError> {
    let verifying_key = import_public_key(public_key_pem)?;

    let signature: String = signature
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let signature_bytes = FORGIVING_BASE64
        .decode(signature)
        .map_err(SignatureError::SignatureEncoding)?;

    let data = serde_json::to_vec(payload)?;

    let signature = match Signature::try_from(signature_bytes.as_slice()) {
        Ok(s) => s,
        Err(_) => {
            debug!(signature_length = signature_bytes.len(), "plugin_signature_malformed");
            return Ok(false);
        }
    };

    let valid = verifying_key.verify(&data, &signature).is_ok();

    if !valid {
        debug!(
            signature_length = signature_bytes.len(),
            data_length = data.len(),
            "plugin_signature_mismatch"
        );
    }

    Ok(valid)
}
