//! X-Line-Signature: base64 HMAC-SHA256 of the raw request body, keyed by the channel secret.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature on every webhook POST.
pub const SIGNATURE_HEADER: &str = "X-Line-Signature";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing X-Line-Signature header")]
    Missing,
    #[error("invalid signature")]
    Invalid,
}

fn mac_for(secret: &str, body: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    mac
}

/// Signature LINE would send for `body` under `secret`.
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    STANDARD.encode(mac_for(secret, body).finalize().into_bytes())
}

/// Check `signature` (the header value, if any) against `body`. Comparison is constant-time.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    let signature = signature.ok_or(SignatureError::Missing)?;
    let expected = STANDARD
        .decode(signature.trim().as_bytes())
        .map_err(|_| SignatureError::Invalid)?;
    mac_for(secret, body)
        .verify_slice(&expected)
        .map_err(|_| SignatureError::Invalid)
}
