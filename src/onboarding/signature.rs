//! onboarding::signature
//!
//! GitHub webhook signatures (`X-Hub-Signature-256: sha256=<hex>`).

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::OnboardingError;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

fn mac(secret: &[u8]) -> Result<HmacSha256, OnboardingError> {
    <HmacSha256 as Mac>::new_from_slice(secret).map_err(|_| OnboardingError::InvalidSignature)
}

/// Signature header value for `body`.
pub fn sign(secret: &[u8], body: &[u8]) -> Result<String, OnboardingError> {
    let mut mac = mac(secret)?;
    mac.update(body);
    Ok(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Check a signature header against `body`.
///
/// The comparison is constant-time.
///
/// # Errors
///
/// `OnboardingError::InvalidSignature` if the secret is empty, or the
/// header is missing, malformed or does not match.
pub fn verify_signature(
    secret: &[u8],
    body: &[u8],
    header: Option<&str>,
) -> Result<(), OnboardingError> {
    if secret.is_empty() {
        return Err(OnboardingError::InvalidSignature);
    }
    let digest = header
        .and_then(|h| h.strip_prefix(SIGNATURE_PREFIX))
        .and_then(|h| hex::decode(h).ok())
        .ok_or(OnboardingError::InvalidSignature)?;

    let mut mac = mac(secret)?;
    mac.update(body);
    mac.verify_slice(&digest)
        .map_err(|_| OnboardingError::InvalidSignature)
}
