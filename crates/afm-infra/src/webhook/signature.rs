//! HMAC signature verification for inbound webhook deliveries.
//!
//! Hubs sign the raw request body with the subscription secret and send the
//! digest as `<algo>=<hex>` in `X-Hub-Signature-256` or `X-Hub-Signature`.

use std::fmt;
use std::str::FromStr;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

/// Header names checked for a signature, in order.
pub const SIGNATURE_HEADERS: [&str; 2] = ["x-hub-signature-256", "x-hub-signature"];

/// Digest used for the HMAC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha1,
    #[default]
    Sha256,
    Sha512,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
            SignatureAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            "sha512" => Ok(SignatureAlgorithm::Sha512),
            other => Err(format!("unsupported signature algorithm: '{other}'")),
        }
    }
}

/// Verify `signature_header` against the HMAC of `body` keyed by `secret`.
///
/// A recognised `<algo>=` prefix overrides `default_algorithm`; without one
/// the whole header is taken as the hex digest. Hex case is ignored and the
/// comparison is constant-time. Never fails: a missing or malformed header
/// is simply `false`.
pub fn verify_signature(
    body: &[u8],
    signature_header: Option<&str>,
    secret: &str,
    default_algorithm: SignatureAlgorithm,
) -> bool {
    let Some(header) = signature_header.filter(|h| !h.is_empty()) else {
        return false;
    };

    let (algorithm, provided) = match header.split_once('=') {
        Some((prefix, digest)) => match prefix.parse::<SignatureAlgorithm>() {
            Ok(algorithm) => (algorithm, digest),
            Err(_) => (default_algorithm, header),
        },
        None => (default_algorithm, header),
    };

    let Some(expected) = compute_signature(body, secret, algorithm) else {
        return false;
    };
    let provided = provided.to_ascii_lowercase();
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// Lowercase hex HMAC of `body` under `algorithm`.
pub fn compute_signature(body: &[u8], secret: &str, algorithm: SignatureAlgorithm) -> Option<String> {
    match algorithm {
        SignatureAlgorithm::Sha1 => hmac_hex::<Hmac<Sha1>>(secret.as_bytes(), body),
        SignatureAlgorithm::Sha256 => hmac_hex::<Hmac<Sha256>>(secret.as_bytes(), body),
        SignatureAlgorithm::Sha512 => hmac_hex::<Hmac<Sha512>>(secret.as_bytes(), body),
    }
}

fn hmac_hex<M: Mac + KeyInit>(key: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = <M as KeyInit>::new_from_slice(key).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}
