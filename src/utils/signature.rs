use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub fn secrets_match(provided: &str, expected: &str) -> bool {
    ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into()
}

/// Hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign(body: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Accepts both bare hex and the `sha256=<hex>` form some gateways send.
pub fn verify_signature(body: &[u8], signature: &str, secret: &str) -> bool {
    let signature = signature.trim();
    let hex_part = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(provided) = hex::decode(hex_part) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}
