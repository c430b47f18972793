//! HMAC-SHA256 request signing and verification.
//!
//! The signed base string is always `METHOD|PATH_INCLUDING_QUERY|TIMESTAMP`
//! interpreted as UTF-8 bytes, matching §4.2/§4.12. Verification compares
//! digests in constant time via `subtle`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// The inbound timestamp window: a request's `X-Timestamp` must fall within
/// this many seconds of the server clock, in either direction.
pub const TIMESTAMP_WINDOW_SECS: i64 = 300;

/// Builds the canonical signed base string `METHOD|PATH_WITH_QUERY|TIMESTAMP`.
pub fn signing_base(method: &str, path_with_query: &str, timestamp: &str) -> String {
    format!("{method}|{path_with_query}|{timestamp}")
}

/// Computes the lowercase-hex HMAC-SHA256 signature over the canonical base.
pub fn sign(secret: &[u8], method: &str, path_with_query: &str, timestamp: &str) -> String {
    let base = signing_base(method, path_with_query, timestamp);
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(base.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a caller-supplied hex signature against the expected one, in
/// constant time. Returns `false` on any input mismatch, including
/// malformed hex.
pub fn verify(secret: &[u8], method: &str, path_with_query: &str, timestamp: &str, candidate_hex: &str) -> bool {
    let expected = sign(secret, method, path_with_query, timestamp);
    // Constant-time comparison over fixed-width byte buffers; `ct_eq` on the
    // raw strings would short-circuit on length, which candidate_hex's
    // length already leaks nothing secret about, but comparing decoded
    // bytes keeps the check case-insensitive-safe and symmetric.
    let (Ok(expected_bytes), Ok(candidate_bytes)) = (hex::decode(&expected), hex::decode(candidate_hex)) else {
        return false;
    };
    expected_bytes.ct_eq(&candidate_bytes).into()
}

/// Checks that `timestamp` (seconds since epoch, possibly fractional) is
/// within [`TIMESTAMP_WINDOW_SECS`] of `now` in either direction.
pub fn timestamp_in_window(timestamp: &str, now_secs: f64) -> bool {
    let Ok(ts) = timestamp.parse::<f64>() else { return false };
    (ts - now_secs).abs() <= TIMESTAMP_WINDOW_SECS as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_its_own_signature() {
        let secret = b"top-secret";
        let sig = sign(secret, "GET", "/health", "1700000000");
        assert!(verify(secret, "GET", "/health", "1700000000", &sig));
    }

    #[test]
    fn tampering_any_component_breaks_verification() {
        let secret = b"top-secret";
        let sig = sign(secret, "POST", "/add_element", "1700000000");
        assert!(!verify(secret, "GET", "/add_element", "1700000000", &sig));
        assert!(!verify(secret, "POST", "/add_element?x=1", "1700000000", &sig));
        assert!(!verify(secret, "POST", "/add_element", "1700000001", &sig));
        assert!(!verify(secret, "POST", "/add_element", "1700000000", "deadbeef"));
    }

    #[test]
    fn timestamp_window_boundaries() {
        assert!(timestamp_in_window("1000", 1000.0 + 300.0));
        assert!(!timestamp_in_window("1000", 1000.0 + 301.0));
        assert!(timestamp_in_window("1000", 1000.0 - 300.0));
    }

    #[test]
    fn malformed_timestamp_fails_closed() {
        assert!(!timestamp_in_window("not-a-number", 1000.0));
    }
}
