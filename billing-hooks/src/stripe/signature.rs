//! Stripe webhook signature verification (HMAC-SHA256)

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::errors::SignatureError;

/// Verify a `Stripe-Signature` header against the raw request body.
///
/// The header looks like `t=1700000000,v1=<hex>,v1=<hex>,v0=<hex>`. Any `v1`
/// entry matching `HMAC(secret, "{t}.{payload}")` is accepted; `now` and
/// `t` must be within `tolerance_secs` of each other.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err(SignatureError::Malformed);
    }

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Constant-time comparison via hmac::verify_slice
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(SignatureError::Mismatch);
    }

    // Reject replays of old deliveries
    let ts: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
    if now.abs_diff(ts) > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    Ok(())
}

/// Compute a `Stripe-Signature` header value for `payload` at `timestamp`.
///
/// Used by tests and local tooling that replay deliveries.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let sig = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={sig}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"id":"evt_1"}"#;
        let header = sign_payload(payload, SECRET, NOW);
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, 300, NOW + 10),
            Ok(())
        );
    }

    #[test]
    fn test_any_v1_entry_may_match() {
        let payload = br#"{"id":"evt_1"}"#;
        let good = sign_payload(payload, SECRET, NOW);
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t={NOW},v1={},v1={good_sig},v0=abc", "00".repeat(32));
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, 300, NOW),
            Ok(())
        );
    }

    #[test]
    fn test_tampered_payload() {
        let header = sign_payload(br#"{"id":"evt_1"}"#, SECRET, NOW);
        assert_eq!(
            verify_webhook_signature(br#"{"id":"evt_2"}"#, &header, SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let payload = b"{}";
        let header = sign_payload(payload, "whsec_other", NOW);
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_stale_timestamp() {
        let payload = b"{}";
        let header = sign_payload(payload, SECRET, NOW);
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, 300, NOW + 301),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_extreme_timestamp_is_expired() {
        let payload = b"{}";
        for ts in [i64::MIN, i64::MAX] {
            let header = sign_payload(payload, SECRET, ts);
            assert_eq!(
                verify_webhook_signature(payload, &header, SECRET, 300, NOW),
                Err(SignatureError::Expired)
            );
        }
    }

    #[test]
    fn test_malformed_headers() {
        for header in ["", "t=1700000000", "v1=abcd", "garbage", "t=,v1="] {
            assert_eq!(
                verify_webhook_signature(b"{}", header, SECRET, 300, NOW),
                Err(SignatureError::Malformed),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn test_non_hex_signature_is_mismatch() {
        let header = format!("t={NOW},v1=zzzz");
        assert_eq!(
            verify_webhook_signature(b"{}", &header, SECRET, 300, NOW),
            Err(SignatureError::Mismatch)
        );
    }
}
