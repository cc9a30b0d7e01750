//! Svix signature verification for identity provider webhooks.
//!
//! Each delivery carries `svix-id`, `svix-timestamp` and `svix-signature`
//! headers. The signature is HMAC-SHA256 over `{id}.{timestamp}.{body}` keyed
//! with the base64 part of the `whsec_` signing secret; the header may hold
//! several space-separated `v1,<base64>` entries.

use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum clock distance accepted between the delivery timestamp and now
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("webhook signing secret is not valid base64")]
    InvalidSecret,
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("invalid svix-timestamp header")]
    InvalidTimestamp,
    #[error("webhook timestamp outside the tolerance window")]
    StaleTimestamp,
    #[error("no matching webhook signature")]
    InvalidSignature,
}

pub struct WebhookVerifier {
    keyed: HmacSha256,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = BASE64
            .decode(encoded)
            .map_err(|_| WebhookError::InvalidSecret)?;
        let keyed = HmacSha256::new_from_slice(&key).map_err(|_| WebhookError::InvalidSecret)?;
        Ok(Self { keyed })
    }

    fn mac(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(format!("{}.{}.", msg_id, timestamp).as_bytes());
        mac.update(payload);
        mac
    }

    /// Produce a `v1,<base64>` signature entry for a delivery
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> String {
        let tag = self.mac(msg_id, timestamp, payload).finalize().into_bytes();
        format!("v1,{}", BASE64.encode(tag))
    }

    /// Verify a delivery against the current clock
    pub fn verify(&self, headers: &HeaderMap, payload: &[u8]) -> Result<(), WebhookError> {
        self.verify_at(headers, payload, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        headers: &HeaderMap,
        payload: &[u8],
        now: i64,
    ) -> Result<(), WebhookError> {
        let msg_id = header(headers, "svix-id")?;
        let timestamp: i64 = header(headers, "svix-timestamp")?
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;
        let signatures = header(headers, "svix-signature")?;

        if (now - timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
            return Err(WebhookError::StaleTimestamp);
        }

        let matched = signatures
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|sig| BASE64.decode(sig).ok())
            .any(|sig| {
                self.mac(msg_id, timestamp, payload)
                    .verify_slice(&sig)
                    .is_ok()
            });

        if matched {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    // base64("studio-webhook-signing-key")
    const SECRET: &str = "whsec_c3R1ZGlvLXdlYmhvb2stc2lnbmluZy1rZXk=";
    const NOW: i64 = 1_760_000_000;
    const PAYLOAD: &[u8] = br#"{"type":"user.created","data":{}}"#;

    fn headers(msg_id: &str, timestamp: i64, signature: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("svix-id", HeaderValue::from_str(msg_id).unwrap());
        headers.insert(
            "svix-timestamp",
            HeaderValue::from_str(&timestamp.to_string()).unwrap(),
        );
        headers.insert("svix-signature", HeaderValue::from_str(signature).unwrap());
        headers
    }

    #[test]
    fn test_valid_signature_accepted() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = verifier.sign("msg_1", NOW, PAYLOAD);
        verifier
            .verify_at(&headers("msg_1", NOW, &sig), PAYLOAD, NOW + 10)
            .unwrap();
    }

    #[test]
    fn test_any_listed_signature_may_match() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = verifier.sign("msg_1", NOW, PAYLOAD);
        let list = format!("v1,AAAA v2,ignored {}", sig);
        verifier
            .verify_at(&headers("msg_1", NOW, &list), PAYLOAD, NOW)
            .unwrap();
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = verifier.sign("msg_1", NOW, PAYLOAD);
        let err = verifier
            .verify_at(&headers("msg_1", NOW, &sig), b"{}", NOW)
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidSignature));
    }

    #[test]
    fn test_other_secret_rejected() {
        let signer = WebhookVerifier::new("whsec_b3RoZXIta2V5").unwrap();
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = signer.sign("msg_1", NOW, PAYLOAD);
        assert!(verifier
            .verify_at(&headers("msg_1", NOW, &sig), PAYLOAD, NOW)
            .is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let sig = verifier.sign("msg_1", NOW, PAYLOAD);
        let err = verifier
            .verify_at(
                &headers("msg_1", NOW, &sig),
                PAYLOAD,
                NOW + TIMESTAMP_TOLERANCE_SECS + 1,
            )
            .unwrap_err();
        assert!(matches!(err, WebhookError::StaleTimestamp));
    }

    #[test]
    fn test_missing_header_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let mut h = headers("msg_1", NOW, "v1,AAAA");
        h.remove("svix-id");
        let err = verifier.verify_at(&h, PAYLOAD, NOW).unwrap_err();
        assert!(matches!(err, WebhookError::MissingHeader("svix-id")));
    }

    #[test]
    fn test_invalid_secret() {
        assert!(matches!(
            WebhookVerifier::new("whsec_!!!not-base64"),
            Err(WebhookError::InvalidSecret)
        ));
    }
}
