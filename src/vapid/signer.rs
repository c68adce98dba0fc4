use chrono::{DateTime, Utc};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::SecretKey;

use crate::codec::encode_base64;
use crate::error::WebPushError;
use crate::vapid::jose::der_to_jose;
use crate::vapid::VapidKeys;

/// Token lifetime used when the caller does not configure one, in seconds.
pub const DEFAULT_EXPIRATION: u32 = 12 * 60 * 60;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for JwtHeader {
    fn default() -> Self {
        JwtHeader {
            alg: "ES256".into(),
            typ: "JWT".into(),
        }
    }
}

/// The claims of a VAPID token, serialized in this field order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub aud: String,
    pub exp: i64,
}

/// A signed VAPID token together with the public key it verifies against.
#[derive(Debug, Clone)]
pub struct VapidSignature {
    /// The compact JWT
    pub auth_t: String,
    /// The base64url application server key
    pub auth_k: String,
}

impl VapidSignature {
    /// The value of the `Authorization` header for the `aes128gcm` encoding.
    pub fn authorization(&self) -> String {
        format!("vapid t={}, k={}", self.auth_t, self.auth_k)
    }
}

impl<'a> From<&'a VapidSignature> for String {
    fn from(signature: &'a VapidSignature) -> String {
        signature.authorization()
    }
}

pub struct VapidSigner {}

impl VapidSigner {
    /// Signs a token for `audience` (scheme and authority of the push
    /// endpoint) expiring `expiration` seconds after `now`.
    pub fn sign(
        keys: &VapidKeys,
        subject: &str,
        audience: &str,
        expiration: u32,
        now: DateTime<Utc>,
    ) -> Result<VapidSignature, WebPushError> {
        let auth_t = build_token(subject, audience, expiration, keys.private_key(), now)?;
        let auth_k = keys.public_key_base64()?;

        trace!("Public key: {}", auth_k);

        Ok(VapidSignature { auth_t, auth_k })
    }
}

/// Builds the compact ES256 JWT `header.payload.signature`.
pub fn build_token(
    subject: &str,
    audience: &str,
    expiration: u32,
    private_key: &SecretKey,
    now: DateTime<Utc>,
) -> Result<String, WebPushError> {
    let claims = Claims {
        sub: subject.to_string(),
        aud: audience.to_string(),
        exp: now.timestamp() + i64::from(expiration),
    };

    trace!("Signing claims: aud={}, exp={}", claims.aud, claims.exp);

    let signing_input = format!(
        "{}.{}",
        encode_base64(serde_json::to_string(&JwtHeader::default())?.as_bytes())?,
        encode_base64(serde_json::to_string(&claims)?.as_bytes())?
    );

    let signing_key = SigningKey::from(private_key);
    let signature = Signer::<Signature>::try_sign(&signing_key, signing_input.as_bytes())
        .map_err(|_| WebPushError::Unspecified)?;
    let signature = der_to_jose(signature.to_der().as_bytes())?;

    Ok(format!("{}.{}", signing_input, encode_base64(&signature)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_base64;
    use chrono::TimeZone;
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::VerifyingKey;

    const AUDIENCE: &str = "https://push.example.com";
    const SUBJECT: &str = "mailto:admin@example.com";

    fn segments(token: &str) -> Vec<&str> {
        token.split('.').collect()
    }

    #[test]
    fn test_token_has_three_segments_and_fixed_header() {
        let keys = VapidKeys::generate();
        let token = build_token(SUBJECT, AUDIENCE, DEFAULT_EXPIRATION, keys.private_key(), Utc::now()).unwrap();

        assert_eq!(2, token.matches('.').count());
        assert!(!token.contains('='));

        let header = decode_base64(segments(&token)[0]).unwrap();
        assert_eq!(br#"{"alg":"ES256","typ":"JWT"}"#, &header[..]);
    }

    #[test]
    fn test_payload_is_compact_and_ordered() {
        let keys = VapidKeys::generate();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let token = build_token(SUBJECT, AUDIENCE, 60, keys.private_key(), now).unwrap();

        let payload = decode_base64(segments(&token)[1]).unwrap();

        assert_eq!(
            r#"{"sub":"mailto:admin@example.com","aud":"https://push.example.com","exp":1704067260}"#,
            std::str::from_utf8(&payload).unwrap()
        );
    }

    #[test]
    fn test_exp_is_now_plus_expiration() {
        let keys = VapidKeys::generate();
        let before = Utc::now().timestamp();
        let token = build_token(SUBJECT, AUDIENCE, DEFAULT_EXPIRATION, keys.private_key(), Utc::now()).unwrap();

        let claims: Claims = serde_json::from_slice(&decode_base64(segments(&token)[1]).unwrap()).unwrap();
        let expected = before + i64::from(DEFAULT_EXPIRATION);

        assert!((claims.exp - expected).abs() <= 2);
        assert_eq!(SUBJECT, claims.sub);
        assert_eq!(AUDIENCE, claims.aud);
    }

    #[test]
    fn test_signature_verifies_with_public_key() {
        let keys = VapidKeys::generate();
        let token = build_token(SUBJECT, AUDIENCE, DEFAULT_EXPIRATION, keys.private_key(), Utc::now()).unwrap();

        let parts = segments(&token);
        let raw = decode_base64(parts[2]).unwrap();
        assert_eq!(64, raw.len());

        let signature = Signature::from_slice(&raw).unwrap();
        let signing_input = format!("{}.{}", parts[0], parts[1]);
        let verifying_key = VerifyingKey::from(keys.public_key());

        assert!(verifying_key.verify(signing_input.as_bytes(), &signature).is_ok());
        assert!(verifying_key.verify(b"tampered", &signature).is_err());
    }

    #[test]
    fn test_token_verifies_with_jwt_simple() {
        use jwt_simple::prelude::*;

        let keys = VapidKeys::generate();
        let token = build_token(SUBJECT, AUDIENCE, DEFAULT_EXPIRATION, keys.private_key(), chrono::Utc::now()).unwrap();

        let public_key = ES256PublicKey::from_bytes(&keys.application_server_key()).unwrap();
        let claims = public_key.verify_token::<NoCustomClaims>(&token, None).unwrap();

        assert_eq!(Some(SUBJECT.to_string()), claims.subject);
    }

    #[test]
    fn test_vapid_signature_authorization_format() {
        let vapid_signature = &VapidSignature {
            auth_t: String::from("foo"),
            auth_k: String::from("bar"),
        };

        let header_value: String = vapid_signature.into();

        assert_eq!("vapid t=foo, k=bar", &header_value);
    }

    #[test]
    fn test_signer_attaches_application_server_key() {
        let keys = VapidKeys::generate();
        let signature = VapidSigner::sign(&keys, SUBJECT, AUDIENCE, 60, Utc::now()).unwrap();

        assert_eq!(keys.public_key_base64().unwrap(), signature.auth_k);
        assert_eq!(2, signature.auth_t.matches('.').count());
    }
}
