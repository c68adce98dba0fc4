use std::io::Read;

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::DecodePrivateKey;
use p256::{FieldBytes, PublicKey, SecretKey};
use rand_core::{CryptoRngCore, OsRng};

use crate::codec::{decode_base64, encode_base64};
use crate::error::WebPushError;

/// Length of an uncompressed SEC1 P-256 point: `0x04 || X || Y`.
pub const PUBLIC_KEY_LEN: usize = 65;
/// Length of a raw P-256 private scalar.
pub const PRIVATE_KEY_LEN: usize = 32;

const PAIR_PROBE: &[u8] = &[1, 2, 3];

/// The P-256 key pair identifying an application server.
///
/// Built once per sender and shared by every send. Constructors taking
/// external bytes check that the two halves belong together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VapidKeys {
    public_key: PublicKey,
    private_key: SecretKey,
}

impl VapidKeys {
    /// Generates a new random key pair from the operating system RNG.
    pub fn generate() -> VapidKeys {
        Self::generate_with(&mut OsRng)
    }

    pub fn generate_with(rng: &mut impl CryptoRngCore) -> VapidKeys {
        let private_key = SecretKey::random(rng);

        VapidKeys {
            public_key: private_key.public_key(),
            private_key,
        }
    }

    /// Builds the key pair from a private key, deriving the public half.
    pub fn from_private_key(private_key: SecretKey) -> VapidKeys {
        VapidKeys {
            public_key: private_key.public_key(),
            private_key,
        }
    }

    /// Imports an uncompressed public point and a raw private scalar.
    pub fn from_bytes(public_key: &[u8], private_key: &[u8]) -> Result<VapidKeys, WebPushError> {
        let public_key = import_public(public_key)?;
        let private_key = import_private(private_key)?;

        if !validate_pair(&public_key, &private_key) {
            return Err(WebPushError::InvalidKeyPair);
        }

        Ok(VapidKeys {
            public_key,
            private_key,
        })
    }

    /// Imports the base64url forms produced by [`VapidKeys::public_key_base64`]
    /// and [`VapidKeys::private_key_base64`].
    pub fn from_base64(public_key: &str, private_key: &str) -> Result<VapidKeys, WebPushError> {
        Self::from_bytes(&decode_base64(public_key)?, &decode_base64(private_key)?)
    }

    /// Reads a PEM encoded private key, either PKCS#8 (`PRIVATE KEY`) or
    /// SEC1 (`EC PRIVATE KEY`).
    ///
    /// ```bash,ignore
    /// openssl ecparam -name prime256v1 -genkey -noout -out private.pem
    /// ```
    pub fn from_pem<R: Read>(mut pk_pem: R) -> Result<VapidKeys, WebPushError> {
        let mut pem_key = Vec::new();
        pk_pem
            .read_to_end(&mut pem_key)
            .map_err(|e| WebPushError::DecodeError(format!("pem: {}", e)))?;

        let parsed = pem::parse(pem_key)?;

        match parsed.tag() {
            "PRIVATE KEY" => Self::from_pkcs8_der(parsed.contents()),
            "EC PRIVATE KEY" => Self::from_sec1_der(parsed.contents()),
            tag => Err(WebPushError::DecodeError(format!("unsupported pem tag {}", tag))),
        }
    }

    /// Reads a DER encoded private key, trying PKCS#8 first and SEC1 second.
    pub fn from_der<R: Read>(mut pk_der: R) -> Result<VapidKeys, WebPushError> {
        let mut der_key = Vec::new();
        pk_der
            .read_to_end(&mut der_key)
            .map_err(|e| WebPushError::DecodeError(format!("der: {}", e)))?;

        Self::from_pkcs8_der(&der_key).or_else(|_| Self::from_sec1_der(&der_key))
    }

    fn from_pkcs8_der(der: &[u8]) -> Result<VapidKeys, WebPushError> {
        SecretKey::from_pkcs8_der(der)
            .map(Self::from_private_key)
            .map_err(|e| WebPushError::DecodeError(format!("pkcs8: {}", e)))
    }

    fn from_sec1_der(der: &[u8]) -> Result<VapidKeys, WebPushError> {
        SecretKey::from_sec1_der(der)
            .map(Self::from_private_key)
            .map_err(|_| WebPushError::DecodeError("invalid sec1 private key".into()))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn private_key(&self) -> &SecretKey {
        &self.private_key
    }

    /// The uncompressed public point handed to the browser as
    /// `applicationServerKey` and sent as `k=` in the Authorization header.
    pub fn application_server_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        export_public(&self.public_key)
    }

    pub fn public_key_base64(&self) -> Result<String, WebPushError> {
        encode_base64(&self.application_server_key())
    }

    pub fn private_key_base64(&self) -> Result<String, WebPushError> {
        encode_base64(&export_private(&self.private_key))
    }
}

/// Decodes an uncompressed SEC1 point. Compressed points and points off the
/// curve are rejected.
pub fn import_public(bytes: &[u8]) -> Result<PublicKey, WebPushError> {
    if bytes.len() != PUBLIC_KEY_LEN {
        return Err(WebPushError::DecodeError(format!(
            "public key must be {} bytes, got {}",
            PUBLIC_KEY_LEN,
            bytes.len()
        )));
    }

    if bytes[0] != 0x04 {
        return Err(WebPushError::DecodeError("public key is not an uncompressed point".into()));
    }

    PublicKey::from_sec1_bytes(bytes).map_err(|_| WebPushError::DecodeError("public key is not on the P-256 curve".into()))
}

/// Decodes a raw big-endian scalar in the range `1..n`.
pub fn import_private(bytes: &[u8]) -> Result<SecretKey, WebPushError> {
    if bytes.len() != PRIVATE_KEY_LEN {
        return Err(WebPushError::DecodeError(format!(
            "private key must be {} bytes, got {}",
            PRIVATE_KEY_LEN,
            bytes.len()
        )));
    }

    SecretKey::from_bytes(FieldBytes::from_slice(bytes))
        .map_err(|_| WebPushError::DecodeError("private key scalar out of range".into()))
}

/// Always 65 bytes; the coordinates are fixed width and left zero padded.
pub fn export_public(key: &PublicKey) -> [u8; PUBLIC_KEY_LEN] {
    let point = key.to_encoded_point(false);
    let mut out = [0u8; PUBLIC_KEY_LEN];
    out.copy_from_slice(point.as_bytes());
    out
}

pub fn export_private(key: &SecretKey) -> [u8; PRIVATE_KEY_LEN] {
    let mut out = [0u8; PRIVATE_KEY_LEN];
    out.copy_from_slice(&key.to_bytes());
    out
}

/// Signs a short probe with `private_key` and verifies it with `public_key`.
/// Any failure means the keys are not a pair.
pub fn validate_pair(public_key: &PublicKey, private_key: &SecretKey) -> bool {
    let signing_key = SigningKey::from(private_key);
    let signature = match Signer::<Signature>::try_sign(&signing_key, PAIR_PROBE) {
        Ok(signature) => signature,
        Err(_) => return false,
    };

    VerifyingKey::from(public_key).verify(PAIR_PROBE, &signature).is_ok()
}
