use hkdf::Hkdf;
use p256::{PublicKey, SecretKey};
use sha2::Sha256;

use crate::error::WebPushError;

/// Length of a P-256 ECDH shared secret (the X coordinate).
pub const SHARED_SECRET_LEN: usize = 32;

/// Computes the raw ECDH shared secret between our private key and a peer.
pub fn ecdh(private_key: &SecretKey, peer_public_key: &PublicKey) -> [u8; SHARED_SECRET_LEN] {
    let shared = p256::ecdh::diffie_hellman(private_key.to_nonzero_scalar(), peer_public_key.as_affine());

    let mut out = [0u8; SHARED_SECRET_LEN];
    out.copy_from_slice(shared.raw_secret_bytes());
    out
}

/// HKDF-SHA256 limited to a single expand block:
/// `HMAC(HMAC(salt, ikm), info || 0x01)` truncated to `N` bytes.
///
/// Every key in the `aes128gcm` scheme is at most 32 bytes, so `N` is
/// bounded at compile time.
pub fn hkdf_sha256<const N: usize>(ikm: &[u8], salt: &[u8], info: &[u8]) -> Result<[u8; N], WebPushError> {
    const { assert!(N <= 32, "single block HKDF yields at most 32 bytes") };

    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);

    let mut okm = [0u8; N];
    hk.expand(info, &mut okm).map_err(|_| WebPushError::Unspecified)?;

    Ok(okm)
}
