//! The `aes128gcm` content encoding for Web Push (RFC 8188, RFC 8291).
//!
//! Bodies are always written as a single record:
//!
//! ```text
//! salt(16) | rs(4, BE, 4096) | idlen(1, 65) | keyid(65) | AES-128-GCM(payload | 0x02)
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Nonce};
use p256::SecretKey;
use rand_core::CryptoRngCore;

use crate::codec::concat_bytes;
use crate::error::WebPushError;
use crate::http_ece::derive::{ecdh, hkdf_sha256};
use crate::vapid::key::{export_public, import_public, PUBLIC_KEY_LEN};

pub const SALT_LEN: usize = 16;
pub const AUTH_SECRET_LEN: usize = 16;
pub const RECORD_SIZE: u32 = 4096;
pub const TAG_LEN: usize = 16;
/// `salt | rs | idlen | keyid`
pub const HEADER_LEN: usize = SALT_LEN + 4 + 1 + PUBLIC_KEY_LEN;
/// Largest payload that still fits a single record next to the delimiter
/// and the tag.
pub const MAX_PAYLOAD_LEN: usize = RECORD_SIZE as usize - 1 - TAG_LEN;

const WEBPUSH_INFO: &[u8] = b"WebPush: info\0";
const KEY_INFO: &[u8] = b"Content-Encoding: aes128gcm\0";
const NONCE_INFO: &[u8] = b"Content-Encoding: nonce\0";
const LAST_RECORD_DELIMITER: u8 = 0x02;

/// Encrypts `payload` for the subscriber identified by `p256dh` and `auth`.
///
/// A fresh ephemeral key pair and salt are drawn from `rng` on every call.
pub fn encrypt_body(
    payload: &[u8],
    p256dh: &[u8],
    auth: &[u8],
    rng: &mut impl CryptoRngCore,
) -> Result<Vec<u8>, WebPushError> {
    let ephemeral_key = SecretKey::random(&mut *rng);

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);

    encrypt_predictably(payload, p256dh, auth, &salt, &ephemeral_key)
}

fn encrypt_predictably(
    payload: &[u8],
    p256dh: &[u8],
    auth: &[u8],
    salt: &[u8; SALT_LEN],
    ephemeral_key: &SecretKey,
) -> Result<Vec<u8>, WebPushError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(WebPushError::PayloadTooLarge);
    }

    let subscriber_key = import_public(p256dh)?;
    check_auth_secret(auth)?;

    let ephemeral_public = export_public(&ephemeral_key.public_key());
    let shared_secret = ecdh(ephemeral_key, &subscriber_key);

    let (key, nonce) = derive_key_and_nonce(&shared_secret, auth, p256dh, &ephemeral_public, salt)?;

    let mut plaintext = Vec::with_capacity(payload.len() + 1);
    plaintext.extend_from_slice(payload);
    plaintext.push(LAST_RECORD_DELIMITER);

    let cipher = Aes128Gcm::new_from_slice(&key).map_err(|_| WebPushError::Unspecified)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| WebPushError::Unspecified)?;

    let body = concat_bytes(&[
        salt,
        &RECORD_SIZE.to_be_bytes(),
        &[PUBLIC_KEY_LEN as u8],
        &ephemeral_public,
        &ciphertext,
    ]);

    debug!("Encrypted {} byte payload into {} byte body", payload.len(), body.len());

    Ok(body)
}

/// Reverses [`encrypt_body`] with the subscriber's private key, returning the
/// payload with the record padding removed.
pub fn decrypt_body(body: &[u8], private_key: &SecretKey, auth: &[u8]) -> Result<Vec<u8>, WebPushError> {
    let mut plaintext = decrypt_record(body, private_key, auth)?;

    while plaintext.last() == Some(&0) {
        plaintext.pop();
    }

    match plaintext.pop() {
        Some(LAST_RECORD_DELIMITER) => Ok(plaintext),
        _ => Err(WebPushError::DecodeError("missing last record delimiter".into())),
    }
}

/// Opens the single record of a body, delimiter and padding included.
fn decrypt_record(body: &[u8], private_key: &SecretKey, auth: &[u8]) -> Result<Vec<u8>, WebPushError> {
    check_auth_secret(auth)?;

    if body.len() < HEADER_LEN + TAG_LEN {
        return Err(WebPushError::DecodeError(format!("body of {} bytes is too short", body.len())));
    }

    let (salt, rest) = body.split_at(SALT_LEN);
    let (record_size, rest) = rest.split_at(4);
    let key_id_len = rest[0] as usize;

    if key_id_len != PUBLIC_KEY_LEN {
        return Err(WebPushError::DecodeError(format!("unexpected key id length {}", key_id_len)));
    }

    let (key_id, ciphertext) = rest[1..].split_at(PUBLIC_KEY_LEN);
    let record_size = u32::from_be_bytes([record_size[0], record_size[1], record_size[2], record_size[3]]);

    if ciphertext.len() > record_size as usize {
        return Err(WebPushError::DecodeError("body holds more than one record".into()));
    }

    let sender_key = import_public(key_id)?;
    let recipient_public = export_public(&private_key.public_key());
    let shared_secret = ecdh(private_key, &sender_key);

    let (key, nonce) = derive_key_and_nonce(&shared_secret, auth, &recipient_public, key_id, salt)?;

    let cipher = Aes128Gcm::new_from_slice(&key).map_err(|_| WebPushError::Unspecified)?;
    cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext)
        .map_err(|_| WebPushError::DecryptionFailed)
}

fn derive_key_and_nonce(
    shared_secret: &[u8],
    auth: &[u8],
    subscriber_public: &[u8],
    sender_public: &[u8],
    salt: &[u8],
) -> Result<([u8; 16], [u8; 12]), WebPushError> {
    let info = concat_bytes(&[WEBPUSH_INFO, subscriber_public, sender_public]);
    let derived_secret = hkdf_sha256::<32>(shared_secret, auth, &info)?;

    Ok((
        hkdf_sha256::<16>(&derived_secret, salt, KEY_INFO)?,
        hkdf_sha256::<12>(&derived_secret, salt, NONCE_INFO)?,
    ))
}

fn check_auth_secret(auth: &[u8]) -> Result<(), WebPushError> {
    if auth.len() != AUTH_SECRET_LEN {
        return Err(WebPushError::DecodeError(format!(
            "auth secret must be {} bytes, got {}",
            AUTH_SECRET_LEN,
            auth.len()
        )));
    }

    Ok(())
}
