//! Payload encryption for push messages.

pub mod aes128gcm;
pub mod derive;

pub use self::aes128gcm::{decrypt_body, encrypt_body};
pub use self::derive::{ecdh, hkdf_sha256};

/// The only content encoding produced by this crate.
pub const CONTENT_ENCODING: &str = "aes128gcm";
