//! Base64url and byte helpers shared by the token and body builders.

use ct_codecs::{Base64UrlSafeNoPadding, Decoder, Encoder};

use crate::error::WebPushError;

/// Encodes bytes as base64url without padding.
pub fn encode_base64(bytes: &[u8]) -> Result<String, WebPushError> {
    Ok(Base64UrlSafeNoPadding::encode_to_string(bytes)?)
}

/// Decodes base64url. Trailing `=` padding is tolerated, since some browsers
/// still hand out padded subscription keys.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, WebPushError> {
    Ok(Base64UrlSafeNoPadding::decode_to_vec(encoded, Some(b"="))?)
}

pub fn concat_bytes(parts: &[&[u8]]) -> Vec<u8> {
    let mut result = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());

    for part in parts {
        result.extend_from_slice(part);
    }

    result
}
