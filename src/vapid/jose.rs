//! Conversion of ECDSA signatures from DER into the fixed width form used by
//! JWS (`r || s`, RFC 7518 section 3.4).

use crate::error::WebPushError;

const NUMBER_SIZE: usize = 32;
const SEQUENCE_TAG: u8 = 0x30;
const INTEGER_TAG: u8 = 0x02;
const ONE_BYTE_LENGTH: u8 = 0x81;

/// Length of a P-256 JOSE signature.
pub const JOSE_SIGNATURE_LEN: usize = 2 * NUMBER_SIZE;

/// Converts `SEQUENCE { INTEGER r, INTEGER s }` into 64 bytes.
///
/// Integers shorter than 32 bytes are left padded with zeros. Longer ones
/// keep their low 32 bytes, which drops the sign extension byte DER adds to
/// integers with the high bit set.
/// Only the short and the `0x81` one byte long length forms are accepted on
/// the outer sequence, which covers every P-256 signature.
pub fn der_to_jose(der: &[u8]) -> Result<[u8; JOSE_SIGNATURE_LEN], WebPushError> {
    if der.len() < 2 || der[0] != SEQUENCE_TAG {
        return Err(invalid("missing sequence"));
    }

    let (content_len, mut offset) = match der[1] {
        ONE_BYTE_LENGTH => (*der.get(2).ok_or_else(|| invalid("truncated length"))? as usize, 3),
        len if len < 0x80 => (len as usize, 2),
        _ => return Err(invalid("unsupported sequence length form")),
    };

    if offset + content_len != der.len() {
        return Err(invalid("sequence length does not match input"));
    }

    let mut jose = [0u8; JOSE_SIGNATURE_LEN];

    for slot in jose.chunks_exact_mut(NUMBER_SIZE) {
        let value = read_integer(der, &mut offset)?;
        let value = &value[value.len().saturating_sub(NUMBER_SIZE)..];
        slot[NUMBER_SIZE - value.len()..].copy_from_slice(value);
    }

    if offset != der.len() {
        return Err(invalid("trailing bytes after s"));
    }

    Ok(jose)
}

fn read_integer<'a>(der: &'a [u8], offset: &mut usize) -> Result<&'a [u8], WebPushError> {
    let header = der.get(*offset..*offset + 2).ok_or_else(|| invalid("truncated integer"))?;

    if header[0] != INTEGER_TAG {
        return Err(invalid("expected integer"));
    }

    let len = header[1] as usize;
    if len == 0 || len >= 0x80 {
        return Err(invalid("unsupported integer length"));
    }

    let start = *offset + 2;
    let value = der.get(start..start + len).ok_or_else(|| invalid("truncated integer"))?;
    *offset = start + len;

    Ok(value)
}

fn invalid(reason: &str) -> WebPushError {
    WebPushError::DecodeError(format!("der signature: {}", reason))
}
