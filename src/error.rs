use std::{error::Error, fmt};

use http::header::InvalidHeaderValue;
use http::uri::InvalidUri;
use serde_json::error::Error as JsonError;

/// Status code and a bounded excerpt of the push service response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub code: u16,
    pub body: String,
}

impl ResponseInfo {
    /// Longest body excerpt kept for diagnostics, in characters.
    pub const MAX_BODY_CHARS: usize = 200;

    pub fn new(code: u16, body: &[u8]) -> ResponseInfo {
        ResponseInfo {
            code,
            body: String::from_utf8_lossy(body).chars().take(Self::MAX_BODY_CHARS).collect(),
        }
    }
}

impl fmt::Display for ResponseInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "status {}: {}", self.code, self.body)
    }
}

#[derive(Debug, Clone)]
pub enum WebPushError {
    /// Malformed base64, key, point, secret, record or signature bytes
    DecodeError(String),
    /// The public key does not belong to the private key
    InvalidKeyPair,
    /// The VAPID subject must start with `mailto:` or `https://`
    InvalidSubject,
    /// The provided URI is invalid or has no scheme and authority
    InvalidUri,
    /// The Topic value provided was invalid
    InvalidTopic,
    /// Urgency must be one of `very-low`, `low`, `normal` or `high`
    InvalidUrgency,
    /// A claim had invalid data
    InvalidClaims,
    /// A header could not be represented as an HTTP header value
    InvalidHeaderValue,
    /// The payload does not fit into a single 4096 byte record
    PayloadTooLarge,
    /// The authentication tag did not match while decrypting
    DecryptionFailed,
    /// The deferred VAPID key provider failed
    KeyProvider(String),
    /// A cryptographic primitive failed unexpectedly
    Unspecified,
    /// The push service rejected the VAPID credentials (401, 403)
    AuthenticationFailed(ResponseInfo),
    /// The push service is temporarily unavailable (502, 503)
    ServiceUnavailable(ResponseInfo),
    /// Any status code without a defined meaning
    UnexpectedStatus(ResponseInfo),
}

impl Error for WebPushError {}

impl From<JsonError> for WebPushError {
    fn from(_: JsonError) -> WebPushError {
        WebPushError::InvalidClaims
    }
}

impl From<InvalidUri> for WebPushError {
    fn from(_: InvalidUri) -> WebPushError {
        WebPushError::InvalidUri
    }
}

impl From<InvalidHeaderValue> for WebPushError {
    fn from(_: InvalidHeaderValue) -> WebPushError {
        WebPushError::InvalidHeaderValue
    }
}

impl From<ct_codecs::Error> for WebPushError {
    fn from(err: ct_codecs::Error) -> WebPushError {
        WebPushError::DecodeError(format!("base64: {:?}", err))
    }
}

impl From<pem::PemError> for WebPushError {
    fn from(err: pem::PemError) -> WebPushError {
        WebPushError::DecodeError(format!("pem: {}", err))
    }
}

impl WebPushError {
    pub fn short_description(&self) -> &'static str {
        match *self {
            WebPushError::DecodeError(_) => "decode_error",
            WebPushError::InvalidKeyPair => "invalid_key_pair",
            WebPushError::InvalidSubject => "invalid_subject",
            WebPushError::InvalidUri => "invalid_uri",
            WebPushError::InvalidTopic => "invalid_topic",
            WebPushError::InvalidUrgency => "invalid_urgency",
            WebPushError::InvalidClaims => "invalid_claims",
            WebPushError::InvalidHeaderValue => "invalid_header_value",
            WebPushError::PayloadTooLarge => "payload_too_large",
            WebPushError::DecryptionFailed => "decryption_failed",
            WebPushError::KeyProvider(_) => "key_provider",
            WebPushError::Unspecified => "unspecified",
            WebPushError::AuthenticationFailed(_) => "authentication_failed",
            WebPushError::ServiceUnavailable(_) => "service_unavailable",
            WebPushError::UnexpectedStatus(_) => "unexpected_status",
        }
    }

    /// The HTTP status code, if the error came from a push service response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            WebPushError::AuthenticationFailed(info)
            | WebPushError::ServiceUnavailable(info)
            | WebPushError::UnexpectedStatus(info) => Some(info.code),
            _ => None,
        }
    }
}

impl fmt::Display for WebPushError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WebPushError::DecodeError(reason) => write!(f, "could not decode input: {}", reason),
            WebPushError::InvalidKeyPair => write!(f, "public key does not match private key"),
            WebPushError::InvalidSubject => write!(f, "subject must start with 'mailto:' or 'https://'"),
            WebPushError::InvalidUri => write!(f, "invalid uri provided"),
            WebPushError::InvalidTopic => write!(f, "invalid topic value"),
            WebPushError::InvalidUrgency => write!(f, "invalid urgency value"),
            WebPushError::InvalidClaims => write!(f, "at least one jwt claim was invalid"),
            WebPushError::InvalidHeaderValue => write!(f, "invalid http header value"),
            WebPushError::PayloadTooLarge => write!(f, "payload does not fit into a single record"),
            WebPushError::DecryptionFailed => write!(f, "authentication tag mismatch"),
            WebPushError::KeyProvider(reason) => write!(f, "vapid key provider failed: {}", reason),
            WebPushError::Unspecified => write!(f, "unspecified error"),
            WebPushError::AuthenticationFailed(info) => write!(f, "authentication failed: {}", info),
            WebPushError::ServiceUnavailable(info) => write!(f, "service unavailable: {}", info),
            WebPushError::UnexpectedStatus(info) => write!(f, "unexpected response: {}", info),
        }
    }
}
