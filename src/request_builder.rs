//! Functions used to produce and consume push http messages.
//! Sending them is left to whatever HTTP client the caller uses.

use http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, Request, StatusCode};

use crate::error::{ResponseInfo, WebPushError};
use crate::http_ece::CONTENT_ENCODING as AES128GCM;
use crate::message::{Urgency, WebPushMessage};
use crate::vapid::VapidSignature;

/// 28 days, the `TTL` sent when the notification does not set one.
pub const DEFAULT_TTL: u32 = 28 * 24 * 60 * 60;

const MAX_TOPIC_LEN: usize = 32;

/// What a push service response says about the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// The message was accepted.
    Active,
    /// The subscription is gone and should be deleted.
    Expired,
}

/// Builds the header map for one `aes128gcm` message.
pub fn build_headers(
    signature: &VapidSignature,
    ttl: Option<u32>,
    topic: Option<&str>,
    urgency: Option<Urgency>,
) -> Result<HeaderMap, WebPushError> {
    let mut headers = HeaderMap::new();

    headers.insert(AUTHORIZATION, HeaderValue::from_str(&signature.authorization())?);
    headers.insert(CONTENT_ENCODING, HeaderValue::from_static(AES128GCM));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    headers.insert(HeaderName::from_static("ttl"), HeaderValue::from(ttl.unwrap_or(DEFAULT_TTL)));

    if let Some(urgency) = urgency {
        headers.insert(HeaderName::from_static("urgency"), HeaderValue::from_static(urgency.as_str()));
    }

    if let Some(topic) = topic {
        validate_topic(topic)?;
        headers.insert(HeaderName::from_static("topic"), HeaderValue::from_str(topic)?);
    }

    Ok(headers)
}

/// Topics are at most 32 characters of the URL-safe base64 alphabet
/// (RFC 8030 section 5.4).
fn validate_topic(topic: &str) -> Result<(), WebPushError> {
    let valid = !topic.is_empty()
        && topic.len() <= MAX_TOPIC_LEN
        && topic.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if valid {
        Ok(())
    } else {
        Err(WebPushError::InvalidTopic)
    }
}

/// Builds the request to send to the push service.
///
/// This function is generic over the request body, this means that you can swap out client implementations
/// even if they use different body types.
pub fn build_request<T>(message: WebPushMessage) -> Result<Request<T>, WebPushError>
where
    T: From<Vec<u8>>,
{
    let mut builder = Request::builder()
        .method("POST")
        .uri(message.endpoint)
        .header(CONTENT_LENGTH, message.body.len());

    if let Some(headers) = builder.headers_mut() {
        headers.extend(message.headers);
    }

    builder.body(message.body.into()).map_err(|_| WebPushError::InvalidUri)
}

/// Maps the push service response status to a subscription state.
///
/// Expired subscriptions are a normal outcome; every failure carries the status
/// code and the start of the response body.
pub fn parse_response(response_status: StatusCode, body: &[u8]) -> Result<SubscriptionState, WebPushError> {
    trace!("Response status: {}", response_status);

    match response_status.as_u16() {
        200 | 201 | 202 => Ok(SubscriptionState::Active),
        404 | 410 => Ok(SubscriptionState::Expired),
        401 | 403 => Err(WebPushError::AuthenticationFailed(ResponseInfo::new(response_status.as_u16(), body))),
        502 | 503 => Err(WebPushError::ServiceUnavailable(ResponseInfo::new(response_status.as_u16(), body))),
        code => {
            debug!("Unexpected response: {} {:?}", code, std::str::from_utf8(body));
            Err(WebPushError::UnexpectedStatus(ResponseInfo::new(code, body)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn signature() -> VapidSignature {
        VapidSignature {
            auth_t: String::from("foo"),
            auth_k: String::from("bar"),
        }
    }

    #[test]
    fn test_headers_with_defaults() {
        let headers = build_headers(&signature(), None, None, None).unwrap();

        assert_eq!("vapid t=foo, k=bar", headers.get("Authorization").unwrap());
        assert_eq!("aes128gcm", headers.get("Content-Encoding").unwrap());
        assert_eq!("application/octet-stream", headers.get("Content-Type").unwrap());
        assert_eq!("2419200", headers.get("TTL").unwrap());
        assert!(headers.get("Urgency").is_none());
        assert!(headers.get("Topic").is_none());
        assert_eq!(4, headers.len());
    }

    #[test]
    fn test_headers_with_options() {
        let headers = build_headers(&signature(), Some(420), Some("some-topic"), Some(Urgency::VeryLow)).unwrap();

        assert_eq!("420", headers.get("TTL").unwrap());
        assert_eq!("very-low", headers.get("Urgency").unwrap());
        assert_eq!("some-topic", headers.get("Topic").unwrap());
    }

    #[test]
    fn test_authorization_header_format() {
        let auth_re = Regex::new(r"^vapid t=(?P<sig_t>[^,]*), k=(?P<sig_k>[^,]*)$").unwrap();
        let headers = build_headers(&signature(), None, None, None).unwrap();

        let auth = headers.get("Authorization").unwrap().to_str().unwrap();
        let captures = auth_re.captures(auth).unwrap();

        assert_eq!(&captures["sig_t"], "foo");
        assert_eq!(&captures["sig_k"], "bar");
    }

    #[test]
    fn test_invalid_topics_are_rejected() {
        for topic in ["", "has space", "slash/", "a".repeat(33).as_str()] {
            assert!(matches!(
                build_headers(&signature(), None, Some(topic), None),
                Err(WebPushError::InvalidTopic)
            ));
        }

        assert!(build_headers(&signature(), None, Some(&"a".repeat(32)), None).is_ok());
    }

    #[test]
    fn test_builds_a_correct_request() {
        let message = WebPushMessage {
            endpoint: "https://fcm.googleapis.com/fcm/send/abc".parse().unwrap(),
            headers: build_headers(&signature(), Some(60), None, None).unwrap(),
            body: vec![0u8; 103],
        };

        let request = build_request::<Vec<u8>>(message).unwrap();

        assert_eq!("POST", request.method());
        assert_eq!(Some("fcm.googleapis.com"), request.uri().host());
        assert_eq!("103", request.headers().get("Content-Length").unwrap());
        assert_eq!("60", request.headers().get("TTL").unwrap());
        assert_eq!("aes128gcm", request.headers().get("Content-Encoding").unwrap());
        assert_eq!(103, request.body().len());
    }

    #[test]
    fn test_parses_active_responses() {
        for status in [StatusCode::OK, StatusCode::CREATED, StatusCode::ACCEPTED] {
            assert_eq!(SubscriptionState::Active, parse_response(status, b"").unwrap());
        }
    }

    #[test]
    fn test_parses_expired_responses() {
        for status in [StatusCode::NOT_FOUND, StatusCode::GONE] {
            assert_eq!(SubscriptionState::Expired, parse_response(status, b"").unwrap());
        }
    }

    #[test]
    fn test_parses_authentication_failures() {
        for code in [401, 403] {
            let status = StatusCode::from_u16(code).unwrap();

            assert!(matches!(
                parse_response(status, b"invalid token"),
                Err(WebPushError::AuthenticationFailed(ResponseInfo { code: c, ref body })) if c == code && body == "invalid token"
            ));
        }
    }

    #[test]
    fn test_parses_service_unavailable() {
        for code in [502, 503] {
            let status = StatusCode::from_u16(code).unwrap();

            assert!(matches!(
                parse_response(status, b""),
                Err(WebPushError::ServiceUnavailable(ResponseInfo { code: c, .. })) if c == code
            ));
        }
    }

    #[test]
    fn test_parses_unexpected_status_with_bounded_body() {
        let body = "t".repeat(1000);

        match parse_response(StatusCode::IM_A_TEAPOT, body.as_bytes()) {
            Err(WebPushError::UnexpectedStatus(info)) => {
                assert_eq!(418, info.code);
                assert_eq!(200, info.body.len());
            }
            other => panic!("unexpected result {:?}", other),
        }

        assert!(matches!(
            parse_response(StatusCode::INTERNAL_SERVER_ERROR, b""),
            Err(WebPushError::UnexpectedStatus(ResponseInfo { code: 500, .. }))
        ));
    }
}
