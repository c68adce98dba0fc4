use chrono::Utc;
use http::{HeaderMap, StatusCode, Uri};
use rand_core::OsRng;

use crate::error::{ResponseInfo, WebPushError};
use crate::http_ece::encrypt_body;
use crate::message::{Notification, Subscription, Urgency, WebPushMessage};
use crate::request_builder::{build_headers, parse_response, SubscriptionState};
use crate::vapid::key::PUBLIC_KEY_LEN;
use crate::vapid::{
    Base64VapidKeysProvider, LazyVapidKeys, VapidKeys, VapidKeysProvider, VapidSigner, DEFAULT_EXPIRATION,
};

/// A long-lived sender: signs VAPID tokens and encrypts bodies for any
/// number of subscriptions.
///
/// Keys given up front are used as is. Keys behind a
/// [`VapidKeysProvider`] are resolved once, on first use, even when many
/// messages are prepared concurrently.
pub struct WebPush {
    subject: String,
    keys: LazyVapidKeys,
    expiration: u32,
}

impl WebPush {
    /// A sender with keys already in memory. The subject is a `mailto:` or
    /// `https://` contact for the push service operator.
    pub fn new<S: Into<String>>(subject: S, keys: VapidKeys) -> Result<WebPush, WebPushError> {
        Self::build(subject.into(), LazyVapidKeys::resolved(keys))
    }

    /// A sender with base64url keys, decoded and checked on first use.
    pub fn from_base64<S: Into<String>>(subject: S, public_key: &str, private_key: &str) -> Result<WebPush, WebPushError> {
        Self::with_provider(subject, Base64VapidKeysProvider::new(public_key, private_key))
    }

    /// A sender whose keys come from `provider` the first time they are needed.
    pub fn with_provider<S, P>(subject: S, provider: P) -> Result<WebPush, WebPushError>
    where
        S: Into<String>,
        P: VapidKeysProvider + 'static,
    {
        Self::build(subject.into(), LazyVapidKeys::new(provider))
    }

    fn build(subject: String, keys: LazyVapidKeys) -> Result<WebPush, WebPushError> {
        if !(subject.starts_with("mailto:") || subject.starts_with("https://")) {
            return Err(WebPushError::InvalidSubject);
        }

        Ok(WebPush {
            subject,
            keys,
            expiration: DEFAULT_EXPIRATION,
        })
    }

    /// Token lifetime in seconds, 12 hours unless set.
    pub fn set_expiration(&mut self, seconds: u32) {
        self.expiration = seconds;
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub async fn vapid_keys(&self) -> Result<&VapidKeys, WebPushError> {
        self.keys.get().await
    }

    /// The key to pass as `applicationServerKey` when subscribing in the browser.
    pub async fn application_server_key(&self) -> Result<[u8; PUBLIC_KEY_LEN], WebPushError> {
        Ok(self.keys.get().await?.application_server_key())
    }

    /// Headers for a message to `endpoint`, signed for the endpoint's origin.
    pub async fn get_headers(
        &self,
        endpoint: &str,
        ttl: Option<u32>,
        topic: Option<&str>,
        urgency: Option<Urgency>,
    ) -> Result<HeaderMap, WebPushError> {
        let endpoint: Uri = endpoint.parse()?;
        let audience = audience(&endpoint)?;

        trace!("Audience: {}", audience);

        let keys = self.keys.get().await?;
        let signature = VapidSigner::sign(keys, &self.subject, &audience, self.expiration, Utc::now())?;

        build_headers(&signature, ttl, topic, urgency)
    }

    /// Encrypts `payload` with a fresh ephemeral key and salt.
    pub fn get_body(&self, payload: &[u8], p256dh: &[u8], auth: &[u8]) -> Result<Vec<u8>, WebPushError> {
        encrypt_body(payload, p256dh, auth, &mut OsRng)
    }

    /// Headers and encrypted body for one notification, ready to post.
    pub async fn build_message(
        &self,
        subscription: &Subscription,
        notification: &Notification,
    ) -> Result<WebPushMessage, WebPushError> {
        let endpoint: Uri = subscription.endpoint.parse()?;

        let headers = self
            .get_headers(
                &subscription.endpoint,
                notification.ttl,
                notification.topic.as_deref(),
                notification.urgency,
            )
            .await?;

        let body = self.get_body(&notification.payload, &subscription.p256dh, &subscription.auth)?;

        Ok(WebPushMessage { endpoint, headers, body })
    }

    /// Interprets the push service's answer to a posted message.
    pub fn get_subscription_state(&self, status: u16, body: &[u8]) -> Result<SubscriptionState, WebPushError> {
        match StatusCode::from_u16(status) {
            Ok(status) => parse_response(status, body),
            Err(_) => Err(WebPushError::UnexpectedStatus(ResponseInfo::new(status, body))),
        }
    }
}

/// `scheme://authority` of a push endpoint.
fn audience(endpoint: &Uri) -> Result<String, WebPushError> {
    match (endpoint.scheme_str(), endpoint.authority()) {
        (Some(scheme), Some(authority)) => Ok(format!("{}://{}", scheme, authority)),
        _ => Err(WebPushError::InvalidUri),
    }
}
