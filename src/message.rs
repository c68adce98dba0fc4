use std::fmt::{Display, Formatter};
use std::str::FromStr;

use http::{HeaderMap, Uri};

use crate::codec::decode_base64;
use crate::error::WebPushError;

/// Encryption keys from the client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubscriptionKeys {
    /// The public key, base64url
    pub p256dh: String,
    /// Authentication secret, base64url
    pub auth: String,
}

/// Client info for sending the notification. Maps the values from browser's
/// subscription info JSON data.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubscriptionInfo {
    /// The endpoint URI for sending the notification.
    pub endpoint: String,
    /// The encryption key and secret for payload encryption.
    pub keys: SubscriptionKeys,
}

impl SubscriptionInfo {
    /// A constructor function to create a new `SubscriptionInfo`, if not using
    /// Serde's serialization.
    pub fn new<S>(endpoint: S, p256dh: S, auth: S) -> SubscriptionInfo
    where
        S: Into<String>,
    {
        SubscriptionInfo {
            endpoint: endpoint.into(),
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }
}

/// A push subscription with its keys already decoded.
///
/// Lengths are checked when encrypting, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub endpoint: String,
    /// Uncompressed P-256 point, 65 bytes
    pub p256dh: Vec<u8>,
    /// 16 byte authentication secret
    pub auth: Vec<u8>,
}

impl Subscription {
    pub fn new<S: Into<String>>(endpoint: S, p256dh: Vec<u8>, auth: Vec<u8>) -> Subscription {
        Subscription {
            endpoint: endpoint.into(),
            p256dh,
            auth,
        }
    }
}

impl TryFrom<&SubscriptionInfo> for Subscription {
    type Error = WebPushError;

    fn try_from(info: &SubscriptionInfo) -> Result<Self, Self::Error> {
        Ok(Subscription {
            endpoint: info.endpoint.clone(),
            p256dh: decode_base64(&info.keys.p256dh)?,
            auth: decode_base64(&info.keys.auth)?,
        })
    }
}

/// Message urgency, sent as the `Urgency` header (RFC 8030 section 5.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    VeryLow,
    Low,
    Normal,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::VeryLow => "very-low",
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::High => "high",
        }
    }
}

impl Display for Urgency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = WebPushError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "very-low" => Ok(Urgency::VeryLow),
            "low" => Ok(Urgency::Low),
            "normal" => Ok(Urgency::Normal),
            "high" => Ok(Urgency::High),
            _ => Err(WebPushError::InvalidUrgency),
        }
    }
}

/// The plaintext of one push message and its delivery options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub payload: Vec<u8>,
    /// Seconds the push service keeps the message for an offline client.
    /// Defaults to 28 days when unset.
    pub ttl: Option<u32>,
    /// Replaces a pending message with the same topic.
    pub topic: Option<String>,
    pub urgency: Option<Urgency>,
}

impl Notification {
    pub fn new<P: Into<Vec<u8>>>(payload: P) -> Notification {
        Notification {
            payload: payload.into(),
            ..Default::default()
        }
    }

    pub fn set_ttl(&mut self, ttl: u32) {
        self.ttl = Some(ttl);
    }

    pub fn set_topic<S: Into<String>>(&mut self, topic: S) {
        self.topic = Some(topic.into());
    }

    pub fn set_urgency(&mut self, urgency: Urgency) {
        self.urgency = Some(urgency);
    }
}

/// Everything needed to send a push notification to the user.
#[derive(Debug, Clone)]
pub struct WebPushMessage {
    /// The endpoint URI where to send the payload.
    pub endpoint: Uri,
    /// `Authorization`, `Content-Encoding`, `Content-Type`, `TTL` and the
    /// optional `Urgency` and `Topic`.
    pub headers: HeaderMap,
    /// The encrypted `aes128gcm` body.
    pub body: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_info_from_browser_json() {
        let json = r#"{
            "endpoint": "https://fcm.googleapis.com/fcm/send/eKClHsXFm9E",
            "expirationTime": null,
            "keys": {
                "p256dh": "BGa4N1PI79lboMR_YrwCiCsgp35DRvedt7opHcf0yM3iOBTSoQYqQLwWxAfRKE6tsDnReWmhsImkhDF_DBdkNSU",
                "auth": "EvcWjEgzr4rbvhfi3yds0A"
            }
        }"#;

        let info: SubscriptionInfo = serde_json::from_str(json).unwrap();
        let subscription = Subscription::try_from(&info).unwrap();

        assert_eq!("https://fcm.googleapis.com/fcm/send/eKClHsXFm9E", subscription.endpoint);
        assert_eq!(65, subscription.p256dh.len());
        assert_eq!(16, subscription.auth.len());
    }

    #[test]
    fn test_subscription_info_with_bad_base64() {
        let info = SubscriptionInfo::new("https://example.com/push", "not base64!", "EvcWjEgzr4rbvhfi3yds0A");

        assert!(matches!(Subscription::try_from(&info), Err(WebPushError::DecodeError(_))));
    }

    #[test]
    fn test_urgency_strings() {
        for urgency in [Urgency::VeryLow, Urgency::Low, Urgency::Normal, Urgency::High] {
            assert_eq!(urgency, urgency.to_string().parse::<Urgency>().unwrap());
        }

        assert_eq!("very-low", Urgency::VeryLow.to_string());
        assert!(matches!("urgent".parse::<Urgency>(), Err(WebPushError::InvalidUrgency)));
        assert!(matches!("High".parse::<Urgency>(), Err(WebPushError::InvalidUrgency)));
        assert_eq!(r#""very-low""#, serde_json::to_string(&Urgency::VeryLow).unwrap());
    }

    #[test]
    fn test_notification_equality_covers_every_field() {
        let mut a = Notification::new("hello");
        a.set_ttl(60);
        a.set_topic("news");
        a.set_urgency(Urgency::High);

        let b = a.clone();
        assert_eq!(a, b);

        let mut different_ttl = a.clone();
        different_ttl.set_ttl(61);
        assert_ne!(a, different_ttl);

        let mut different_topic = a.clone();
        different_topic.topic = None;
        assert_ne!(a, different_topic);

        let mut different_urgency = a.clone();
        different_urgency.set_urgency(Urgency::Low);
        assert_ne!(a, different_urgency);

        assert_ne!(a, Notification::new("hello!"));
    }
}
