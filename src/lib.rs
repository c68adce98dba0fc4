//! # Web Push
//!
//! The sender side of Web Push: `aes128gcm` payload encryption (RFC 8291)
//! and VAPID authorization (RFC 8292). The crate prepares headers and an
//! encrypted body; posting them is up to the HTTP client of your choice.
//!
//! ```no_run
//! # use web_push_core::*;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = VapidKeys::from_pem(std::fs::File::open("private.pem")?)?;
//! let web_push = WebPush::new("mailto:ops@example.com", keys)?;
//!
//! let info: SubscriptionInfo = serde_json::from_str(r#"{
//!     "endpoint": "https://updates.push.services.mozilla.com/wpush/v1/...",
//!     "keys": {"p256dh": "...", "auth": "..."}
//! }"#)?;
//! let subscription = Subscription::try_from(&info)?;
//!
//! let mut notification = Notification::new("Encrypted payload to be sent in the notification");
//! notification.set_ttl(3600);
//!
//! let message = web_push.build_message(&subscription, &notification).await?;
//! let request: http::Request<Vec<u8>> = build_request(message)?;
//!
//! // ... send `request`, then:
//! if let Ok(SubscriptionState::Expired) = web_push.get_subscription_state(410, b"") {
//!     // forget the subscription
//! }
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub use crate::error::{ResponseInfo, WebPushError};
pub use crate::http_ece::{decrypt_body, encrypt_body};
pub use crate::message::{Notification, Subscription, SubscriptionInfo, SubscriptionKeys, Urgency, WebPushMessage};
pub use crate::request_builder::{build_request, parse_response, SubscriptionState};
pub use crate::vapid::{
    Base64VapidKeysProvider, LazyVapidKeys, StaticVapidKeysProvider, VapidKeys, VapidKeysProvider, VapidSignature,
    VapidSigner,
};
pub use crate::web_push::WebPush;

pub mod codec;
mod error;
pub mod http_ece;
mod message;
pub mod request_builder;
pub mod vapid;
mod web_push;
