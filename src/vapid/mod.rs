//! Contains tooling for signing with VAPID.

pub use self::key::VapidKeys;
pub use self::provider::{Base64VapidKeysProvider, LazyVapidKeys, StaticVapidKeysProvider, VapidKeysProvider};
pub use self::signer::{build_token, Claims, VapidSignature, VapidSigner, DEFAULT_EXPIRATION};

pub mod jose;
pub mod key;
mod provider;
mod signer;
