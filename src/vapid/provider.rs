//! Deferred VAPID key resolution.
//!
//! A sender may get its keys from somewhere slow (a secret store, a
//! database). [`LazyVapidKeys`] resolves them at most once. The first caller
//! starts the provider as a shared future, concurrent callers await the same
//! future and later callers read the published value without locking.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{Mutex, OnceCell};

use crate::error::WebPushError;
use crate::vapid::VapidKeys;

type Resolution = Shared<BoxFuture<'static, Result<VapidKeys, WebPushError>>>;

enum Pending<'a> {
    Resolved(&'a VapidKeys),
    InFlight(Resolution),
}

/// Supplies the VAPID keys of a sender.
#[async_trait]
pub trait VapidKeysProvider: Send + Sync {
    async fn get(&self) -> Result<VapidKeys, WebPushError>;
}

/// Hands out keys that are already in memory.
pub struct StaticVapidKeysProvider(VapidKeys);

impl StaticVapidKeysProvider {
    pub fn new(keys: VapidKeys) -> Self {
        StaticVapidKeysProvider(keys)
    }
}

#[async_trait]
impl VapidKeysProvider for StaticVapidKeysProvider {
    async fn get(&self) -> Result<VapidKeys, WebPushError> {
        Ok(self.0.clone())
    }
}

/// Decodes base64url keys on first use.
pub struct Base64VapidKeysProvider {
    public_key: String,
    private_key: String,
}

impl Base64VapidKeysProvider {
    pub fn new<S>(public_key: S, private_key: S) -> Self
    where
        S: Into<String>,
    {
        Base64VapidKeysProvider {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }
}

#[async_trait]
impl VapidKeysProvider for Base64VapidKeysProvider {
    async fn get(&self) -> Result<VapidKeys, WebPushError> {
        VapidKeys::from_base64(&self.public_key, &self.private_key)
    }
}

/// Resolve-or-wait cell around a [`VapidKeysProvider`].
///
/// The provider runs inside a shared future owned by the cell, not by any
/// caller. Dropping a waiting caller, the first one included, leaves the
/// resolution running for the others. A failed resolution publishes
/// nothing, so the next caller runs the provider again.
pub struct LazyVapidKeys {
    provider: Arc<dyn VapidKeysProvider>,
    keys: OnceCell<VapidKeys>,
    in_flight: Mutex<Option<Resolution>>,
}

impl LazyVapidKeys {
    pub fn new<P>(provider: P) -> Self
    where
        P: VapidKeysProvider + 'static,
    {
        LazyVapidKeys {
            provider: Arc::new(provider),
            keys: OnceCell::new(),
            in_flight: Mutex::new(None),
        }
    }

    /// A cell that is already resolved.
    pub fn resolved(keys: VapidKeys) -> Self {
        LazyVapidKeys {
            keys: OnceCell::new_with(Some(keys.clone())),
            provider: Arc::new(StaticVapidKeysProvider::new(keys)),
            in_flight: Mutex::new(None),
        }
    }

    /// Returns the keys, running the provider if nobody has yet.
    pub async fn get(&self) -> Result<&VapidKeys, WebPushError> {
        if let Some(keys) = self.keys.get() {
            return Ok(keys);
        }

        let resolution = match self.pending().await {
            Pending::Resolved(keys) => return Ok(keys),
            Pending::InFlight(resolution) => resolution,
        };

        // Keys are published before the slot is cleared, so a caller that
        // finds the slot empty also finds the keys.
        let published = match resolution.clone().await {
            Ok(keys) => Ok(self.keys.get_or_init(|| async move { keys }).await),
            Err(err) => Err(err),
        };

        let mut in_flight = self.in_flight.lock().await;
        if in_flight.as_ref().is_some_and(|current| current.ptr_eq(&resolution)) {
            *in_flight = None;
        }

        published
    }

    async fn pending(&self) -> Pending<'_> {
        let mut in_flight = self.in_flight.lock().await;

        if let Some(keys) = self.keys.get() {
            return Pending::Resolved(keys);
        }

        if let Some(resolution) = in_flight.as_ref() {
            return Pending::InFlight(resolution.clone());
        }

        debug!("Resolving VAPID keys");

        let provider = self.provider.clone();
        let resolution = async move { provider.get().await }.boxed().shared();
        *in_flight = Some(resolution.clone());

        Pending::InFlight(resolution)
    }

    pub fn is_resolved(&self) -> bool {
        self.keys.initialized()
    }
}
