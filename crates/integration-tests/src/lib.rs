//! Shared helpers for the identity integration tests.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Once};

use quickimage_identity::store::{KeyValueStore, MemoryStore};
use quickimage_identity::{IdentityConfig, IdentityServices};

static TRACING: Once = Once::new();

/// Initialize test tracing once per process.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A wired service graph over a fresh in-memory store.
pub async fn fresh_services() -> (Arc<MemoryStore>, IdentityServices) {
    fresh_services_with(IdentityConfig::default()).await
}

/// A wired service graph over a fresh in-memory store with custom config.
pub async fn fresh_services_with(config: IdentityConfig) -> (Arc<MemoryStore>, IdentityServices) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let services = IdentityServices::open(store.clone(), config).await.unwrap();
    (store, services)
}

/// Reopen the subsystem over an existing store, as a process restart would.
pub async fn reopen(store: &Arc<MemoryStore>) -> IdentityServices {
    IdentityServices::open(store.clone(), IdentityConfig::default())
        .await
        .unwrap()
}

/// Seed a store key with raw JSON before the subsystem is opened.
pub async fn seed(store: &Arc<MemoryStore>, key: &str, raw: &str) {
    store.set(key, raw).await.unwrap();
}
