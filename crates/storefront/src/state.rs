//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::AccountStore;
use crate::services::TokenCodec;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the account store, the token codec and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn AccountStore>,
    tokens: TokenCodec,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Account storage (`PostgreSQL` or in-memory)
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Arc<dyn AccountStore>) -> Self {
        let tokens = TokenCodec::new(&config.token);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                tokens,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the account store.
    #[must_use]
    pub fn store(&self) -> &dyn AccountStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the token codec.
    #[must_use]
    pub fn tokens(&self) -> &TokenCodec {
        &self.inner.tokens
    }
}
