//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::pachca::{ChatApi, PachcaClient};

/// Application state shared across all handlers.
///
/// Read-only for the life of the process. Every request is handled
/// independently, so there are no locks.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RelayConfig,
    chat: Arc<dyn ChatApi>,
}

impl AppState {
    /// Build state with a Pachca client from configuration.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        let client = PachcaClient::new(
            config.pachca.base_url.as_str(),
            config.pachca.api_key.clone(),
        );
        Self::with_chat(config, Arc::new(client))
    }

    /// Build state around an arbitrary chat backend.
    #[must_use]
    pub fn with_chat(config: RelayConfig, chat: Arc<dyn ChatApi>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, chat }),
        }
    }

    /// Returns the relay configuration.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    /// Returns the chat backend.
    #[must_use]
    pub fn chat(&self) -> &dyn ChatApi {
        self.inner.chat.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
