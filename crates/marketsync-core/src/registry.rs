use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::adapters::EtsyAdapter;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{ConfigError, Marketplace, MarketplaceConfig, MarketplaceError, MarketplaceId};

/// Adapter registry keyed by marketplace tag.
///
/// Selection happens here, before any sync logic runs; callers never
/// dispatch on vendor names themselves.
#[derive(Clone, Default)]
pub struct MarketplaceRegistry {
    adapters: BTreeMap<MarketplaceId, Arc<dyn Marketplace>>,
}

impl MarketplaceRegistry {
    pub fn new(adapters: Vec<Arc<dyn Marketplace>>) -> Self {
        let mut registry = Self::default();
        for adapter in adapters {
            registry.register(adapter);
        }
        registry
    }

    /// Adds an adapter, replacing any earlier one with the same tag.
    pub fn register(&mut self, adapter: Arc<dyn Marketplace>) {
        self.adapters.insert(adapter.id(), adapter);
    }

    pub fn get(&self, id: MarketplaceId) -> Result<Arc<dyn Marketplace>, MarketplaceError> {
        self.adapters
            .get(&id)
            .cloned()
            .ok_or_else(|| MarketplaceError::not_registered(id))
    }

    pub fn ids(&self) -> Vec<MarketplaceId> {
        self.adapters.keys().copied().collect()
    }

    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn Marketplace>> {
        self.adapters.values()
    }

    /// Adapters that are both configured and enabled, in tag order.
    pub fn active(&self) -> Vec<Arc<dyn Marketplace>> {
        self.adapters
            .values()
            .filter(|adapter| is_active(adapter.as_ref()))
            .cloned()
            .collect()
    }
}

fn is_active(adapter: &dyn Marketplace) -> bool {
    adapter.is_configured()
        && adapter
            .config()
            .map(|config| config.enabled)
            .unwrap_or(false)
}

/// Builds a [`MarketplaceRegistry`] with one adapter per known marketplace.
///
/// Explicit configs win over environment credentials. Adapters without any
/// configuration are still registered, but report as unconfigured.
///
/// ```rust,ignore
/// use marketsync_core::MarketplaceRegistryBuilder;
///
/// let registry = MarketplaceRegistryBuilder::new()
///     .with_env_credentials()
///     .build()?;
/// ```
#[derive(Default)]
pub struct MarketplaceRegistryBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    configs: BTreeMap<MarketplaceId, MarketplaceConfig>,
    read_env: bool,
}

impl MarketplaceRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares one transport across every adapter.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Reads credentials from the environment for marketplaces without an explicit config.
    pub fn with_env_credentials(mut self) -> Self {
        self.read_env = true;
        self
    }

    pub fn with_config(mut self, config: MarketplaceConfig) -> Self {
        self.configs.insert(config.marketplace, config);
        self
    }

    pub fn with_configs<I>(mut self, configs: I) -> Self
    where
        I: IntoIterator<Item = MarketplaceConfig>,
    {
        for config in configs {
            self.configs.insert(config.marketplace, config);
        }
        self
    }

    pub fn build(mut self) -> Result<MarketplaceRegistry, ConfigError> {
        let http_client = self
            .http_client
            .take()
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let mut registry = MarketplaceRegistry::default();

        for id in MarketplaceId::ALL {
            let config = match self.configs.remove(&id) {
                Some(config) => Some(config),
                None if self.read_env => Some(MarketplaceConfig::from_env(id)?),
                None => None,
            };

            let adapter: Arc<dyn Marketplace> = match id {
                MarketplaceId::Etsy => Arc::new(EtsyAdapter::new(Arc::clone(&http_client))),
            };
            if let Some(config) = config {
                adapter.configure(config)?;
            }
            debug!(marketplace = %id, configured = adapter.is_configured(), "registered adapter");
            registry.register(adapter);
        }

        Ok(registry)
    }
}
