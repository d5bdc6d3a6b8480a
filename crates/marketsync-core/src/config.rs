//! Marketplace configuration.
//!
//! A [`MarketplaceConfig`] carries the credentials and sync settings for one
//! marketplace. It is built once (from a JSON file, the environment, or code)
//! and treated as read-only afterwards; adapters hold it behind an `Arc` and
//! swap the whole snapshot on reconfiguration.
//!
//! # Environment Variables
//!
//! | Setting | Primary Env Var | Fallback Env Var |
//! |---------|-----------------|------------------|
//! | Access token | `MARKETSYNC_ETSY_ACCESS_TOKEN` | `ETSY_ACCESS_TOKEN` |
//! | API key | `MARKETSYNC_ETSY_API_KEY` | `ETSY_API_KEY` |
//! | Shop id | `MARKETSYNC_ETSY_SHOP_ID` | `ETSY_SHOP_ID` |
//! | Base URL | `MARKETSYNC_ETSY_BASE_URL` | - |
//! | Currency | `MARKETSYNC_ETSY_CURRENCY` | - |
//! | Price markup (%) | `MARKETSYNC_ETSY_PRICE_MARKUP` | - |
//! | Requests per second | `MARKETSYNC_ETSY_RPS` | - |

use std::env;
use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

use crate::{validate_currency_code, CategoryMapping, ConfigError, MarketplaceId};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Credentials and sync settings for one marketplace.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    pub marketplace: MarketplaceId,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub shop_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    /// Percentage added on top of catalog prices by bulk price updates.
    #[serde(default)]
    pub price_markup_percent: f64,
    /// Client-side request budget; `None` disables pacing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<u32>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub category_mappings: Vec<CategoryMapping>,
}

fn default_enabled() -> bool {
    true
}

fn default_currency() -> String {
    String::from(DEFAULT_CURRENCY)
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl MarketplaceConfig {
    pub fn new(marketplace: MarketplaceId) -> Self {
        Self {
            marketplace,
            enabled: true,
            access_token: String::new(),
            api_key: String::new(),
            shop_id: String::new(),
            base_url: None,
            currency_code: default_currency(),
            price_markup_percent: 0.0,
            requests_per_second: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            category_mappings: Vec::new(),
        }
    }

    pub fn with_credentials(
        mut self,
        access_token: impl Into<String>,
        api_key: impl Into<String>,
        shop_id: impl Into<String>,
    ) -> Self {
        self.access_token = access_token.into();
        self.api_key = api_key.into();
        self.shop_id = shop_id.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_currency(mut self, currency_code: impl Into<String>) -> Self {
        self.currency_code = currency_code.into();
        self
    }

    pub fn with_price_markup(mut self, percent: f64) -> Self {
        self.price_markup_percent = percent;
        self
    }

    pub fn with_requests_per_second(mut self, requests_per_second: u32) -> Self {
        self.requests_per_second = Some(requests_per_second);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_category_mapping(
        mut self,
        shop_category_id: impl Into<String>,
        marketplace_category_id: impl Into<String>,
    ) -> Self {
        self.category_mappings.push(CategoryMapping {
            shop_category_id: shop_category_id.into(),
            marketplace_category_id: marketplace_category_id.into(),
        });
        self
    }

    /// True iff every credential the wire protocol needs is present.
    pub fn has_credentials(&self) -> bool {
        !self.access_token.trim().is_empty()
            && !self.api_key.trim().is_empty()
            && !self.shop_id.trim().is_empty()
    }

    /// Checks settings that would otherwise fail deep inside a sync.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_currency_code(&self.currency_code)?;

        if !self.price_markup_percent.is_finite() || self.price_markup_percent <= -100.0 {
            return Err(ConfigError::InvalidValue {
                field: "price_markup_percent",
                value: self.price_markup_percent.to_string(),
            });
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                value: String::from("0"),
            });
        }

        if self.requests_per_second == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "requests_per_second",
                value: String::from("0"),
            });
        }

        Ok(())
    }

    /// Applies the configured markup percentage to a catalog price.
    pub fn apply_markup(&self, price: f64) -> f64 {
        if self.price_markup_percent > 0.0 {
            price * (1.0 + self.price_markup_percent / 100.0)
        } else {
            price
        }
    }

    /// Reads settings from the process environment.
    ///
    /// Missing credentials are left blank so the marketplace registers as
    /// unconfigured; malformed numeric settings are rejected.
    pub fn from_env(marketplace: MarketplaceId) -> Result<Self, ConfigError> {
        Self::from_lookup(marketplace, |key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(marketplace: MarketplaceId, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = marketplace.env_prefix();
        let read = |name: &str| {
            lookup(&format!("MARKETSYNC_{prefix}_{name}"))
                .or_else(|| lookup(&format!("{prefix}_{name}")))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::new(marketplace).with_credentials(
            read("ACCESS_TOKEN").unwrap_or_default(),
            read("API_KEY").unwrap_or_default(),
            read("SHOP_ID").unwrap_or_default(),
        );

        config.base_url = lookup(&format!("MARKETSYNC_{prefix}_BASE_URL"));
        if let Some(currency) = lookup(&format!("MARKETSYNC_{prefix}_CURRENCY")) {
            config.currency_code = currency;
        }
        if let Some(markup) = lookup(&format!("MARKETSYNC_{prefix}_PRICE_MARKUP")) {
            config.price_markup_percent =
                markup
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "price_markup_percent",
                        value: markup.clone(),
                    })?;
        }
        if let Some(rps) = lookup(&format!("MARKETSYNC_{prefix}_RPS")) {
            config.requests_per_second =
                Some(rps.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    field: "requests_per_second",
                    value: rps.clone(),
                })?);
        }

        config.validate()?;
        Ok(config)
    }
}

impl Debug for MarketplaceConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketplaceConfig")
            .field("marketplace", &self.marketplace)
            .field("enabled", &self.enabled)
            .field("access_token", &redact(&self.access_token))
            .field("api_key", &redact(&self.api_key))
            .field("shop_id", &self.shop_id)
            .field("base_url", &self.base_url)
            .field("currency_code", &self.currency_code)
            .field("price_markup_percent", &self.price_markup_percent)
            .field("requests_per_second", &self.requests_per_second)
            .field("timeout_ms", &self.timeout_ms)
            .field("category_mappings", &self.category_mappings.len())
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}
