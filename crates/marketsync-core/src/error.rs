use thiserror::Error;

use crate::MarketplaceError;

/// Validation errors raised while constructing schema types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("sku cannot be empty")]
    EmptySku,
    #[error("sku length {len} exceeds max {max}")]
    SkuTooLong { len: usize, max: usize },
    #[error("sku contains control character at index {index}")]
    SkuControlChar { index: usize },

    #[error("invalid marketplace '{value}', expected one of etsy")]
    InvalidMarketplace { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("epoch seconds {value} are out of range")]
    TimestampOutOfRange { value: i64 },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
}

/// Configuration errors raised by `Marketplace::configure` and config loaders.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config for '{found}' cannot be applied to the '{expected}' adapter")]
    MarketplaceMismatch { expected: String, found: String },

    #[error("required setting '{field}' is missing or blank")]
    MissingField { field: &'static str },

    #[error("setting '{field}' has invalid value '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors raised by a `SyncStore` implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("sync store lock was poisoned")]
    Poisoned,

    #[error("sync store backend failure: {0}")]
    Backend(String),
}

/// Error returned by `SyncService` operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Marketplace(error) => error.code(),
            Self::Validation(_) => "validation_error",
            Self::Config(_) => "config_error",
            Self::Store(_) => "store_error",
        }
    }

    /// The marketplace error, when this wraps one.
    pub fn as_marketplace(&self) -> Option<&MarketplaceError> {
        match self {
            Self::Marketplace(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_pass_through_marketplace_errors() {
        let error = CoreError::from(MarketplaceError::rate_limited("slow down"));
        assert_eq!(error.code(), "marketplace.rate_limited");
        assert!(error.as_marketplace().is_some());
    }

    #[test]
    fn config_errors_keep_their_message() {
        let error = CoreError::from(ConfigError::MissingField { field: "shop_id" });
        assert_eq!(error.code(), "config_error");
        assert_eq!(
            error.to_string(),
            "required setting 'shop_id' is missing or blank"
        );
    }
}
