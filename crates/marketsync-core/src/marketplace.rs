//! Marketplace capability trait and its error type.
//!
//! This module defines the adapter contract (`Marketplace`) every vendor
//! integration implements, the capability matrix used to describe what a
//! vendor supports, and the structured [`MarketplaceError`] every operation
//! reports.
//!
//! # Operations
//!
//! | Operation | Kind | Description |
//! |-----------|------|-------------|
//! | `export_products` | batch | Upsert every product, aggregate a [`SyncResult`] |
//! | `update_product` / `update_stock` / `update_price` / `delete_product` | single item | Resolve SKU to listing, then write |
//! | `import_orders` | batch | Fetch orders created at or after a timestamp |
//! | `update_order_status` / `mark_as_shipped` | single item | Push order state outward |
//! | `categories` | read | Flat taxonomy list |
//! | `generate_feed` | read | Static feed document, `None` for API-driven vendors |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    CancelSignal, Category, ConfigError, MarketplaceConfig, MarketplaceId, Order, Product,
    Shipment, Sku, SyncResult, UtcDateTime,
};

/// Boxed future returned by every `Marketplace` operation.
pub type MarketplaceFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, MarketplaceError>> + Send + 'a>>;

/// Supported operation matrix for a marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    /// Listings are written through API calls.
    pub listings: bool,
    /// A static catalog feed can be generated.
    pub feed: bool,
    /// Order status changes can be pushed to the marketplace.
    pub order_status: bool,
    /// Shipment tracking can be pushed to the marketplace.
    pub shipment_tracking: bool,
}

impl CapabilitySet {
    pub const fn new(
        listings: bool,
        feed: bool,
        order_status: bool,
        shipment_tracking: bool,
    ) -> Self {
        Self {
            listings,
            feed,
            order_status,
            shipment_tracking,
        }
    }

    pub fn supported(self) -> Vec<&'static str> {
        let mut values = Vec::with_capacity(4);
        if self.listings {
            values.push("listings");
        }
        if self.feed {
            values.push("feed");
        }
        if self.order_status {
            values.push("order_status");
        }
        if self.shipment_tracking {
            values.push("shipment_tracking");
        }
        values
    }
}

/// Error classification shared by every adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketplaceErrorKind {
    /// Required credentials are missing.
    NotConfigured,
    /// No adapter is registered for the requested marketplace.
    NotRegistered,
    /// The marketplace rejected the credentials (HTTP 401).
    Authentication,
    /// The marketplace asked the caller to back off (HTTP 429).
    RateLimited,
    /// The referenced SKU has no remote listing.
    NotFound,
    /// Any other 4xx/5xx response.
    Remote,
    /// No usable response was obtained (network or decode failure).
    Transport,
    /// The request was rejected before it was sent.
    InvalidRequest,
    /// The caller cancelled before any work started.
    Cancelled,
}

/// Structured marketplace error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceError {
    kind: MarketplaceErrorKind,
    message: String,
    status: Option<u16>,
    retryable: bool,
}

impl MarketplaceError {
    fn new(kind: MarketplaceErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            retryable,
        }
    }

    pub fn not_configured(marketplace: MarketplaceId) -> Self {
        Self::new(
            MarketplaceErrorKind::NotConfigured,
            format!("marketplace '{marketplace}' is not configured"),
            false,
        )
    }

    pub fn not_registered(marketplace: MarketplaceId) -> Self {
        Self::new(
            MarketplaceErrorKind::NotRegistered,
            format!("marketplace adapter '{marketplace}' is not registered"),
            false,
        )
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self {
            status: Some(401),
            ..Self::new(MarketplaceErrorKind::Authentication, message, false)
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            status: Some(429),
            ..Self::new(MarketplaceErrorKind::RateLimited, message, true)
        }
    }

    pub fn not_found(sku: &Sku) -> Self {
        Self::new(
            MarketplaceErrorKind::NotFound,
            format!("no listing found for sku '{sku}'"),
            false,
        )
    }

    /// Non-success response; the raw body is kept for diagnostics.
    pub fn remote(status: u16, body: impl AsRef<str>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(
                MarketplaceErrorKind::Remote,
                format!("API error {status}: {}", body.as_ref()),
                status >= 500,
            )
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(MarketplaceErrorKind::Transport, message, true)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(MarketplaceErrorKind::InvalidRequest, message, false)
    }

    pub fn cancelled() -> Self {
        Self::new(
            MarketplaceErrorKind::Cancelled,
            "operation cancelled before it started",
            false,
        )
    }

    pub const fn kind(&self) -> MarketplaceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    /// Errors after which no further call in the same batch can succeed.
    pub const fn halts_batch(&self) -> bool {
        matches!(
            self.kind,
            MarketplaceErrorKind::Authentication | MarketplaceErrorKind::NotConfigured
        )
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            MarketplaceErrorKind::NotConfigured => "marketplace.not_configured",
            MarketplaceErrorKind::NotRegistered => "marketplace.not_registered",
            MarketplaceErrorKind::Authentication => "marketplace.authentication",
            MarketplaceErrorKind::RateLimited => "marketplace.rate_limited",
            MarketplaceErrorKind::NotFound => "marketplace.not_found",
            MarketplaceErrorKind::Remote => "marketplace.remote_error",
            MarketplaceErrorKind::Transport => "marketplace.transport_error",
            MarketplaceErrorKind::InvalidRequest => "marketplace.invalid_request",
            MarketplaceErrorKind::Cancelled => "marketplace.cancelled",
        }
    }
}

impl Display for MarketplaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for MarketplaceError {}

/// Marketplace adapter contract.
///
/// One implementation exists per vendor. Adapters own their transport and a
/// configuration snapshot; every operation reads the snapshot once at entry,
/// so reconfiguring mid-batch never mixes credentials within one call.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the registry shares them across
/// concurrent sync invocations.
pub trait Marketplace: Send + Sync {
    /// Returns the marketplace tag.
    fn id(&self) -> MarketplaceId;

    /// Returns the supported operation matrix.
    fn capabilities(&self) -> CapabilitySet;

    /// Stores credentials, replacing any earlier configuration as a whole.
    fn configure(&self, config: MarketplaceConfig) -> Result<(), ConfigError>;

    /// Current configuration snapshot, if one was applied.
    fn config(&self) -> Option<Arc<MarketplaceConfig>>;

    /// True iff every required credential is present.
    fn is_configured(&self) -> bool {
        self.config()
            .map(|config| config.has_credentials())
            .unwrap_or(false)
    }

    /// Creates or updates one remote listing per product.
    ///
    /// Single-item failures are recorded in the returned [`SyncResult`]; the
    /// batch only stops early on cancellation or a batch-fatal error.
    ///
    /// # Errors
    ///
    /// Returns [`MarketplaceError`] without a result if the adapter is not
    /// configured or the signal fired before the first item.
    fn export_products<'a>(
        &'a self,
        products: &'a [Product],
        signal: &'a CancelSignal,
    ) -> MarketplaceFuture<'a, SyncResult>;

    /// Rewrites an existing listing; `NotFound` if the SKU has none.
    fn update_product<'a>(&'a self, product: &'a Product) -> MarketplaceFuture<'a, ()>;

    /// Sets the listing quantity; `NotFound` if the SKU has no listing.
    fn update_stock<'a>(&'a self, sku: &'a Sku, quantity: u32) -> MarketplaceFuture<'a, ()>;

    /// Sets the listing price; `NotFound` if the SKU has no listing.
    fn update_price<'a>(&'a self, sku: &'a Sku, price: f64) -> MarketplaceFuture<'a, ()>;

    /// Removes the listing; `NotFound` if the SKU has none.
    fn delete_product<'a>(&'a self, sku: &'a Sku) -> MarketplaceFuture<'a, ()>;

    /// Fetches orders created at or after `since`.
    ///
    /// Malformed fields degrade to zero values instead of failing the import.
    /// A receipt without a creation time cannot be compared with `since`; it
    /// is kept and its `created_at` is the Unix epoch.
    fn import_orders<'a>(
        &'a self,
        since: UtcDateTime,
        signal: &'a CancelSignal,
    ) -> MarketplaceFuture<'a, Vec<Order>>;

    /// Pushes an order status; a documented no-op where unsupported.
    fn update_order_status<'a>(
        &'a self,
        order_id: &'a str,
        status: &'a str,
    ) -> MarketplaceFuture<'a, ()>;

    /// Pushes carrier and tracking details for a shipped order.
    fn mark_as_shipped<'a>(
        &'a self,
        order_id: &'a str,
        shipment: &'a Shipment,
    ) -> MarketplaceFuture<'a, ()>;

    /// Returns the full taxonomy as a flat list.
    fn categories<'a>(&'a self) -> MarketplaceFuture<'a, Vec<Category>>;

    /// Renders a static catalog feed; `None` when the vendor is API-driven.
    fn generate_feed<'a>(&'a self, products: &'a [Product])
        -> MarketplaceFuture<'a, Option<Vec<u8>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_credential_errors_halt_a_batch() {
        assert!(MarketplaceError::authentication("rejected").halts_batch());
        assert!(MarketplaceError::not_configured(MarketplaceId::Etsy).halts_batch());
        assert!(!MarketplaceError::rate_limited("slow down").halts_batch());
        assert!(!MarketplaceError::remote(400, "bad").halts_batch());
        assert!(!MarketplaceError::transport("reset").halts_batch());
    }

    #[test]
    fn remote_errors_keep_status_and_body() {
        let error = MarketplaceError::remote(422, r#"{"error":"title too long"}"#);
        assert_eq!(error.kind(), MarketplaceErrorKind::Remote);
        assert_eq!(error.status(), Some(422));
        assert!(error.message().contains("title too long"));
        assert!(!error.retryable());
        assert!(MarketplaceError::remote(503, "").retryable());
    }

    #[test]
    fn display_includes_stable_code() {
        let error = MarketplaceError::rate_limited("too many requests");
        assert_eq!(
            error.to_string(),
            "too many requests (marketplace.rate_limited)"
        );
    }

    #[test]
    fn capability_labels_follow_flags() {
        let caps = CapabilitySet::new(true, false, false, true);
        assert_eq!(caps.supported(), vec!["listings", "shipment_tracking"]);
    }
}
