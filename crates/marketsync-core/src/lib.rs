//! # MarketSync Core
//!
//! Core contracts, adapters and orchestration for synchronizing a shop
//! catalog with external marketplaces.
//!
//! ## Overview
//!
//! This crate provides the building blocks of the sync engine:
//!
//! - **Canonical domain models** for products, orders and categories
//! - **Marketplace trait** implemented once per vendor adapter
//! - **Batch results** with per-item error isolation
//! - **Registry and service** for pre-flight checks, mappings and history
//! - **Cancellation** through tokens and deadlines observed between items
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Vendor adapters (Etsy) |
//! | [`batch`] | Item-by-item export loop |
//! | [`cancel`] | Cancellation signal and interruption reasons |
//! | [`config`] | Per-marketplace credentials and settings |
//! | [`domain`] | Domain models (Product, Order, Category, Money) |
//! | [`error`] | Validation, config, store and service errors |
//! | [`executor`] | Authenticated requests and status classification |
//! | [`http_client`] | HTTP client abstraction |
//! | [`marketplace`] | Adapter trait and its structured error |
//! | [`marketplace_id`] | Marketplace tags |
//! | [`registry`] | Adapter registry and builder |
//! | [`service`] | Sync orchestration |
//! | [`store`] | Persistence seam for history, orders and mappings |
//! | [`sync_result`] | Batch result aggregation |
//! | [`throttling`] | Client-side request pacing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use marketsync_core::{
//!     CancelSignal, MarketplaceId, MarketplaceRegistryBuilder, MemorySyncStore, Product, Sku,
//!     SyncService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = MarketplaceRegistryBuilder::new()
//!         .with_env_credentials()
//!         .build()?;
//!     let service = SyncService::new(registry, Arc::new(MemorySyncStore::new()));
//!
//!     let products = vec![Product::new(Sku::parse("MUG-01")?, "Blue mug", 18.0, 4)?];
//!     let result = service
//!         .export_products(MarketplaceId::Etsy, &products, &CancelSignal::none())
//!         .await?;
//!     println!("{} of {} exported", result.success_items(), result.total_items());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Caller   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Sync Service   │────▶│ Sync Store       │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Marketplace     │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Adapter operations return [`MarketplaceError`] with a stable kind:
//!
//! ```rust
//! use marketsync_core::{MarketplaceError, MarketplaceErrorKind};
//!
//! fn handle_error(error: MarketplaceError) {
//!     match error.kind() {
//!         MarketplaceErrorKind::RateLimited => {
//!             // Back off before the next batch
//!         }
//!         MarketplaceErrorKind::Authentication => {
//!             // Refresh credentials
//!         }
//!         MarketplaceErrorKind::NotFound => {
//!             // Export the product first
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - Credentials come from config files or environment variables and are redacted in `Debug`
//! - Every request goes through the injectable `HttpClient`; the default is reqwest over HTTPS

pub mod adapters;
pub mod batch;
pub mod cancel;
pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod http_client;
pub mod marketplace;
pub mod marketplace_id;
pub mod registry;
pub mod service;
pub mod store;
pub mod sync_result;
pub mod throttling;

// Adapter implementations
pub use adapters::{EtsyAdapter, ETSY_API_URL};

// Cancellation
pub use cancel::{CancelSignal, Interruption};

// Configuration
pub use config::{MarketplaceConfig, DEFAULT_CURRENCY, DEFAULT_TIMEOUT_MS};

// Domain models
pub(crate) use domain::decimal_from_parts;
pub use domain::{
    truncate_with_ellipsis, validate_currency_code, Category, CategoryMapping, Money, Order,
    OrderItem, Product, Shipment, Sku, UtcDateTime, MINOR_UNIT_DIVISOR,
};

// Error types
pub use error::{ConfigError, CoreError, StoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Marketplace trait and identifiers
pub use marketplace::{
    CapabilitySet, Marketplace, MarketplaceError, MarketplaceErrorKind, MarketplaceFuture,
};
pub use marketplace_id::MarketplaceId;

// Orchestration
pub use registry::{MarketplaceRegistry, MarketplaceRegistryBuilder};
pub use service::{FanOut, MarketplaceStatus, OrderImport, SyncService};
pub use store::{MemorySyncStore, StoreSnapshot, SyncStore};
pub use sync_result::{ItemError, SyncDirection, SyncResult, SyncStatus};

// Throttling
pub use throttling::RequestPacer;
