//! Sync orchestration across registered marketplaces.
//!
//! [`SyncService`] is the entry point for CLI and scheduler layers. It runs
//! pre-flight checks, applies category mappings and price markup, de-duplicates
//! imported orders, and records every batch in the [`SyncStore`].
//!
//! # Operations
//!
//! | Operation | Scope | Notes |
//! |-----------|-------|-------|
//! | `export_products` / `export_all` | batch | Category mappings applied first; result stored |
//! | `import_orders` / `import_all` | batch | Default `since` is the last import, else 7 days back |
//! | `update_stock` / `update_stock_all` | item | Fan-out is sequential |
//! | `update_price` / `update_price_all` | item | Only the fan-out applies markup |
//! | `status` / `sync_history` | read | Served from the store |

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    CancelSignal, Category, CategoryMapping, CoreError, Marketplace,
    MarketplaceConfig, MarketplaceError, MarketplaceId, MarketplaceRegistry, Order, Product,
    Shipment, Sku, SyncDirection, SyncResult, SyncStatus, SyncStore, UtcDateTime,
};

/// Orders are looked back this far when no earlier import is recorded.
pub const DEFAULT_IMPORT_LOOKBACK_DAYS: i64 = 7;

/// Per-marketplace outcome of a fan-out operation.
pub type FanOut<T> = Vec<(MarketplaceId, Result<T, CoreError>)>;

/// Outcome of one order import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderImport {
    pub since: UtcDateTime,
    /// Orders not seen before; already stored ones are left untouched.
    pub new_orders: Vec<Order>,
    pub duplicates: usize,
    pub result: SyncResult,
}

/// Status snapshot for one marketplace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketplaceStatus {
    pub marketplace: MarketplaceId,
    pub configured: bool,
    pub enabled: bool,
    pub capabilities: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<UtcDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync_status: Option<SyncStatus>,
    pub product_count: usize,
}

pub struct SyncService {
    registry: MarketplaceRegistry,
    store: Arc<dyn SyncStore>,
    feed_cache: RwLock<HashMap<MarketplaceId, Option<Vec<u8>>>>,
}

impl SyncService {
    pub fn new(registry: MarketplaceRegistry, store: Arc<dyn SyncStore>) -> Self {
        Self {
            registry,
            store,
            feed_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &MarketplaceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn SyncStore> {
        &self.store
    }

    /// Replaces the adapter's configuration as a whole.
    pub fn configure(&self, config: MarketplaceConfig) -> Result<(), CoreError> {
        let adapter = self.registry.get(config.marketplace)?;
        adapter.configure(config)?;
        self.invalidate_feed(adapter.id());
        Ok(())
    }

    fn ready_adapter(&self, id: MarketplaceId) -> Result<Arc<dyn Marketplace>, CoreError> {
        let adapter = self.registry.get(id)?;
        if !adapter.is_configured() {
            return Err(MarketplaceError::not_configured(id).into());
        }
        Ok(adapter)
    }

    /// Exports products to one marketplace and records the result.
    pub async fn export_products(
        &self,
        id: MarketplaceId,
        products: &[Product],
        signal: &CancelSignal,
    ) -> Result<SyncResult, CoreError> {
        let adapter = self.ready_adapter(id)?;
        let mapped = self.apply_category_mappings(adapter.as_ref(), products)?;

        let result = adapter.export_products(&mapped, signal).await?;
        self.record(&result);
        Ok(result)
    }

    /// Exports to every configured and enabled marketplace, one after another.
    pub async fn export_all(&self, products: &[Product], signal: &CancelSignal) -> FanOut<SyncResult> {
        let mut outcomes = Vec::new();
        for adapter in self.registry.active() {
            let id = adapter.id();
            outcomes.push((id, self.export_products(id, products, signal).await));
        }
        outcomes
    }

    /// Imports orders created since `since`.
    ///
    /// Without `since` the window starts where the last uninterrupted import
    /// started, or [`DEFAULT_IMPORT_LOOKBACK_DAYS`] back when there is none. An
    /// interrupted import never moves that watermark, so the next run fetches
    /// the pages it missed.
    ///
    /// Receipts the marketplace returns without a creation time are kept with
    /// `created_at` at the Unix epoch rather than dropped.
    pub async fn import_orders(
        &self,
        id: MarketplaceId,
        since: Option<UtcDateTime>,
        signal: &CancelSignal,
    ) -> Result<OrderImport, CoreError> {
        let adapter = self.ready_adapter(id)?;
        let since = match since {
            Some(since) => since,
            None => self.default_since(id)?,
        };

        let fetch_started = UtcDateTime::now();
        let orders = adapter.import_orders(since, signal).await?;
        let mut result =
            SyncResult::start_from(id, SyncDirection::Import, orders.len(), fetch_started);
        let mut new_orders = Vec::new();
        let mut duplicates = 0;

        for order in orders {
            if self.store.save_order(&order)? {
                new_orders.push(order);
            } else {
                duplicates += 1;
            }
            result.record_success();
        }
        if let Some(interruption) = signal.interruption() {
            result.interrupt(interruption);
        }
        result.finish();
        self.record(&result);

        info!(
            marketplace = %id,
            since = %since,
            new = new_orders.len(),
            duplicates,
            "order import finished"
        );
        Ok(OrderImport {
            since,
            new_orders,
            duplicates,
            result,
        })
    }

    pub async fn import_all(&self, signal: &CancelSignal) -> FanOut<OrderImport> {
        let mut outcomes = Vec::new();
        for adapter in self.registry.active() {
            let id = adapter.id();
            outcomes.push((id, self.import_orders(id, None, signal).await));
        }
        outcomes
    }

    fn default_since(&self, id: MarketplaceId) -> Result<UtcDateTime, CoreError> {
        let last = self
            .store
            .last_uninterrupted_result(id, SyncDirection::Import)?;
        Ok(last
            .map(|result| result.started_at())
            .unwrap_or_else(|| UtcDateTime::now().saturating_sub_days(DEFAULT_IMPORT_LOOKBACK_DAYS)))
    }

    pub async fn update_product(&self, id: MarketplaceId, product: &Product) -> Result<(), CoreError> {
        let adapter = self.ready_adapter(id)?;
        let mapped = self.apply_category_mappings(adapter.as_ref(), std::slice::from_ref(product))?;
        let product = mapped.first().unwrap_or(product);
        adapter.update_product(product).await?;
        Ok(())
    }

    pub async fn update_stock(&self, id: MarketplaceId, sku: &Sku, quantity: u32) -> Result<(), CoreError> {
        self.ready_adapter(id)?.update_stock(sku, quantity).await?;
        Ok(())
    }

    pub async fn update_stock_all(&self, sku: &Sku, quantity: u32) -> FanOut<()> {
        let mut outcomes = Vec::new();
        for adapter in self.registry.active() {
            let outcome = adapter
                .update_stock(sku, quantity)
                .await
                .map_err(CoreError::from);
            outcomes.push((adapter.id(), outcome));
        }
        outcomes
    }

    /// Sets the listing price as given; no markup is applied.
    pub async fn update_price(&self, id: MarketplaceId, sku: &Sku, price: f64) -> Result<(), CoreError> {
        self.ready_adapter(id)?.update_price(sku, price).await?;
        Ok(())
    }

    /// Sets the price on every active marketplace with its configured markup.
    pub async fn update_price_all(&self, sku: &Sku, price: f64) -> FanOut<()> {
        let mut outcomes = Vec::new();
        for adapter in self.registry.active() {
            let final_price = adapter
                .config()
                .map_or(price, |config| config.apply_markup(price));
            let outcome = adapter
                .update_price(sku, final_price)
                .await
                .map_err(CoreError::from);
            outcomes.push((adapter.id(), outcome));
        }
        outcomes
    }

    pub async fn delete_product(&self, id: MarketplaceId, sku: &Sku) -> Result<(), CoreError> {
        self.ready_adapter(id)?.delete_product(sku).await?;
        Ok(())
    }

    /// Pushes the status outward, then mirrors it onto the stored order.
    pub async fn update_order_status(
        &self,
        id: MarketplaceId,
        order_id: &str,
        status: &str,
    ) -> Result<(), CoreError> {
        self.ready_adapter(id)?
            .update_order_status(order_id, status)
            .await?;
        if !self.store.update_order_status(id, order_id, status)? {
            warn!(marketplace = %id, order_id, "status pushed for an order that was never imported");
        }
        Ok(())
    }

    pub async fn mark_as_shipped(
        &self,
        id: MarketplaceId,
        order_id: &str,
        shipment: &Shipment,
    ) -> Result<(), CoreError> {
        self.ready_adapter(id)?
            .mark_as_shipped(order_id, shipment)
            .await?;
        self.store.update_order_status(id, order_id, "shipped")?;
        Ok(())
    }

    pub async fn categories(&self, id: MarketplaceId) -> Result<Vec<Category>, CoreError> {
        Ok(self.registry.get(id)?.categories().await?)
    }

    pub fn save_category_mapping(
        &self,
        id: MarketplaceId,
        mapping: CategoryMapping,
    ) -> Result<(), CoreError> {
        self.store.save_category_mapping(id, mapping)?;
        Ok(())
    }

    pub fn category_mappings(&self, id: MarketplaceId) -> Result<Vec<CategoryMapping>, CoreError> {
        Ok(self.store.category_mappings(id)?)
    }

    /// Cached feed document; `None` for API-driven marketplaces.
    pub async fn feed(
        &self,
        id: MarketplaceId,
        products: &[Product],
        regenerate: bool,
    ) -> Result<Option<Vec<u8>>, CoreError> {
        if !regenerate {
            let cache = self.feed_cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(feed) = cache.get(&id) {
                return Ok(feed.clone());
            }
        }

        let adapter = self.registry.get(id)?;
        let mapped = self.apply_category_mappings(adapter.as_ref(), products)?;
        let feed = adapter.generate_feed(&mapped).await?;
        self.feed_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, feed.clone());
        Ok(feed)
    }

    pub fn invalidate_feed(&self, id: MarketplaceId) {
        self.feed_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    /// One entry per registered marketplace, in tag order.
    pub fn status(&self) -> Result<Vec<MarketplaceStatus>, CoreError> {
        let mut statuses = Vec::new();
        for adapter in self.registry.adapters() {
            let id = adapter.id();
            let configured = adapter.is_configured();
            let enabled = adapter.config().is_some_and(|config| config.enabled);
            let mut status = MarketplaceStatus {
                marketplace: id,
                configured,
                enabled,
                capabilities: adapter.capabilities().supported(),
                last_sync: None,
                last_sync_status: None,
                product_count: 0,
            };

            if configured {
                if let Some(last) = self.store.last_sync_result(id, SyncDirection::Export)? {
                    status.last_sync = last.completed_at();
                    status.last_sync_status = Some(last.status());
                    status.product_count = last.total_items();
                }
            }
            statuses.push(status);
        }
        Ok(statuses)
    }

    pub fn sync_history(&self, id: MarketplaceId, limit: usize) -> Result<Vec<SyncResult>, CoreError> {
        self.registry.get(id)?;
        Ok(self.store.sync_history(id, limit)?)
    }

    /// Config mappings first, store mappings override them.
    fn apply_category_mappings(
        &self,
        adapter: &dyn Marketplace,
        products: &[Product],
    ) -> Result<Vec<Product>, CoreError> {
        let id = adapter.id();
        let mut mappings: HashMap<String, String> = HashMap::new();
        if let Some(config) = adapter.config() {
            for mapping in &config.category_mappings {
                mappings.insert(
                    mapping.shop_category_id.clone(),
                    mapping.marketplace_category_id.clone(),
                );
            }
        }
        for mapping in self.store.category_mappings(id)? {
            mappings.insert(mapping.shop_category_id, mapping.marketplace_category_id);
        }

        Ok(products
            .iter()
            .map(|product| {
                let mut product = product.clone();
                if let Some(mapped) = mappings.get(&product.category_id) {
                    product.category_id = mapped.clone();
                }
                product
            })
            .collect())
    }

    fn record(&self, result: &SyncResult) {
        if let Err(error) = self.store.save_sync_result(result) {
            warn!(sync_id = %result.id(), %error, "failed to record sync result");
        }
    }
}
