use std::sync::{Arc, PoisonError, RwLock};

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::lenient;
use crate::batch::run_export_batch;
use crate::executor::{ApiCredentials, RequestExecutor};
use crate::http_client::{HttpClient, HttpMethod, ReqwestHttpClient};
use crate::throttling::RequestPacer;
use crate::{
    decimal_from_parts, truncate_with_ellipsis, CancelSignal, CapabilitySet, Category,
    ConfigError, Marketplace, MarketplaceConfig, MarketplaceError, MarketplaceFuture,
    MarketplaceId, Money, Order, OrderItem, Product, Shipment, Sku, SyncResult, UtcDateTime,
};

pub const ETSY_API_URL: &str = "https://openapi.etsy.com/v3";

const TITLE_MAX_CHARS: usize = 140;
const RECEIPTS_PAGE_SIZE: usize = 100;
const WHO_MADE: &str = "i_did";
const WHEN_MADE: &str = "made_to_order";

/// Etsy Open API v3 adapter.
///
/// Listings are written through the shop-scoped REST endpoints and matched to
/// catalog products by SKU. Etsy receipts are imported as orders.
pub struct EtsyAdapter {
    http_client: Arc<dyn HttpClient>,
    session: RwLock<Option<Arc<EtsySession>>>,
}

impl Default for EtsyAdapter {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::default()))
    }
}

impl EtsyAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            session: RwLock::new(None),
        }
    }

    pub fn with_config(
        http_client: Arc<dyn HttpClient>,
        config: MarketplaceConfig,
    ) -> Result<Self, ConfigError> {
        let adapter = Self::new(http_client);
        adapter.configure(config)?;
        Ok(adapter)
    }

    fn current_session(&self) -> Option<Arc<EtsySession>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot taken once per call; reconfiguration never affects a running call.
    fn session(&self) -> Result<Arc<EtsySession>, MarketplaceError> {
        self.current_session()
            .filter(|session| session.config.has_credentials())
            .ok_or_else(|| MarketplaceError::not_configured(MarketplaceId::Etsy))
    }
}

impl Marketplace for EtsyAdapter {
    fn id(&self) -> MarketplaceId {
        MarketplaceId::Etsy
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::new(true, false, false, true)
    }

    fn configure(&self, config: MarketplaceConfig) -> Result<(), ConfigError> {
        if config.marketplace != MarketplaceId::Etsy {
            return Err(ConfigError::MarketplaceMismatch {
                expected: MarketplaceId::Etsy.to_string(),
                found: config.marketplace.to_string(),
            });
        }
        config.validate()?;

        let session = Arc::new(EtsySession::new(self.http_client.clone(), config));
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    fn config(&self) -> Option<Arc<MarketplaceConfig>> {
        self.current_session()
            .map(|session| Arc::clone(&session.config))
    }

    fn export_products<'a>(
        &'a self,
        products: &'a [Product],
        signal: &'a CancelSignal,
    ) -> MarketplaceFuture<'a, SyncResult> {
        Box::pin(async move {
            let session = self.session()?;
            run_export_batch(MarketplaceId::Etsy, products, signal, |product| {
                session.upsert_listing(product)
            })
            .await
        })
    }

    fn update_product<'a>(&'a self, product: &'a Product) -> MarketplaceFuture<'a, ()> {
        Box::pin(async move {
            let session = self.session()?;
            let listing_id = session.require_listing(&product.sku).await?;
            let fields = ListingFields::for_product(product, &session.config.currency_code)?;
            session.patch_listing(&listing_id, &fields).await
        })
    }

    fn update_stock<'a>(&'a self, sku: &'a Sku, quantity: u32) -> MarketplaceFuture<'a, ()> {
        Box::pin(async move {
            let session = self.session()?;
            let listing_id = session.require_listing(sku).await?;
            session
                .patch_listing(&listing_id, &ListingFields::quantity(quantity))
                .await
        })
    }

    fn update_price<'a>(&'a self, sku: &'a Sku, price: f64) -> MarketplaceFuture<'a, ()> {
        Box::pin(async move {
            let session = self.session()?;
            let money = wire_price(price, &session.config.currency_code)?;
            let listing_id = session.require_listing(sku).await?;
            session
                .patch_listing(&listing_id, &ListingFields::price(money))
                .await
        })
    }

    fn delete_product<'a>(&'a self, sku: &'a Sku) -> MarketplaceFuture<'a, ()> {
        Box::pin(async move {
            let session = self.session()?;
            let listing_id = session.require_listing(sku).await?;
            let url = session.shop_url(&format!("/listings/{}", encode(&listing_id)));
            session.executor.delete(&url, &session.credentials).await
        })
    }

    fn import_orders<'a>(
        &'a self,
        since: UtcDateTime,
        signal: &'a CancelSignal,
    ) -> MarketplaceFuture<'a, Vec<Order>> {
        Box::pin(async move {
            let session = self.session()?;
            if signal.is_stopped() {
                return Err(MarketplaceError::cancelled());
            }
            session.fetch_receipts(since, signal).await
        })
    }

    fn update_order_status<'a>(
        &'a self,
        order_id: &'a str,
        status: &'a str,
    ) -> MarketplaceFuture<'a, ()> {
        Box::pin(async move {
            debug!(order_id, status, "etsy receipts have no writable status; skipping");
            Ok(())
        })
    }

    fn mark_as_shipped<'a>(
        &'a self,
        order_id: &'a str,
        shipment: &'a Shipment,
    ) -> MarketplaceFuture<'a, ()> {
        Box::pin(async move {
            let session = self.session()?;
            let url = session.shop_url(&format!("/receipts/{}/tracking", encode(order_id)));
            let body = TrackingRequest {
                carrier_name: &shipment.carrier,
                tracking_code: &shipment.tracking_code,
            };
            session
                .executor
                .send::<IgnoredAny, _>(HttpMethod::Post, &url, &session.credentials, &body)
                .await
                .map(|_| ())
        })
    }

    fn categories<'a>(&'a self) -> MarketplaceFuture<'a, Vec<Category>> {
        Box::pin(async move {
            let session = self.session()?;
            let url = format!("{}/application/seller-taxonomy/nodes", session.base_url);
            let page: Page<TaxonomyNode> = session.executor.get(&url, &session.credentials).await?;

            let mut categories = Vec::new();
            flatten_taxonomy(page.results, None, &mut categories);
            Ok(categories)
        })
    }

    fn generate_feed<'a>(
        &'a self,
        products: &'a [Product],
    ) -> MarketplaceFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            debug!(products = products.len(), "etsy is API driven; no feed generated");
            Ok(None)
        })
    }
}

/// Per-configuration state: credentials, base URL and a paced executor.
struct EtsySession {
    config: Arc<MarketplaceConfig>,
    credentials: ApiCredentials,
    executor: RequestExecutor,
    base_url: String,
}

impl EtsySession {
    fn new(http_client: Arc<dyn HttpClient>, config: MarketplaceConfig) -> Self {
        let pacer = config
            .requests_per_second
            .and_then(RequestPacer::per_second)
            .map(Arc::new);
        let executor = RequestExecutor::new(http_client)
            .with_timeout_ms(config.timeout_ms)
            .with_pacer(pacer);
        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(ETSY_API_URL)
            .trim_end_matches('/')
            .to_owned();

        Self {
            credentials: ApiCredentials::new(
                config.access_token.trim(),
                config.api_key.trim(),
            ),
            executor,
            base_url,
            config: Arc::new(config),
        }
    }

    fn shop_url(&self, path: &str) -> String {
        format!(
            "{}/application/shops/{}{path}",
            self.base_url,
            encode(self.config.shop_id.trim())
        )
    }

    async fn find_listing(&self, sku: &Sku) -> Result<Option<String>, MarketplaceError> {
        let url = self.shop_url(&format!("/listings?sku={}", encode(sku.as_str())));
        let page: Page<ListingSummary> = self.executor.get(&url, &self.credentials).await?;
        Ok(select_listing(page.results, sku))
    }

    async fn require_listing(&self, sku: &Sku) -> Result<String, MarketplaceError> {
        self.find_listing(sku)
            .await?
            .ok_or_else(|| MarketplaceError::not_found(sku))
    }

    async fn patch_listing(
        &self,
        listing_id: &str,
        fields: &ListingFields,
    ) -> Result<(), MarketplaceError> {
        let url = self.shop_url(&format!("/listings/{}", encode(listing_id)));
        self.executor
            .send::<IgnoredAny, _>(HttpMethod::Patch, &url, &self.credentials, fields)
            .await
            .map(|_| ())
    }

    /// Lookup by SKU, then update in place or create and attach images.
    async fn upsert_listing(&self, product: &Product) -> Result<(), MarketplaceError> {
        let fields = ListingFields::for_product(product, &self.config.currency_code)?;

        if let Some(listing_id) = self.find_listing(&product.sku).await? {
            debug!(sku = %product.sku, %listing_id, "updating existing listing");
            return self.patch_listing(&listing_id, &fields).await;
        }

        let url = self.shop_url("/listings");
        let created: Option<ListingSummary> = self
            .executor
            .send(HttpMethod::Post, &url, &self.credentials, &fields)
            .await?;

        match created.and_then(|listing| listing.listing_id) {
            Some(listing_id) => {
                debug!(sku = %product.sku, %listing_id, "created listing");
                self.upload_images(&listing_id, &product.sku, &product.images)
                    .await;
            }
            None if !product.images.is_empty() => {
                warn!(sku = %product.sku, "create response carried no listing id; images skipped");
            }
            None => {}
        }
        Ok(())
    }

    async fn upload_images(&self, listing_id: &str, sku: &Sku, images: &[String]) {
        let url = self.shop_url(&format!("/listings/{}/images", encode(listing_id)));
        for (index, image_url) in images.iter().enumerate() {
            let body = ImageRequest {
                image_url,
                rank: index + 1,
            };
            if let Err(error) = self
                .executor
                .send::<IgnoredAny, _>(HttpMethod::Post, &url, &self.credentials, &body)
                .await
            {
                warn!(%sku, listing_id, rank = index + 1, code = error.code(), "image upload failed");
            }
        }
    }

    async fn fetch_receipts(
        &self,
        since: UtcDateTime,
        signal: &CancelSignal,
    ) -> Result<Vec<Order>, MarketplaceError> {
        let mut orders = Vec::new();
        let mut offset = 0_usize;

        loop {
            let url = self.shop_url(&format!(
                "/receipts?min_created={}&limit={RECEIPTS_PAGE_SIZE}&offset={offset}",
                since.unix_seconds()
            ));
            let page: Page<Receipt> = self.executor.get(&url, &self.credentials).await?;
            let fetched = page.results.len();

            for receipt in page.results {
                if let Some(created) = receipt.create_timestamp {
                    if created < since.unix_seconds() {
                        debug!(receipt_id = ?receipt.receipt_id, created, "dropping receipt older than cutoff");
                        continue;
                    }
                }
                orders.push(receipt.into_order());
            }

            offset += fetched;
            let exhausted = fetched < RECEIPTS_PAGE_SIZE
                || page
                    .count
                    .is_some_and(|count| offset as i64 >= count);
            if exhausted {
                break;
            }

            if let Some(interruption) = signal.interruption() {
                warn!(?interruption, imported = orders.len(), "receipt import stopped early");
                break;
            }
        }

        debug!(orders = orders.len(), "imported etsy receipts");
        Ok(orders)
    }
}

/// Listing payload. Absent fields are omitted so PATCH only touches what is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
struct ListingFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    who_made: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    when_made: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    taxonomy_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_supply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sku: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    should_auto_renew: Option<bool>,
}

impl ListingFields {
    fn for_product(product: &Product, currency_code: &str) -> Result<Self, MarketplaceError> {
        Ok(Self {
            quantity: Some(product.quantity),
            title: Some(truncate_with_ellipsis(&product.name, TITLE_MAX_CHARS)),
            description: Some(product.description.clone()),
            price: Some(wire_price(product.price, currency_code)?),
            who_made: Some(WHO_MADE),
            when_made: Some(WHEN_MADE),
            taxonomy_id: product.category_id.trim().parse().ok(),
            is_supply: Some(false),
            sku: Some(vec![product.sku.as_str().to_owned()]),
            should_auto_renew: Some(true),
        })
    }

    fn quantity(quantity: u32) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }

    fn price(price: Money) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    image_url: &'a str,
    rank: usize,
}

#[derive(Debug, Serialize)]
struct TrackingRequest<'a> {
    carrier_name: &'a str,
    tracking_code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
struct Page<T> {
    #[serde(default, deserialize_with = "lenient::integer")]
    count: Option<i64>,
    #[serde(default, deserialize_with = "lenient::objects")]
    results: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ListingSummary {
    #[serde(default, deserialize_with = "lenient::id")]
    listing_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::strings")]
    skus: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireMoney {
    #[serde(default, deserialize_with = "lenient::integer")]
    amount: Option<i64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    divisor: Option<i64>,
}

impl WireMoney {
    fn decimal(&self) -> f64 {
        decimal_from_parts(self.amount.unwrap_or(0), self.divisor.unwrap_or(0))
    }
}

#[derive(Debug, Default, Deserialize)]
struct Receipt {
    #[serde(default, deserialize_with = "lenient::id")]
    receipt_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    grandtotal: Option<WireMoney>,
    #[serde(default, deserialize_with = "lenient::string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    formatted_address: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    city: Option<String>,
    #[serde(default, deserialize_with = "lenient::objects")]
    transactions: Vec<Transaction>,
    #[serde(default, deserialize_with = "lenient::integer")]
    create_timestamp: Option<i64>,
}

impl Receipt {
    fn into_order(self) -> Order {
        let created_at = self
            .create_timestamp
            .and_then(|seconds| UtcDateTime::from_unix_seconds(seconds).ok())
            .unwrap_or(UtcDateTime::UNIX_EPOCH);

        Order {
            external_id: self.receipt_id.unwrap_or_default(),
            marketplace: MarketplaceId::Etsy,
            status: self.status.unwrap_or_default(),
            total: self.grandtotal.as_ref().map_or(0.0, WireMoney::decimal),
            customer_name: self.name.unwrap_or_default(),
            delivery_address: self.formatted_address.unwrap_or_default(),
            delivery_city: self.city.unwrap_or_default(),
            items: self
                .transactions
                .into_iter()
                .map(Transaction::into_item)
                .collect(),
            created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Transaction {
    #[serde(default, deserialize_with = "lenient::id")]
    transaction_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient::object")]
    price: Option<WireMoney>,
}

impl Transaction {
    fn into_item(self) -> OrderItem {
        let quantity = self
            .quantity
            .and_then(|quantity| u32::try_from(quantity).ok())
            .unwrap_or(0);
        OrderItem::new(
            self.transaction_id.unwrap_or_default(),
            self.title.unwrap_or_default(),
            quantity,
            self.price.as_ref().map_or(0.0, WireMoney::decimal),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct TaxonomyNode {
    #[serde(default, deserialize_with = "lenient::id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient::id")]
    parent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::objects")]
    children: Vec<TaxonomyNode>,
}

/// Depth-first flatten; children without an explicit parent inherit the enclosing node.
fn flatten_taxonomy(nodes: Vec<TaxonomyNode>, parent: Option<&str>, out: &mut Vec<Category>) {
    for node in nodes {
        let id = node.id.unwrap_or_default();
        let parent_id = node.parent_id.or_else(|| parent.map(str::to_owned));
        out.push(Category {
            id: id.clone(),
            name: node.name.unwrap_or_default(),
            parent_id,
        });
        flatten_taxonomy(node.children, Some(id.as_str()), out);
    }
}

/// Prefers an exact SKU match; listings without SKU data fall back to the first one.
fn select_listing(listings: Vec<ListingSummary>, sku: &Sku) -> Option<String> {
    let mut fallback = None;
    for listing in listings {
        let Some(listing_id) = listing.listing_id else {
            continue;
        };
        if listing.skus.iter().any(|candidate| candidate == sku.as_str()) {
            return Some(listing_id);
        }
        if listing.skus.is_empty() && fallback.is_none() {
            fallback = Some(listing_id);
        }
    }
    fallback
}

fn wire_price(price: f64, currency_code: &str) -> Result<Money, MarketplaceError> {
    Money::from_decimal(price, currency_code)
        .map_err(|error| MarketplaceError::invalid_request(error.to_string()))
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
