//! In-memory Etsy API used by the integration tests.
//!
//! Serves the shop-scoped listing, receipt and taxonomy endpoints from local
//! state and records every request it sees. Scripted responses, when queued,
//! take precedence over the simulated endpoints.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use marketsync_core::{
    CancelSignal, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, MarketplaceConfig,
    MarketplaceId, Product, Sku,
};
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://etsy.test/v3";
pub const SHOP_ID: &str = "shop-42";

#[derive(Debug, Clone)]
pub struct FakeListing {
    pub listing_id: u64,
    pub sku: Option<String>,
    pub fields: Value,
    pub images: Vec<(String, u64)>,
}

#[derive(Debug, Default)]
struct FakeState {
    next_listing_id: u64,
    listings: Vec<FakeListing>,
    receipts: Vec<Value>,
    taxonomy: Vec<Value>,
    scripted: VecDeque<HttpResponse>,
    rejected_skus: Vec<String>,
    cancel_on_receipts: Option<CancelSignal>,
    requests: Vec<HttpRequest>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeEtsy {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEtsy {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state().next_listing_id = 1000;
        fake
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state lock")
    }

    /// Queues a raw response returned for the next request, whatever it is.
    pub fn script(&self, status: u16, body: &str) {
        self.state()
            .scripted
            .push_back(HttpResponse::new(status, body));
    }

    /// Listing creates carrying this SKU are answered with a 400.
    pub fn reject_creates_for(&self, sku: &str) {
        self.state().rejected_skus.push(sku.to_owned());
    }

    pub fn seed_listing(&self, sku: Option<&str>) -> u64 {
        let mut state = self.state();
        state.next_listing_id += 1;
        let listing_id = state.next_listing_id;
        state.listings.push(FakeListing {
            listing_id,
            sku: sku.map(str::to_owned),
            fields: json!({}),
            images: Vec::new(),
        });
        listing_id
    }

    pub fn add_receipt(&self, receipt: Value) {
        self.state().receipts.push(receipt);
    }

    /// Fires `signal` while the first receipts page is being served.
    pub fn cancel_while_serving_receipts(&self, signal: &CancelSignal) {
        self.state().cancel_on_receipts = Some(signal.clone());
    }

    pub fn set_taxonomy(&self, nodes: Value) {
        self.state().taxonomy = nodes.as_array().cloned().unwrap_or_default();
    }

    pub fn listings(&self) -> Vec<FakeListing> {
        self.state().listings.clone()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().requests.clone()
    }

    pub fn count_requests(&self, method: HttpMethod, path_fragment: &str) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|request| request.method == method && request.url.contains(path_fragment))
            .count()
    }

    fn handle(&self, request: HttpRequest) -> HttpResponse {
        let mut state = self.state();
        state.requests.push(request.clone());
        if let Some(response) = state.scripted.pop_front() {
            return response;
        }

        let Some(rest) = request.url.strip_prefix(BASE_URL) else {
            return HttpResponse::new(404, "unknown host");
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        match (request.method, segments.as_slice()) {
            (HttpMethod::Get, ["application", "seller-taxonomy", "nodes"]) => {
                page(state.taxonomy.clone(), None)
            }
            (_, ["application", "shops", shop, tail @ ..]) if *shop == SHOP_ID => {
                route_shop(&mut state, request.method, tail, query, request.body.as_deref())
            }
            _ => HttpResponse::new(404, r#"{"error":"no route"}"#),
        }
    }
}

impl HttpClient for FakeEtsy {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self.handle(request);
        Box::pin(async move { Ok(response) })
    }
}

fn route_shop(
    state: &mut FakeState,
    method: HttpMethod,
    tail: &[&str],
    query: &str,
    body: Option<&str>,
) -> HttpResponse {
    let body: Value = body
        .and_then(|body| serde_json::from_str(body).ok())
        .unwrap_or(Value::Null);

    match (method, tail) {
        (HttpMethod::Get, ["listings"]) => {
            let sku = query_param(query, "sku");
            let results = state
                .listings
                .iter()
                .filter(|listing| sku.is_none() || listing.sku == sku || listing.sku.is_none())
                .map(|listing| {
                    json!({
                        "listing_id": listing.listing_id,
                        "skus": listing.sku.iter().collect::<Vec<_>>(),
                    })
                })
                .collect();
            page(results, None)
        }
        (HttpMethod::Post, ["listings"]) => {
            let sku = body["sku"][0].as_str().map(str::to_owned);
            if sku
                .as_ref()
                .is_some_and(|sku| state.rejected_skus.contains(sku))
            {
                return HttpResponse::new(400, r#"{"error":"title is invalid"}"#);
            }
            state.next_listing_id += 1;
            let listing_id = state.next_listing_id;
            state.listings.push(FakeListing {
                listing_id,
                sku,
                fields: body,
                images: Vec::new(),
            });
            HttpResponse::new(201, json!({ "listing_id": listing_id }).to_string())
        }
        (HttpMethod::Patch, ["listings", id]) => match find_listing(state, id) {
            Some(listing) => {
                if let (Value::Object(fields), Value::Object(changes)) = (&mut listing.fields, body)
                {
                    fields.extend(changes);
                }
                HttpResponse::ok_json(json!({ "listing_id": listing.listing_id }).to_string())
            }
            None => HttpResponse::new(404, r#"{"error":"listing not found"}"#),
        },
        (HttpMethod::Delete, ["listings", id]) => {
            let before = state.listings.len();
            state
                .listings
                .retain(|listing| listing.listing_id.to_string() != *id);
            if state.listings.len() < before {
                HttpResponse::no_content()
            } else {
                HttpResponse::new(404, r#"{"error":"listing not found"}"#)
            }
        }
        (HttpMethod::Post, ["listings", id, "images"]) => match find_listing(state, id) {
            Some(listing) => {
                let url = body["image_url"].as_str().unwrap_or_default().to_owned();
                let rank = body["rank"].as_u64().unwrap_or_default();
                listing.images.push((url, rank));
                HttpResponse::ok_json("{}")
            }
            None => HttpResponse::new(404, r#"{"error":"listing not found"}"#),
        },
        (HttpMethod::Get, ["receipts"]) => {
            if let Some(signal) = state.cancel_on_receipts.take() {
                signal.cancel();
            }
            let limit = query_param(query, "limit")
                .and_then(|value| value.parse().ok())
                .unwrap_or(25_usize);
            let offset = query_param(query, "offset")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0_usize);
            let total = state.receipts.len();
            let results = state.receipts.iter().skip(offset).take(limit).cloned().collect();
            page(results, Some(total))
        }
        (HttpMethod::Post, ["receipts", _, "tracking"]) => HttpResponse::ok_json("{}"),
        _ => HttpResponse::new(404, r#"{"error":"no route"}"#),
    }
}

fn find_listing<'a>(state: &'a mut FakeState, id: &str) -> Option<&'a mut FakeListing> {
    state
        .listings
        .iter_mut()
        .find(|listing| listing.listing_id.to_string() == id)
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| {
            urlencoding::decode(value)
                .map(|value| value.into_owned())
                .unwrap_or_else(|_| value.to_owned())
        })
    })
}

fn page(results: Vec<Value>, count: Option<usize>) -> HttpResponse {
    let count = count.unwrap_or(results.len());
    HttpResponse::ok_json(json!({ "count": count, "results": results }).to_string())
}

pub fn etsy_config() -> MarketplaceConfig {
    MarketplaceConfig::new(MarketplaceId::Etsy)
        .with_credentials("token-abc", "key-xyz", SHOP_ID)
        .with_base_url(BASE_URL)
}

pub fn product(sku: &str, name: &str, price: f64) -> Product {
    Product::new(Sku::parse(sku).expect("valid sku"), name, price, 3).expect("valid product")
}

pub fn receipt(id: u64, created: i64, items: &[(&str, i64, i64)]) -> Value {
    let transactions: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, (title, quantity, amount))| {
            json!({
                "transaction_id": id * 10 + index as u64,
                "title": title,
                "quantity": quantity,
                "price": { "amount": amount, "divisor": 100, "currency_code": "USD" },
            })
        })
        .collect();
    json!({
        "receipt_id": id,
        "status": "paid",
        "name": "Grace Hopper",
        "formatted_address": "1 Navy Way",
        "city": "Arlington",
        "create_timestamp": created,
        "grandtotal": { "amount": 4200, "divisor": 100, "currency_code": "USD" },
        "transactions": transactions,
    })
}
