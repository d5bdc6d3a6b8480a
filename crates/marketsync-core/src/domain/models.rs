use serde::{Deserialize, Serialize};

use crate::{MarketplaceId, Sku, UtcDateTime, ValidationError};

/// Catalog product as handed to an adapter for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: Sku,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    pub fn new(
        sku: Sku,
        name: impl Into<String>,
        price: f64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;

        Ok(Self {
            sku,
            name: name.into(),
            description: String::new(),
            price,
            quantity,
            category_id: String::new(),
            images: Vec::new(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = category_id.into();
        self
    }

    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }

    /// Re-checks the invariants a deserialized product may have skipped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_non_negative("price", self.price)
    }
}

/// Order imported from a marketplace. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub external_id: String,
    pub marketplace: MarketplaceId,
    pub status: String,
    pub total: f64,
    pub customer_name: String,
    pub delivery_address: String,
    pub delivery_city: String,
    pub items: Vec<OrderItem>,
    pub created_at: UtcDateTime,
}

/// Single order line. The line total is derived from `price` and `quantity`
/// on every read; a serialized `total` is written for consumers and ignored on
/// input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "OrderItemWire", into = "OrderItemWire")]
pub struct OrderItem {
    pub external_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

impl OrderItem {
    pub fn new(
        external_id: impl Into<String>,
        name: impl Into<String>,
        quantity: u32,
        price: f64,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
            quantity,
            price,
        }
    }

    pub fn total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

#[derive(Serialize, Deserialize)]
struct OrderItemWire {
    external_id: String,
    name: String,
    quantity: u32,
    price: f64,
    #[serde(default)]
    total: f64,
}

impl From<OrderItemWire> for OrderItem {
    fn from(wire: OrderItemWire) -> Self {
        Self::new(wire.external_id, wire.name, wire.quantity, wire.price)
    }
}

impl From<OrderItem> for OrderItemWire {
    fn from(item: OrderItem) -> Self {
        let total = item.total();
        Self {
            external_id: item.external_id,
            name: item.name,
            quantity: item.quantity,
            price: item.price,
            total,
        }
    }
}

/// Marketplace taxonomy node. Root categories have no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Maps a shop category onto the marketplace taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub shop_category_id: String,
    pub marketplace_category_id: String,
}

/// Tracking details pushed to a marketplace when an order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub carrier: String,
    pub tracking_code: String,
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_item_total_is_derived() {
        let item = OrderItem::new("t-1", "Mug", 3, 12.5);
        assert_eq!(item.total(), 37.5);
    }

    #[test]
    fn deserialized_order_item_ignores_supplied_total() {
        let item: OrderItem = serde_json::from_str(
            r#"{"external_id":"t-1","name":"Mug","quantity":2,"price":4.25,"total":999.0}"#,
        )
        .expect("valid order item");
        assert_eq!(item.total(), 8.5);
    }

    #[test]
    fn order_item_total_follows_field_changes() {
        let mut item = OrderItem::new("t-1", "Mug", 2, 10.0);
        item.price = 5.0;
        item.quantity = 3;

        assert_eq!(item.total(), 15.0);
        let json = serde_json::to_value(&item).expect("serializes");
        assert_eq!(json["total"], 15.0);
    }

    #[test]
    fn rejects_negative_product_price() {
        let sku = Sku::parse("SKU-1").expect("valid sku");
        let err = Product::new(sku, "Lamp", -0.01, 1).expect_err("must fail");
        assert_eq!(err, ValidationError::NegativeValue { field: "price" });
    }

    #[test]
    fn product_json_defaults_optional_fields() {
        let product: Product =
            serde_json::from_str(r#"{"sku":"SKU-1","name":"Lamp","price":10.0}"#)
                .expect("valid product");
        assert!(product.images.is_empty());
        assert_eq!(product.quantity, 0);
        assert!(product.category_id.is_empty());
    }
}
