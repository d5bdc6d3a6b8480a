//! # Domain Models
//!
//! Canonical schema types shared by every marketplace adapter.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Product`] | Catalog product handed to adapters for export |
//! | [`Order`] / [`OrderItem`] | Imported order with derived line totals |
//! | [`Category`] | Flat taxonomy node, tree rebuilt via `parent_id` |
//! | [`Sku`] | Validated stock-keeping unit |
//! | [`Money`] | Minor-unit price triple used on the wire |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Adapters never hand raw wire payloads upward; everything crossing the
//! adapter boundary is one of these types.

mod models;
mod money;
mod sku;
mod text;
mod timestamp;

pub use models::{Category, CategoryMapping, Order, OrderItem, Product, Shipment};
pub use money::{validate_currency_code, Money, MINOR_UNIT_DIVISOR};
pub(crate) use money::decimal_from_parts;
pub use sku::Sku;
pub use text::truncate_with_ellipsis;
pub use timestamp::UtcDateTime;
