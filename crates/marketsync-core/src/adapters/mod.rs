//! Marketplace adapter implementations.

mod lenient;

pub mod etsy;

pub use etsy::{EtsyAdapter, ETSY_API_URL};
