//! CLI argument definitions for MarketSync.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `status` | Per-marketplace configuration and last export |
//! | `export` | Upsert products from a JSON file |
//! | `import` | Import orders created since a timestamp |
//! | `stock` | Set listing quantity for one SKU |
//! | `price` | Set listing price for one SKU |
//! | `delete` | Remove the listing for one SKU |
//! | `categories` | List the marketplace taxonomy |
//! | `ship` | Push carrier and tracking for an order |
//! | `order-status` | Push an order status |
//! | `history` | Recorded sync results, newest first |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | env | JSON file with marketplace configs |
//! | `--state` | none | JSON file persisting history, orders and mappings |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | config | Per-request timeout override |
//! | `--deadline-secs` | none | Stop batches after this many seconds |
//!
//! # Examples
//!
//! ```bash
//! marketsync export products.json --marketplace etsy --pretty
//! marketsync import --since 2024-05-01T00:00:00Z
//! marketsync price MUG-01 19.99
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use marketsync_core::MarketplaceId;

/// MarketSync - keep a shop catalog in sync with external marketplaces.
///
/// Credentials come from `--config` or from `MARKETSYNC_<MARKETPLACE>_*`
/// environment variables. Results are printed to stdout as JSON; logs go to
/// stderr and honor `RUST_LOG`.
#[derive(Debug, Parser)]
#[command(
    name = "marketsync",
    author,
    version,
    about = "Marketplace catalog and order sync"
)]
pub struct Cli {
    /// JSON file holding an array of marketplace configs.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON file used to persist sync history, imported orders and mappings.
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Per-request timeout in milliseconds, overriding the config.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Stop batch work after this many seconds; partial results are kept.
    #[arg(long, global = true)]
    pub deadline_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show configuration state and the last export per marketplace.
    Status,

    /// Create or update listings for every product in a JSON file.
    ///
    /// # Examples
    ///
    ///   marketsync export products.json
    ///   marketsync export products.json --marketplace etsy
    Export(ExportArgs),

    /// Import orders; defaults to everything since the last import.
    Import(ImportArgs),

    /// Set the stock quantity of one SKU.
    Stock(StockArgs),

    /// Set the price of one SKU.
    ///
    /// Without `--marketplace` every active marketplace is updated and its
    /// configured markup is applied.
    Price(PriceArgs),

    /// Delete the listing of one SKU.
    Delete(SkuArgs),

    /// List the marketplace taxonomy.
    Categories(MarketplaceArgs),

    /// Mark an order as shipped with carrier and tracking code.
    Ship(ShipArgs),

    /// Push a status for an imported order.
    OrderStatus(OrderStatusArgs),

    /// Show recorded sync results.
    History(HistoryArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// JSON file holding an array of products.
    pub products: PathBuf,

    /// Export to one marketplace only; defaults to all active ones.
    #[arg(long)]
    pub marketplace: Option<MarketplaceId>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// RFC3339 UTC lower bound on order creation time.
    #[arg(long)]
    pub since: Option<String>,

    #[arg(long)]
    pub marketplace: Option<MarketplaceId>,
}

#[derive(Debug, Args)]
pub struct StockArgs {
    pub sku: String,

    pub quantity: u32,

    #[arg(long)]
    pub marketplace: Option<MarketplaceId>,
}

#[derive(Debug, Args)]
pub struct PriceArgs {
    pub sku: String,

    pub price: f64,

    #[arg(long)]
    pub marketplace: Option<MarketplaceId>,
}

#[derive(Debug, Args)]
pub struct SkuArgs {
    pub sku: String,

    #[arg(long, default_value = "etsy")]
    pub marketplace: MarketplaceId,
}

#[derive(Debug, Args)]
pub struct MarketplaceArgs {
    #[arg(long, default_value = "etsy")]
    pub marketplace: MarketplaceId,
}

#[derive(Debug, Args)]
pub struct ShipArgs {
    /// Marketplace order id (Etsy receipt id).
    pub order_id: String,

    #[arg(long)]
    pub carrier: String,

    #[arg(long)]
    pub tracking_code: String,

    #[arg(long, default_value = "etsy")]
    pub marketplace: MarketplaceId,
}

#[derive(Debug, Args)]
pub struct OrderStatusArgs {
    pub order_id: String,

    pub status: String,

    #[arg(long, default_value = "etsy")]
    pub marketplace: MarketplaceId,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[arg(long, default_value = "etsy")]
    pub marketplace: MarketplaceId,

    /// Maximum number of results to return.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Export(_) => "export",
            Self::Import(_) => "import",
            Self::Stock(_) => "stock",
            Self::Price(_) => "price",
            Self::Delete(_) => "delete",
            Self::Categories(_) => "categories",
            Self::Ship(_) => "ship",
            Self::OrderStatus(_) => "order-status",
            Self::History(_) => "history",
        }
    }
}
