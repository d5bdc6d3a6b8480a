use marketsync_core::Sku;
use serde_json::json;

use crate::cli::{PriceArgs, SkuArgs, StockArgs};
use crate::error::CliError;

use super::{single, CommandResult, Context};

pub async fn stock(args: &StockArgs, context: &Context) -> Result<CommandResult, CliError> {
    let sku = Sku::parse(&args.sku)?;
    let outcomes = match args.marketplace {
        Some(marketplace) => vec![(
            marketplace,
            context
                .service
                .update_stock(marketplace, &sku, args.quantity)
                .await,
        )],
        None => context.service.update_stock_all(&sku, args.quantity).await,
    };
    CommandResult::from_fan_out(outcomes, |()| {
        Ok(json!({ "sku": sku, "quantity": args.quantity }))
    })
}

/// A single marketplace gets the price as given; the fan-out applies each
/// marketplace's configured markup.
pub async fn price(args: &PriceArgs, context: &Context) -> Result<CommandResult, CliError> {
    let sku = Sku::parse(&args.sku)?;
    match args.marketplace {
        Some(marketplace) => {
            let outcome = context
                .service
                .update_price(marketplace, &sku, args.price)
                .await;
            single(marketplace, outcome, |()| {
                Ok(json!({ "sku": sku, "price": args.price, "markup_applied": false }))
            })
        }
        None => {
            let outcomes = context.service.update_price_all(&sku, args.price).await;
            CommandResult::from_fan_out(outcomes, |()| {
                Ok(json!({ "sku": sku, "base_price": args.price, "markup_applied": true }))
            })
        }
    }
}

pub async fn delete(args: &SkuArgs, context: &Context) -> Result<CommandResult, CliError> {
    let sku = Sku::parse(&args.sku)?;
    let outcome = context.service.delete_product(args.marketplace, &sku).await;
    single(args.marketplace, outcome, |()| {
        Ok(json!({ "sku": sku, "deleted": true }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use marketsync_core::CancelSignal;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime builds")
            .block_on(future)
    }

    fn unconfigured_context() -> Context {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = dir.path().join("config.json");
        std::fs::write(&config, "[]").expect("write config");
        let cli = Cli::try_parse_from(["marketsync", "--config", config.to_str().expect("utf8"), "status"])
            .expect("valid arguments");
        Context::build(&cli, CancelSignal::none()).expect("context builds")
    }

    #[test]
    fn blank_sku_is_rejected_before_any_marketplace_call() {
        let context = unconfigured_context();
        let args = StockArgs {
            sku: String::from("   "),
            quantity: 1,
            marketplace: None,
        };

        let error = block_on(stock(&args, &context)).err().expect("invalid sku");

        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn unconfigured_marketplace_is_reported_as_an_envelope_error() {
        let context = unconfigured_context();
        let args = SkuArgs {
            sku: String::from("MUG-01"),
            marketplace: marketsync_core::MarketplaceId::Etsy,
        };

        let result = block_on(delete(&args, &context)).expect("command completes");

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, "marketplace.not_configured");
    }

    #[test]
    fn fan_out_without_active_marketplaces_warns() {
        let context = unconfigured_context();
        let args = PriceArgs {
            sku: String::from("MUG-01"),
            price: 12.0,
            marketplace: None,
        };

        let result = block_on(price(&args, &context)).expect("command completes");

        assert!(result.errors.is_empty());
        assert_eq!(result.warnings, vec!["no configured and enabled marketplace"]);
    }
}
