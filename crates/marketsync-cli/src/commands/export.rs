use std::path::Path;

use marketsync_core::{Product, SyncResult};
use tracing::info;

use crate::cli::ExportArgs;
use crate::error::CliError;

use super::{read_json, to_value, CommandResult, Context};

pub async fn run(args: &ExportArgs, context: &Context) -> Result<CommandResult, CliError> {
    let products = load_products(&args.products)?;
    info!(products = products.len(), "loaded products");

    let outcomes = match args.marketplace {
        Some(marketplace) => vec![(
            marketplace,
            context
                .service
                .export_products(marketplace, &products, &context.signal)
                .await,
        )],
        None => context.service.export_all(&products, &context.signal).await,
    };

    let mut warnings = Vec::new();
    for (marketplace, outcome) in &outcomes {
        if let Some(warning) = outcome.as_ref().ok().and_then(batch_warning) {
            warnings.push(format!("{marketplace}: {warning}"));
        }
    }

    let mut result = CommandResult::from_fan_out(outcomes, to_value)?;
    for warning in warnings {
        result = result.with_warning(warning);
    }
    Ok(result)
}

/// Reads a JSON array of products and re-checks each one.
pub fn load_products(path: &Path) -> Result<Vec<Product>, CliError> {
    let products: Vec<Product> = read_json(path, "a product list")?;
    for product in &products {
        product.validate()?;
    }
    Ok(products)
}

fn batch_warning(result: &SyncResult) -> Option<String> {
    if let Some(interruption) = result.interruption() {
        return Some(format!(
            "stopped early ({interruption:?}); {} item(s) not processed",
            result.remaining_items()
        ));
    }
    result
        .has_partial_failure()
        .then(|| format!("{} of {} item(s) failed", result.failed_items(), result.total_items()))
}
