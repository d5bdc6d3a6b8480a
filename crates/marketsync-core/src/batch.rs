use std::future::Future;

use tracing::{info, warn};

use crate::{
    CancelSignal, Interruption, MarketplaceError, MarketplaceId, Product, SyncDirection,
    SyncResult,
};

/// Runs one export batch, item by item, in the calling task.
///
/// Every product is handed to `upsert` independently. A failing item is
/// recorded and the loop moves on; the loop stops early only when the signal
/// fires (checked before each item) or when an error halts the batch, in which
/// case the failing item is recorded and the rest stay unprocessed.
///
/// # Errors
///
/// Returns [`MarketplaceError::cancelled`] when the signal has already fired
/// before the first item; no result is produced in that case.
pub async fn run_export_batch<'a, F, Fut>(
    marketplace: MarketplaceId,
    products: &'a [Product],
    signal: &CancelSignal,
    mut upsert: F,
) -> Result<SyncResult, MarketplaceError>
where
    F: FnMut(&'a Product) -> Fut,
    Fut: Future<Output = Result<(), MarketplaceError>>,
{
    if signal.is_stopped() {
        return Err(MarketplaceError::cancelled());
    }

    let mut result = SyncResult::start(marketplace, SyncDirection::Export, products.len());
    info!(
        marketplace = %marketplace,
        sync_id = %result.id(),
        total = products.len(),
        "export batch started"
    );

    for product in products {
        if let Some(interruption) = signal.interruption() {
            info!(
                marketplace = %marketplace,
                processed = result.processed_items(),
                ?interruption,
                "export batch interrupted"
            );
            result.interrupt(interruption);
            break;
        }

        match upsert(product).await {
            Ok(()) => result.record_success(),
            Err(error) => {
                warn!(
                    marketplace = %marketplace,
                    sku = %product.sku,
                    code = error.code(),
                    "export item failed: {}",
                    error.message()
                );
                let halts = error.halts_batch();
                result.record_failure(product.sku.as_str(), &error);
                if halts {
                    warn!(
                        marketplace = %marketplace,
                        remaining = result.remaining_items(),
                        "export batch halted"
                    );
                    result.interrupt(Interruption::Halted {
                        code: error.code().to_owned(),
                    });
                    break;
                }
            }
        }
    }

    result.finish();
    info!(
        marketplace = %marketplace,
        sync_id = %result.id(),
        status = ?result.status(),
        success = result.success_items(),
        failed = result.failed_items(),
        "export batch finished"
    );
    Ok(result)
}
