use serde_json::json;

use crate::cli::{HistoryArgs, MarketplaceArgs};
use crate::error::CliError;

use super::{single, CommandResult, Context};

pub async fn categories(args: &MarketplaceArgs, context: &Context) -> Result<CommandResult, CliError> {
    let outcome = context.service.categories(args.marketplace).await;
    single(args.marketplace, outcome, |categories| {
        Ok(json!({ "count": categories.len(), "categories": categories }))
    })
}

pub fn history(args: &HistoryArgs, context: &Context) -> Result<CommandResult, CliError> {
    let results = context.service.sync_history(args.marketplace, args.limit)?;
    Ok(CommandResult::ok(json!({
        "marketplace": args.marketplace,
        "results": results,
    })))
}
