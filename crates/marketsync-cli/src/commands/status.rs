use serde_json::json;

use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(context: &Context) -> Result<CommandResult, CliError> {
    let statuses = context.service.status()?;
    let mut result = CommandResult::ok(json!({ "marketplaces": statuses }));
    if statuses.iter().all(|status| !status.configured) {
        result = result
            .with_warning("no marketplace has credentials; see --config or MARKETSYNC_* env vars");
    }
    Ok(result)
}
