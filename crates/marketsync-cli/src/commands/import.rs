use marketsync_core::UtcDateTime;

use crate::cli::ImportArgs;
use crate::error::CliError;

use super::{to_value, CommandResult, Context};

pub async fn run(args: &ImportArgs, context: &Context) -> Result<CommandResult, CliError> {
    let since = args.since.as_deref().map(UtcDateTime::parse).transpose()?;

    let outcomes = match args.marketplace {
        Some(marketplace) => vec![(
            marketplace,
            context
                .service
                .import_orders(marketplace, since, &context.signal)
                .await,
        )],
        None if since.is_some() => {
            let mut outcomes = Vec::new();
            for adapter in context.service.registry().active() {
                let id = adapter.id();
                let outcome = context.service.import_orders(id, since, &context.signal).await;
                outcomes.push((id, outcome));
            }
            outcomes
        }
        None => context.service.import_all(&context.signal).await,
    };

    let mut warnings = Vec::new();
    for (marketplace, outcome) in &outcomes {
        if let Ok(import) = outcome {
            if let Some(interruption) = import.result.interruption() {
                warnings.push(format!(
                    "{marketplace}: import stopped early ({interruption:?}); run again to fetch the rest"
                ));
            }
        }
    }

    let mut result = CommandResult::from_fan_out(outcomes, to_value)?;
    for warning in warnings {
        result = result.with_warning(warning);
    }
    Ok(result)
}
