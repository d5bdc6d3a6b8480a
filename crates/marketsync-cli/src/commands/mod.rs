mod catalog;
mod export;
mod import;
mod listing;
mod orders;
mod status;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use marketsync_core::{
    CancelSignal, CoreError, FanOut, MarketplaceConfig, MarketplaceId, MarketplaceRegistryBuilder,
    MemorySyncStore, StoreSnapshot, SyncService, SyncStore,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::EnvelopeError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Splits fan-out outcomes into per-marketplace data and error entries.
    pub fn from_fan_out<T, F>(outcomes: FanOut<T>, mut to_value: F) -> Result<Self, CliError>
    where
        F: FnMut(T) -> Result<Value, CliError>,
    {
        let mut data = serde_json::Map::new();
        let mut errors = Vec::new();
        for (marketplace, outcome) in outcomes {
            match outcome {
                Ok(value) => {
                    data.insert(marketplace.to_string(), to_value(value)?);
                }
                Err(error) => errors.push(EnvelopeError::from_core(Some(marketplace), &error)),
            }
        }

        let mut result = Self {
            data: Value::Object(data),
            warnings: Vec::new(),
            errors,
        };
        if result.errors.is_empty() && result.data.as_object().is_some_and(|data| data.is_empty()) {
            result = result.with_warning("no configured and enabled marketplace");
        }
        Ok(result)
    }
}

/// Shared state handed to each command.
pub struct Context {
    pub service: SyncService,
    store: Arc<MemorySyncStore>,
    pub signal: CancelSignal,
}

impl Context {
    pub fn build(cli: &Cli, signal: CancelSignal) -> Result<Self, CliError> {
        let configs = match &cli.config {
            Some(path) => read_json::<Vec<MarketplaceConfig>>(path, "marketplace configs")?,
            None => Vec::new(),
        };

        let mut builder = MarketplaceRegistryBuilder::new().with_configs(configs);
        if cli.config.is_none() {
            builder = builder.with_env_credentials();
        }
        let registry = builder.build()?;

        if let Some(timeout_ms) = cli.timeout_ms {
            for adapter in registry.adapters() {
                if let Some(config) = adapter.config() {
                    if config.timeout_ms != timeout_ms {
                        adapter.configure(MarketplaceConfig {
                            timeout_ms,
                            ..(*config).clone()
                        })?;
                    }
                }
            }
        }

        let store = Arc::new(match &cli.state {
            Some(path) if path.exists() => {
                MemorySyncStore::from_snapshot(read_json::<StoreSnapshot>(path, "sync state")?)
            }
            _ => MemorySyncStore::new(),
        });
        let service = SyncService::new(registry, Arc::clone(&store) as Arc<dyn SyncStore>);

        Ok(Self {
            service,
            store,
            signal,
        })
    }

    /// Writes the store back when a state file is in use.
    pub fn persist(&self, path: Option<&Path>) -> Result<(), CliError> {
        let Some(path) = path else {
            return Ok(());
        };
        let snapshot = self.store.snapshot().map_err(CoreError::from)?;
        fs::write(path, serde_json::to_vec_pretty(&snapshot)?)?;
        debug!(path = %path.display(), results = snapshot.results.len(), "sync state saved");
        Ok(())
    }
}

pub async fn run(cli: &Cli, signal: CancelSignal) -> Result<CommandResult, CliError> {
    let context = Context::build(cli, signal)?;
    info!(command = cli.command.name(), "running command");

    let result = match &cli.command {
        Command::Status => status::run(&context)?,
        Command::Export(args) => export::run(args, &context).await?,
        Command::Import(args) => import::run(args, &context).await?,
        Command::Stock(args) => listing::stock(args, &context).await?,
        Command::Price(args) => listing::price(args, &context).await?,
        Command::Delete(args) => listing::delete(args, &context).await?,
        Command::Categories(args) => catalog::categories(args, &context).await?,
        Command::Ship(args) => orders::ship(args, &context).await?,
        Command::OrderStatus(args) => orders::status(args, &context).await?,
        Command::History(args) => catalog::history(args, &context)?,
    };

    context.persist(cli.state.as_deref())?;
    Ok(result)
}

/// Outcome of a single-marketplace call, reported the same way as fan-outs.
pub fn single<T, F>(
    marketplace: MarketplaceId,
    outcome: Result<T, CoreError>,
    to_value: F,
) -> Result<CommandResult, CliError>
where
    F: FnMut(T) -> Result<Value, CliError>,
{
    CommandResult::from_fan_out(vec![(marketplace, outcome)], to_value)
}

pub fn to_value<T: Serialize>(value: T) -> Result<Value, CliError> {
    Ok(serde_json::to_value(value)?)
}

pub fn read_json<T>(path: &Path, expected: &'static str) -> Result<T, CliError>
where
    T: DeserializeOwned,
{
    let text = fs::read_to_string(path).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Decode {
        path: path.to_path_buf(),
        expected,
        source,
    })
}
