use std::io::Write;

use marketsync_core::{CoreError, MarketplaceId, UtcDateTime};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::CliError;

pub const SCHEMA_VERSION: &str = "v1";

/// Document printed to stdout for every command.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub meta: EnvelopeMeta,
    pub data: Value,
    pub errors: Vec<EnvelopeError>,
}

#[derive(Debug, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: Uuid,
    pub schema_version: &'static str,
    pub command: &'static str,
    pub generated_at: UtcDateTime,
    pub latency_ms: u64,
    pub warnings: Vec<String>,
}

/// One failed marketplace call within a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<MarketplaceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl EnvelopeError {
    pub fn from_core(marketplace: Option<MarketplaceId>, error: &CoreError) -> Self {
        Self {
            code: error.code().to_owned(),
            message: error.to_string(),
            marketplace,
            retryable: error.as_marketplace().map(|error| error.retryable()),
        }
    }
}

pub fn render<W>(writer: &mut W, envelope: &Envelope, pretty: bool) -> Result<(), CliError>
where
    W: Write,
{
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, envelope)?;
    } else {
        serde_json::to_writer(&mut *writer, envelope)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketsync_core::MarketplaceError;
    use serde_json::json;

    fn envelope(errors: Vec<EnvelopeError>) -> Envelope {
        Envelope {
            meta: EnvelopeMeta {
                request_id: Uuid::new_v4(),
                schema_version: SCHEMA_VERSION,
                command: "status",
                generated_at: UtcDateTime::UNIX_EPOCH,
                latency_ms: 3,
                warnings: Vec::new(),
            },
            data: json!({ "ok": true }),
            errors,
        }
    }

    #[test]
    fn compact_output_is_a_single_line() {
        let mut buffer = Vec::new();
        render(&mut buffer, &envelope(Vec::new()), false).expect("renders");

        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(text.lines().count(), 1);
        let parsed: Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(parsed["meta"]["command"], "status");
        assert_eq!(parsed["meta"]["generated_at"], "1970-01-01T00:00:00Z");
        assert_eq!(parsed["data"]["ok"], true);
    }

    #[test]
    fn marketplace_errors_keep_code_and_retryability() {
        let error = CoreError::from(MarketplaceError::rate_limited("slow down"));
        let entry = EnvelopeError::from_core(Some(MarketplaceId::Etsy), &error);

        let mut buffer = Vec::new();
        render(&mut buffer, &envelope(vec![entry]), true).expect("renders");

        let parsed: Value = serde_json::from_slice(&buffer).expect("valid json");
        assert_eq!(
            parsed["errors"][0],
            json!({
                "code": "marketplace.rate_limited",
                "message": "slow down (marketplace.rate_limited)",
                "marketplace": "etsy",
                "retryable": true,
            })
        );
    }
}
