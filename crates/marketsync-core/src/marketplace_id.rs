use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Marketplace tags used to key the adapter registry and tag results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketplaceId {
    Etsy,
}

impl MarketplaceId {
    pub const ALL: [Self; 1] = [Self::Etsy];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Etsy => "etsy",
        }
    }

    /// Prefix used for environment variables carrying this marketplace's settings.
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::Etsy => "ETSY",
        }
    }
}

impl Display for MarketplaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketplaceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "etsy" => Ok(Self::Etsy),
            other => Err(ValidationError::InvalidMarketplace {
                value: other.to_owned(),
            }),
        }
    }
}
