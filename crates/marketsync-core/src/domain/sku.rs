use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SKU_LEN: usize = 64;

/// Stock-keeping unit; the join key between a local product and its remote listing.
///
/// SKUs are trimmed but otherwise kept verbatim: marketplaces compare them
/// case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySku);
        }

        let len = trimmed.chars().count();
        if len > MAX_SKU_LEN {
            return Err(ValidationError::SkuTooLong {
                len,
                max: MAX_SKU_LEN,
            });
        }

        if let Some(index) = trimmed.chars().position(char::is_control) {
            return Err(ValidationError::SkuControlChar { index });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Sku {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Sku {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Sku> for String {
    fn from(value: Sku) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_but_preserves_case() {
        let sku = Sku::parse("  mug-Blue-01 ").expect("valid sku");
        assert_eq!(sku.as_str(), "mug-Blue-01");
    }

    #[test]
    fn rejects_blank_and_oversized_values() {
        assert_eq!(Sku::parse("   "), Err(ValidationError::EmptySku));
        assert!(matches!(
            Sku::parse(&"x".repeat(65)),
            Err(ValidationError::SkuTooLong { len: 65, max: 64 })
        ));
    }

    #[test]
    fn rejects_control_characters() {
        assert_eq!(
            Sku::parse("ab\tcd"),
            Err(ValidationError::SkuControlChar { index: 2 })
        );
    }
}
