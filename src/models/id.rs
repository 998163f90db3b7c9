use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier issued by the collaborator.
///
/// The collaborator may hand ids out as JSON numbers or strings depending on
/// how a row was created. Both forms are normalised to the same canonical
/// string so comparisons are always strict equality on `Id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Id::from(n),
            RawId::Text(s) => Id::new(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_ids_compare_equal() {
        let from_number: Id = serde_json::from_str("7").unwrap();
        let from_string: Id = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number, Id::from(7));
    }

    #[test]
    fn serializes_as_string() {
        assert_eq!(serde_json::to_string(&Id::from(12)).unwrap(), "\"12\"");
    }
}
