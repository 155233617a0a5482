use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for a stored entity
///
/// Backends assign ids in their native form (auto-increment integers,
/// store-generated strings). EntityId normalizes all of them to a single
/// opaque value so the registry never has to know which backend it is
/// talking to. Only the storage adapters look inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a backend-native id in its opaque form
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EntityId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        Self(raw.to_string())
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_and_string_ids_normalize() {
        assert_eq!(EntityId::from(7), EntityId::new("7"));
        assert_eq!(EntityId::new("0190cafe"), EntityId::from("0190cafe"));
    }

    #[test]
    fn test_display_round_trip() {
        let id = EntityId::new("42");
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.as_str(), "42");
    }
}
