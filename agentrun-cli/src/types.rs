//! Common types used across CLI modules

use std::str::FromStr;
use uuid::Uuid;

/// Identifier that can be either a full UUID or an unambiguous prefix
#[derive(Debug, Clone, PartialEq)]
pub enum IdOrPrefix {
    /// Full UUID
    Full(Uuid),
    /// Lowercased prefix that should uniquely identify a resource
    Prefix(String),
}

impl IdOrPrefix {
    /// Whether `id` is the one this identifier names
    pub fn matches(&self, id: &Uuid) -> bool {
        match self {
            IdOrPrefix::Full(uuid) => uuid == id,
            IdOrPrefix::Prefix(prefix) => id.to_string().starts_with(prefix.as_str()),
        }
    }
}

impl FromStr for IdOrPrefix {
    type Err = String;

    /// Parses a full UUID first, otherwise treats the input as a prefix
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if let Ok(uuid) = Uuid::parse_str(input) {
            return Ok(IdOrPrefix::Full(uuid));
        }

        if input.is_empty() {
            return Err("id cannot be empty".to_string());
        }
        if !input.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            return Err(format!("'{}' is not a UUID or UUID prefix", input));
        }

        Ok(IdOrPrefix::Prefix(input.to_lowercase()))
    }
}

impl std::fmt::Display for IdOrPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdOrPrefix::Full(uuid) => write!(f, "{}", uuid),
            IdOrPrefix::Prefix(prefix) => write!(f, "{}", prefix),
        }
    }
}
