//! Options controlling a deserialize call.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;

/// Environment variable enabling [`DeserializeOptions::nest_deserialized_relationships`].
pub const NEST_RELATIONSHIPS_ENV: &str = "DOC_NEST_RELATIONSHIPS";

/// Environment variable enabling [`DeserializeOptions::deserialize_included`].
pub const DESERIALIZE_INCLUDED_ENV: &str = "DOC_DESERIALIZE_INCLUDED";

/// Options for one top-level deserialize call.
///
/// ## Parameters
///
/// - `nest_deserialized_relationships`: replace stub references with the
///   resolved record when the referenced resource is in `included`
/// - `deserialize_included`: deserialize the whole `included` pool up front,
///   so unreachable included resources still appear in the output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeserializeOptions {
    /// Inline resolved included records into relationship fields.
    #[serde(default)]
    pub nest_deserialized_relationships: bool,
    /// Deserialize every included resource, reachable or not.
    #[serde(default)]
    pub deserialize_included: bool,
}

impl DeserializeOptions {
    /// Create options with everything disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that inline included records and keep the whole pool.
    pub fn nested() -> Self {
        Self {
            nest_deserialized_relationships: true,
            deserialize_included: true,
        }
    }

    /// Set relationship nesting.
    pub fn with_nesting(mut self, nest: bool) -> Self {
        self.nest_deserialized_relationships = nest;
        self
    }

    /// Set up-front deserialization of the included pool.
    pub fn with_included(mut self, deserialize_included: bool) -> Self {
        self.deserialize_included = deserialize_included;
        self
    }

    /// Read options from `DOC_NEST_RELATIONSHIPS` and `DOC_DESERIALIZE_INCLUDED`.
    ///
    /// Unset variables leave the option disabled.
    pub fn from_env() -> Self {
        Self {
            nest_deserialized_relationships: env_flag(NEST_RELATIONSHIPS_ENV),
            deserialize_included: env_flag(DESERIALIZE_INCLUDED_ENV),
        }
    }

    /// Hash of the options, for correlating log lines.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
