// crates/bucketeer-mcp-core/src/feature.rs
// ============================================================================
// Module: Feature Model
// Description: Typed read-only view of feature flags returned by the service.
// Purpose: Inspect returned flags for invariant violations and summaries.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Features returned by the remote service are passed through to callers as
//! raw JSON without mutation. This module provides a lenient typed view used
//! to summarize results and to check the structural invariants a well-formed
//! feature satisfies: at least two variations, and every variation reference
//! in the default strategy and the off-variation resolves to a known id.
//! Unknown fields are ignored; 64-bit integers may arrive as strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Variation Types
// ============================================================================

/// Payload type served by a feature's variations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariationType {
    /// String payloads.
    String,
    /// Boolean payloads.
    Boolean,
    /// Numeric payloads.
    Number,
    /// JSON document payloads.
    Json,
}

impl VariationType {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Boolean => "BOOLEAN",
            Self::Number => "NUMBER",
            Self::Json => "JSON",
        }
    }

    /// Returns all wire labels in canonical order.
    #[must_use]
    pub const fn labels() -> &'static [&'static str] {
        &["STRING", "BOOLEAN", "NUMBER", "JSON"]
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "STRING" => Some(Self::String),
            "BOOLEAN" => Some(Self::Boolean),
            "NUMBER" => Some(Self::Number),
            "JSON" => Some(Self::Json),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Feature Components
// ============================================================================

/// One possible value a feature can resolve to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Variation {
    /// Service-assigned identifier.
    pub id: String,
    /// Served payload.
    pub value: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

/// Variation reference for a fixed strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedStrategy {
    /// Referenced variation id.
    pub variation: String,
}

/// Weighted variation reference for a rollout strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutVariation {
    /// Referenced variation id.
    pub variation: String,
    /// Relative weight.
    #[serde(deserialize_with = "lenient_i64")]
    pub weight: i64,
}

/// Weighted rollout over several variations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutStrategy {
    /// Weighted references.
    pub variations: Vec<RolloutVariation>,
}

/// Serving rule: one fixed variation or a weighted rollout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Strategy {
    /// `FIXED` or `ROLLOUT`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Fixed strategy body.
    pub fixed_strategy: Option<FixedStrategy>,
    /// Rollout strategy body.
    pub rollout_strategy: Option<RolloutStrategy>,
}

impl Strategy {
    /// Returns every variation id the strategy references.
    #[must_use]
    pub fn referenced_variations(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        if let Some(fixed) = &self.fixed_strategy {
            refs.push(fixed.variation.as_str());
        }
        if let Some(rollout) = &self.rollout_strategy {
            refs.extend(rollout.variations.iter().map(|entry| entry.variation.as_str()));
        }
        refs
    }
}

/// Individual user targeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    /// Variation served to the listed users.
    pub variation: String,
    /// Targeted user ids.
    pub users: Vec<String>,
}

/// Rule predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clause {
    /// Clause id.
    pub id: String,
    /// User attribute inspected.
    pub attribute: String,
    /// Comparison operator.
    pub operator: String,
    /// Operand values.
    pub values: Vec<String>,
}

/// Targeting rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// Rule id.
    pub id: String,
    /// Strategy applied when all clauses match.
    pub strategy: Strategy,
    /// Predicates.
    pub clauses: Vec<Clause>,
}

// ============================================================================
// SECTION: Feature
// ============================================================================

/// Typed view of a feature flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Feature {
    /// Caller-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Whether targeting is on.
    pub enabled: bool,
    /// Whether the flag is archived.
    pub archived: bool,
    /// Whether the flag is deleted.
    pub deleted: bool,
    /// Ordered variations.
    pub variations: Vec<Variation>,
    /// Individual targets.
    pub targets: Vec<Target>,
    /// Targeting rules.
    pub rules: Vec<Rule>,
    /// Strategy used when no rule matches.
    pub default_strategy: Strategy,
    /// Variation served when the flag is off.
    pub off_variation: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Maintainer, when recorded.
    pub maintainer: Option<String>,
    /// Monotonic version.
    #[serde(deserialize_with = "lenient_i64")]
    pub version: i64,
    /// Creation timestamp (unix seconds).
    #[serde(deserialize_with = "lenient_i64")]
    pub created_at: i64,
    /// Update timestamp (unix seconds).
    #[serde(deserialize_with = "lenient_i64")]
    pub updated_at: i64,
    /// Variation payload type label.
    pub variation_type: Option<String>,
}

impl Feature {
    /// Parses the typed view from a raw feature document.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the document is not a feature object.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Returns every structural invariant the feature violates.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        if self.variations.len() < 2 {
            violations.push(format!(
                "feature has {} variations; at least 2 are required",
                self.variations.len()
            ));
        }
        let ids: BTreeSet<&str> = self.variations.iter().map(|v| v.id.as_str()).collect();
        for reference in self.default_strategy.referenced_variations() {
            if !ids.contains(reference) {
                violations.push(format!("default strategy references unknown variation {reference}"));
            }
        }
        if !ids.contains(self.off_variation.as_str()) {
            violations.push(format!("off variation references unknown variation {}", self.off_variation));
        }
        violations
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Accepts an integer encoded as a JSON number or a decimal string.
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("integer out of range")),
        Value::String(text) => text.parse::<i64>().map_err(serde::de::Error::custom),
        other => Err(serde::de::Error::custom(format!("expected integer, found {other}"))),
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions are permitted."
    )]

    use serde_json::json;

    use super::Feature;

    /// Returns a well-formed feature document.
    fn sample() -> serde_json::Value {
        json!({
            "id": "f1",
            "name": "F1",
            "enabled": true,
            "variations": [
                {"id": "v-a", "value": "a", "name": "A", "description": ""},
                {"id": "v-b", "value": "b", "name": "B", "description": ""}
            ],
            "defaultStrategy": {"type": "FIXED", "fixedStrategy": {"variation": "v-a"}},
            "offVariation": "v-b",
            "tags": ["web"],
            "version": "3",
            "createdAt": 1_700_000_000,
            "updatedAt": "1700000100",
            "samplingSeed": "ignored"
        })
    }

    #[test]
    fn parses_string_encoded_integers_and_ignores_unknown_fields() {
        let feature = Feature::from_value(&sample()).unwrap();
        assert_eq!(feature.version, 3);
        assert_eq!(feature.updated_at, 1_700_000_100);
        assert!(feature.invariant_violations().is_empty());
    }

    #[test]
    fn reports_dangling_references_and_short_variation_lists() {
        let mut doc = sample();
        doc["variations"] = json!([{"id": "v-a", "value": "a", "name": "A"}]);
        doc["defaultStrategy"] = json!({
            "type": "ROLLOUT",
            "rolloutStrategy": {"variations": [
                {"variation": "v-a", "weight": 50},
                {"variation": "v-z", "weight": 50}
            ]}
        });
        let violations = Feature::from_value(&doc).unwrap().invariant_violations();
        assert_eq!(violations.len(), 3);
        assert!(violations.iter().any(|v| v.contains("v-z")));
        assert!(violations.iter().any(|v| v.contains("off variation")));
    }
}
