// crates/bucketeer-mcp-core/src/patch.rs
// ============================================================================
// Module: Sparse Update Fields
// Description: Present-or-absent wrapper for partial update payloads.
// Purpose: Keep "not provided" distinct from every concrete value.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`Patch`] models a field in a partial update. `Absent` fields are omitted
//! from the serialized payload entirely; `Set` fields are always emitted,
//! including falsy values such as `false` or an empty list. Use it with
//! `#[serde(default, skip_serializing_if = "Patch::is_absent")]`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde::Serializer;

// ============================================================================
// SECTION: Patch
// ============================================================================

/// A field that is either left unchanged or set to a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field was not provided and must not be sent.
    #[default]
    Absent,
    /// Field was provided with a value.
    Set(T),
}

impl<T> Patch<T> {
    /// Returns true when the field was not provided.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Returns a reference to the value when set.
    #[must_use]
    pub const fn as_ref(&self) -> Option<&T> {
        match self {
            Self::Absent => None,
            Self::Set(value) => Some(value),
        }
    }

    /// Maps the contained value when set.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Self::Absent => Patch::Absent,
            Self::Set(value) => Patch::Set(f(value)),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Set)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(value) => value.serialize(serializer),
            Self::Absent => serializer.serialize_none(),
        }
    }
}
