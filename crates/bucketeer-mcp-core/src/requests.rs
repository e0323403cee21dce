// crates/bucketeer-mcp-core/src/requests.rs
// ============================================================================
// Module: Request Builders
// Description: Validation of tool arguments and construction of wire payloads.
// Purpose: Turn untrusted argument bundles into exact service request shapes.
// Dependencies: crate::{error, feature, patch}, serde, serde_json
// ============================================================================

//! ## Overview
//! Each operation has a request type built from raw tool arguments by
//! `from_arguments`. Validation is two-phase:
//!
//! 1. Schema phase: every field is type-checked and every violation is
//!    collected into a single `invalid_argument` error whose `details` list
//!    the offending field paths.
//! 2. Semantic phase: rules that span fields (variation index bounds, the
//!    non-empty update rule) run only once the schema phase passes.
//!
//! Validated requests are combined with a resolved environment to produce
//! the wire payloads sent to the service. Payloads never contain fields the
//! caller did not supply. Unknown argument keys are ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::FieldViolation;
use crate::error::OperationError;
use crate::feature::VariationType;
use crate::patch::Patch;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default page size for list requests.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Minimum accepted page size.
pub const MIN_PAGE_SIZE: u32 = 1;
/// Maximum accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Minimum number of variations a new feature must declare.
pub const MIN_VARIATIONS: usize = 2;

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Missing or empty feature id.
const ID_REQUIRED: &str = "Feature flag ID is required";
/// Feature id contains characters outside the allowed set.
const ID_CHARSET: &str = "ID must contain only alphanumeric characters, hyphens, and underscores";
/// Missing or empty feature name.
const NAME_REQUIRED: &str = "Feature flag name is required";
/// Fewer than the minimum number of variations.
const VARIATIONS_MIN: &str = "At least 2 variations are required";
/// Missing or empty variation value.
const VARIATION_VALUE_REQUIRED: &str = "Variation value is required";
/// Missing or empty variation name.
const VARIATION_NAME_REQUIRED: &str = "Variation name is required";
/// Missing or empty update comment.
const UPDATE_COMMENT_REQUIRED: &str = "Comment is required for all updates";
/// Missing or empty archive comment.
const ARCHIVE_COMMENT_REQUIRED: &str = "Comment is required for archiving";
/// Update with no change fields.
const UPDATE_EMPTY: &str = "At least one field to update must be provided";

// ============================================================================
// SECTION: Argument Reader
// ============================================================================

/// Field-by-field reader over a JSON argument object.
///
/// Each accessor records a [`FieldViolation`] on failure and returns `None`,
/// so a builder can read every field and report all problems at once.
#[derive(Debug)]
pub struct ArgumentReader<'a> {
    /// Object being read.
    object: &'a Map<String, Value>,
    /// Dotted path prefix applied to field names.
    prefix: String,
    /// Violations collected so far.
    violations: Vec<FieldViolation>,
}

impl<'a> ArgumentReader<'a> {
    /// Creates a reader rooted at `prefix`.
    #[must_use]
    pub fn new(object: &'a Map<String, Value>, prefix: impl Into<String>) -> Self {
        Self {
            object,
            prefix: prefix.into(),
            violations: Vec::new(),
        }
    }

    /// Runs `parse` over `arguments` and converts collected violations into
    /// an error. `null` arguments read as an empty object.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_argument` [`OperationError`] when `arguments` is
    /// not an object or any field violates its constraints.
    pub fn parse<T>(
        arguments: &Value,
        parse: impl FnOnce(&mut ArgumentReader<'_>) -> Option<T>,
    ) -> Result<T, OperationError> {
        let empty = Map::new();
        let object = match arguments {
            Value::Object(object) => object,
            Value::Null => &empty,
            other => {
                return Err(OperationError::validation(vec![FieldViolation::new(
                    "arguments",
                    format!("Expected object, received {}", type_label(other)),
                )]));
            }
        };
        let mut reader = ArgumentReader::new(object, "");
        let parsed = parse(&mut reader);
        match parsed {
            Some(value) if reader.violations.is_empty() => Ok(value),
            _ => Err(OperationError::validation(reader.violations)),
        }
    }

    /// Returns the raw value for `key`.
    fn field(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key)
    }

    /// Returns the dotted path for a key under this reader.
    fn path(&self, key: &str) -> String {
        if self.prefix.is_empty() { key.to_string() } else { format!("{}.{key}", self.prefix) }
    }

    /// Records a violation for `key`.
    fn violate(&mut self, key: &str, message: impl Into<String>) {
        let field = self.path(key);
        self.violations.push(FieldViolation::new(field, message));
    }

    /// Records a type mismatch for `key`.
    fn mismatch(&mut self, key: &str, expected: &str, found: &Value) {
        self.violate(key, format!("Expected {expected}, received {}", type_label(found)));
    }

    /// Reads a required non-empty string; `message` covers missing and empty.
    pub fn required_string(&mut self, key: &str, message: &str) -> Option<String> {
        match self.field(key) {
            None => {
                self.violate(key, message);
                None
            }
            Some(Value::String(text)) if text.is_empty() => {
                self.violate(key, message);
                None
            }
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => {
                self.mismatch(key, "string", other);
                None
            }
        }
    }

    /// Reads an optional string. The outer `Option` is `None` on violation.
    pub fn optional_string(&mut self, key: &str) -> Option<Option<String>> {
        match self.field(key) {
            None => Some(None),
            Some(Value::String(text)) => Some(Some(text.clone())),
            Some(other) => {
                self.mismatch(key, "string", other);
                None
            }
        }
    }

    /// Reads an optional boolean. The outer `Option` is `None` on violation.
    pub fn optional_bool(&mut self, key: &str) -> Option<Option<bool>> {
        match self.field(key) {
            None => Some(None),
            Some(Value::Bool(flag)) => Some(Some(*flag)),
            Some(other) => {
                self.mismatch(key, "boolean", other);
                None
            }
        }
    }

    /// Reads an optional array of strings.
    pub fn optional_string_list(&mut self, key: &str) -> Option<Option<Vec<String>>> {
        let items = match self.field(key) {
            None => return Some(None),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.mismatch(key, "array", other);
                return None;
            }
        };
        let mut values = Vec::with_capacity(items.len());
        let mut valid = true;
        for (index, item) in items.iter().enumerate() {
            if let Value::String(text) = item {
                values.push(text.clone());
            } else {
                self.mismatch(&format!("{key}.{index}"), "string", item);
                valid = false;
            }
        }
        valid.then_some(Some(values))
    }

    /// Reads an optional non-negative integer within `min..=max`.
    pub fn optional_integer(&mut self, key: &str, min: u64, max: u64) -> Option<Option<u64>> {
        let Some(value) = self.field(key) else {
            return Some(None);
        };
        let Some(number) = value.as_u64().or_else(|| integral_float(value)) else {
            if value.as_f64().is_some_and(|n| n < 0.0 && n.fract() == 0.0) {
                self.violate(key, format!("Number must be greater than or equal to {min}"));
            } else {
                self.mismatch(key, "integer", value);
            }
            return None;
        };
        if number < min {
            self.violate(key, format!("Number must be greater than or equal to {min}"));
            return None;
        }
        if number > max {
            self.violate(key, format!("Number must be less than or equal to {max}"));
            return None;
        }
        Some(Some(number))
    }

    /// Reads a required non-negative integer.
    pub fn required_index(&mut self, key: &str) -> Option<u64> {
        if self.object.contains_key(key) {
            self.optional_integer(key, 0, u64::MAX).flatten()
        } else {
            self.violate(key, "Required");
            None
        }
    }

    /// Reads an optional string restricted to `allowed` labels.
    pub fn optional_enum(&mut self, key: &str, allowed: &[&str]) -> Option<Option<String>> {
        let value = self.optional_string(key)?;
        match value {
            Some(label) if !allowed.contains(&label.as_str()) => {
                self.violate(
                    key,
                    format!("Invalid enum value. Expected {}, received '{label}'", allowed.join(" | ")),
                );
                None
            }
            other => Some(other),
        }
    }

    /// Reads a required array of objects, applying `parse` to each element.
    pub fn required_objects<T>(
        &mut self,
        key: &str,
        mut parse: impl FnMut(&mut ArgumentReader<'_>) -> Option<T>,
    ) -> Option<Vec<T>> {
        let items = match self.field(key) {
            None => {
                self.violate(key, "Required");
                return None;
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.mismatch(key, "array", other);
                return None;
            }
        };
        let mut parsed = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let child_key = format!("{key}.{index}");
            let Value::Object(object) = item else {
                self.mismatch(&child_key, "object", item);
                continue;
            };
            let mut child = ArgumentReader::new(object, self.path(&child_key));
            if let Some(value) = parse(&mut child) {
                parsed.push(value);
            }
            self.violations.append(&mut child.violations);
        }
        (parsed.len() == items.len()).then_some(parsed)
    }

    /// Records a violation against a field that was read successfully.
    pub fn reject(&mut self, key: &str, message: impl Into<String>) {
        self.violate(key, message);
    }
}

/// Reads a non-negative float with no fractional part, such as `20.0`.
fn integral_float(value: &Value) -> Option<u64> {
    value
        .as_f64()
        .filter(|float| *float >= 0.0 && float.fract() == 0.0 && *float < 1.8e19)
        .and_then(|float| format!("{float:.0}").parse().ok())
}

/// Returns the JSON type label used in mismatch messages.
const fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns true when `id` uses only ASCII alphanumerics, hyphens, and underscores.
fn is_valid_feature_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Reads the shared `id` field, enforcing the charset when `strict`.
fn read_feature_id(reader: &mut ArgumentReader<'_>, strict: bool) -> Option<String> {
    let id = reader.required_string("id", ID_REQUIRED)?;
    if strict && !is_valid_feature_id(&id) {
        reader.reject("id", ID_CHARSET);
        return None;
    }
    Some(id)
}

/// Reads the shared optional `environmentId`; empty strings read as absent.
fn read_environment(reader: &mut ArgumentReader<'_>) -> Option<Option<String>> {
    reader.optional_string("environmentId").map(|value| value.filter(|env| !env.is_empty()))
}

// ============================================================================
// SECTION: List
// ============================================================================

/// Sort field for list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// Creation time.
    CreatedAt,
    /// Last update time.
    UpdatedAt,
    /// Name.
    Name,
}

impl OrderBy {
    /// Wire labels in canonical order.
    pub const LABELS: [&'static str; 3] = ["CREATED_AT", "UPDATED_AT", "NAME"];

    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "CREATED_AT",
            Self::UpdatedAt => "UPDATED_AT",
            Self::Name => "NAME",
        }
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "CREATED_AT" => Some(Self::CreatedAt),
            "UPDATED_AT" => Some(Self::UpdatedAt),
            "NAME" => Some(Self::Name),
            _ => None,
        }
    }
}

/// Sort direction for list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl OrderDirection {
    /// Wire labels in canonical order.
    pub const LABELS: [&'static str; 2] = ["ASC", "DESC"];

    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parses a wire label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Optional list predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Required tags; empty means no tag filter.
    pub tags: Vec<String>,
    /// Free-text search keyword.
    pub search_keyword: Option<String>,
    /// Maintainer filter.
    pub maintainer: Option<String>,
    /// Archived filter.
    pub archived: Option<bool>,
    /// Experiment filter.
    pub has_experiment: Option<bool>,
}

/// Validated `listFeatureFlags` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFlagsRequest {
    /// Explicit environment, if supplied.
    pub environment_id: Option<String>,
    /// Page size within `1..=100`.
    pub page_size: u32,
    /// Opaque pagination cursor.
    pub cursor: Option<String>,
    /// Sort field.
    pub order_by: Option<OrderBy>,
    /// Sort direction.
    pub order_direction: Option<OrderDirection>,
    /// Predicates.
    pub filter: ListFilter,
}

impl ListFlagsRequest {
    /// Validates raw list arguments.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_argument` [`OperationError`] listing every
    /// violation.
    pub fn from_arguments(arguments: &Value) -> Result<Self, OperationError> {
        ArgumentReader::parse(arguments, |reader| {
            let environment_id = read_environment(reader);
            let page_size = reader.optional_integer(
                "pageSize",
                u64::from(MIN_PAGE_SIZE),
                u64::from(MAX_PAGE_SIZE),
            );
            let cursor = reader.optional_string("cursor");
            let tags = reader.optional_string_list("tags");
            let order_by = reader.optional_enum("orderBy", &OrderBy::LABELS);
            let order_direction = reader.optional_enum("orderDirection", &OrderDirection::LABELS);
            let search_keyword = reader.optional_string("searchKeyword");
            let maintainer = reader.optional_string("maintainer");
            let archived = reader.optional_bool("archived");
            let has_experiment = reader.optional_bool("hasExperiment");
            let page_size = match page_size? {
                Some(size) => u32::try_from(size).ok()?,
                None => DEFAULT_PAGE_SIZE,
            };
            Some(Self {
                environment_id: environment_id?,
                page_size,
                cursor: cursor?,
                order_by: order_by?.as_deref().and_then(OrderBy::parse),
                order_direction: order_direction?.as_deref().and_then(OrderDirection::parse),
                filter: ListFilter {
                    tags: tags?.unwrap_or_default(),
                    search_keyword: search_keyword?,
                    maintainer: maintainer?,
                    archived: archived?,
                    has_experiment: has_experiment?,
                },
            })
        })
    }

    /// Builds the outbound query for the resolved environment.
    #[must_use]
    pub fn into_query(self, environment_id: String) -> ListFeaturesQuery {
        ListFeaturesQuery {
            environment_id,
            page_size: self.page_size,
            cursor: self.cursor,
            order_by: self.order_by,
            order_direction: self.order_direction,
            filter: self.filter,
        }
    }
}

/// Outbound `GET /v1/features` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFeaturesQuery {
    /// Resolved environment.
    pub environment_id: String,
    /// Page size.
    pub page_size: u32,
    /// Pagination cursor.
    pub cursor: Option<String>,
    /// Sort field.
    pub order_by: Option<OrderBy>,
    /// Sort direction.
    pub order_direction: Option<OrderDirection>,
    /// Predicates.
    pub filter: ListFilter,
}

impl ListFeaturesQuery {
    /// Returns query parameters in wire order; tags repeat per value.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("environmentId", self.environment_id.clone()),
            ("pageSize", self.page_size.to_string()),
        ];
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor", cursor.clone()));
        }
        pairs.extend(self.filter.tags.iter().map(|tag| ("tags", tag.clone())));
        if let Some(order_by) = self.order_by {
            pairs.push(("orderBy", order_by.as_str().to_string()));
        }
        if let Some(direction) = self.order_direction {
            pairs.push(("orderDirection", direction.as_str().to_string()));
        }
        if let Some(keyword) = &self.filter.search_keyword {
            pairs.push(("searchKeyword", keyword.clone()));
        }
        if let Some(maintainer) = &self.filter.maintainer {
            pairs.push(("maintainer", maintainer.clone()));
        }
        if let Some(has_experiment) = self.filter.has_experiment {
            pairs.push(("hasExperiment", has_experiment.to_string()));
        }
        if let Some(archived) = self.filter.archived {
            pairs.push(("archived", archived.to_string()));
        }
        pairs
    }
}

// ============================================================================
// SECTION: Create
// ============================================================================

/// Caller-supplied variation for a new feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVariation {
    /// Served payload.
    pub value: String,
    /// Display name.
    pub name: String,
    /// Description; empty when not supplied.
    pub description: String,
}

/// Validated `createFeatureFlag` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFlagRequest {
    /// Caller-assigned id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description, when supplied.
    pub description: Option<String>,
    /// At least two variations.
    pub variations: Vec<NewVariation>,
    /// Tags, when supplied.
    pub tags: Option<Vec<String>>,
    /// Variation served when the flag is on.
    pub default_on_variation_index: usize,
    /// Variation served when the flag is off.
    pub default_off_variation_index: usize,
    /// Variation payload type, when supplied.
    pub variation_type: Option<VariationType>,
    /// Explicit environment, if supplied.
    pub environment_id: Option<String>,
}

impl CreateFlagRequest {
    /// Validates raw create arguments.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_argument` [`OperationError`] listing every schema
    /// violation, or naming each variation index that is out of bounds.
    pub fn from_arguments(arguments: &Value) -> Result<Self, OperationError> {
        let request = ArgumentReader::parse(arguments, |reader| {
            let id = read_feature_id(reader, true);
            let name = reader.required_string("name", NAME_REQUIRED);
            let description = reader.optional_string("description");
            let variations = reader.required_objects("variations", |variation| {
                let value = variation.required_string("value", VARIATION_VALUE_REQUIRED);
                let name = variation.required_string("name", VARIATION_NAME_REQUIRED);
                let description = variation.optional_string("description");
                Some(NewVariation {
                    value: value?,
                    name: name?,
                    description: description?.unwrap_or_default(),
                })
            });
            if variations.as_ref().is_some_and(|list| list.len() < MIN_VARIATIONS) {
                reader.reject("variations", VARIATIONS_MIN);
            }
            let tags = reader.optional_string_list("tags");
            let on_index = reader.required_index("defaultOnVariationIndex");
            let off_index = reader.required_index("defaultOffVariationIndex");
            let variation_type = reader.optional_enum("variationType", VariationType::labels());
            let environment_id = read_environment(reader);
            Some(Self {
                id: id?,
                name: name?,
                description: description?,
                variations: variations?,
                tags: tags?,
                default_on_variation_index: usize::try_from(on_index?).unwrap_or(usize::MAX),
                default_off_variation_index: usize::try_from(off_index?).unwrap_or(usize::MAX),
                variation_type: variation_type?.as_deref().and_then(VariationType::parse),
                environment_id: environment_id?,
            })
        })?;
        request.check_variation_indices()?;
        Ok(request)
    }

    /// Checks both default indices against the variation count.
    fn check_variation_indices(&self) -> Result<(), OperationError> {
        let bound = self.variations.len();
        let violations: Vec<FieldViolation> = [
            ("defaultOnVariationIndex", self.default_on_variation_index),
            ("defaultOffVariationIndex", self.default_off_variation_index),
        ]
        .into_iter()
        .filter(|(_, index)| *index >= bound)
        .map(|(field, index)| {
            FieldViolation::new(
                field,
                format!("{field} {index} is out of bounds. Must be less than {bound}"),
            )
        })
        .collect();
        if violations.is_empty() {
            return Ok(());
        }
        let message =
            violations.iter().map(|violation| violation.message.as_str()).collect::<Vec<_>>().join("; ");
        let details = serde_json::to_value(&violations).unwrap_or(Value::Null);
        Err(OperationError::invalid_argument(message).with_details(details))
    }

    /// Builds the outbound payload for the resolved environment.
    #[must_use]
    pub fn into_payload(self, environment_id: String) -> CreateFeaturePayload {
        CreateFeaturePayload {
            id: self.id,
            name: self.name,
            description: self.description,
            variations: self.variations,
            tags: self.tags,
            on_variation_index: self.default_on_variation_index,
            off_variation_index: self.default_off_variation_index,
            variation_type: self.variation_type,
            environment_id,
        }
    }
}

/// Outbound `POST /v1/feature` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeaturePayload {
    /// Caller-assigned id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Variations without ids.
    pub variations: Vec<NewVariation>,
    /// Tags, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Index of the on variation.
    pub on_variation_index: usize,
    /// Index of the off variation.
    pub off_variation_index: usize,
    /// Variation type, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_type: Option<VariationType>,
    /// Resolved environment.
    pub environment_id: String,
}

// ============================================================================
// SECTION: Get
// ============================================================================

/// Validated `getFeatureFlag` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFlagRequest {
    /// Feature id.
    pub id: String,
    /// Historical version to fetch.
    pub feature_version: Option<u64>,
    /// Explicit environment, if supplied.
    pub environment_id: Option<String>,
}

impl GetFlagRequest {
    /// Validates raw get arguments.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_argument` [`OperationError`] listing every
    /// violation.
    pub fn from_arguments(arguments: &Value) -> Result<Self, OperationError> {
        ArgumentReader::parse(arguments, |reader| {
            let id = read_feature_id(reader, false);
            let feature_version = reader.optional_integer("featureVersion", 0, u64::MAX);
            let environment_id = read_environment(reader);
            Some(Self {
                id: id?,
                feature_version: feature_version?,
                environment_id: environment_id?,
            })
        })
    }

    /// Builds the outbound query for the resolved environment.
    #[must_use]
    pub fn into_query(self, environment_id: String) -> GetFeatureQuery {
        GetFeatureQuery {
            id: self.id,
            environment_id,
            feature_version: self.feature_version,
        }
    }
}

/// Outbound `GET /v1/feature` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetFeatureQuery {
    /// Feature id.
    pub id: String,
    /// Resolved environment.
    pub environment_id: String,
    /// Historical version to fetch.
    pub feature_version: Option<u64>,
}

impl GetFeatureQuery {
    /// Returns query parameters in wire order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs =
            vec![("id", self.id.clone()), ("environmentId", self.environment_id.clone())];
        if let Some(version) = self.feature_version {
            pairs.push(("featureVersion", version.to_string()));
        }
        pairs
    }
}

// ============================================================================
// SECTION: Update
// ============================================================================

/// Sparse set of feature fields to change.
///
/// Serializes with absent fields omitted; this is also the `updated` echo
/// returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureChanges {
    /// New name.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub name: Patch<String>,
    /// New description.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<String>,
    /// Replacement tag set.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub tags: Patch<Vec<String>>,
    /// New enabled state.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub enabled: Patch<bool>,
    /// New archived state.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub archived: Patch<bool>,
}

impl FeatureChanges {
    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_absent()
            && self.description.is_absent()
            && self.tags.is_absent()
            && self.enabled.is_absent()
            && self.archived.is_absent()
    }
}

/// Validated `updateFeatureFlag` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFlagRequest {
    /// Feature id.
    pub id: String,
    /// Audit comment.
    pub comment: String,
    /// Fields to change; never empty.
    pub changes: FeatureChanges,
    /// Explicit environment, if supplied.
    pub environment_id: Option<String>,
}

impl UpdateFlagRequest {
    /// Validates raw update arguments.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_argument` [`OperationError`] listing every
    /// violation, including an update that changes nothing.
    pub fn from_arguments(arguments: &Value) -> Result<Self, OperationError> {
        let request = ArgumentReader::parse(arguments, |reader| {
            let id = read_feature_id(reader, false);
            let comment = reader.required_string("comment", UPDATE_COMMENT_REQUIRED);
            let environment_id = read_environment(reader);
            let name = reader.optional_string("name");
            let description = reader.optional_string("description");
            let tags = reader.optional_string_list("tags");
            let enabled = reader.optional_bool("enabled");
            let archived = reader.optional_bool("archived");
            Some(Self {
                id: id?,
                comment: comment?,
                changes: FeatureChanges {
                    name: name?.into(),
                    description: description?.into(),
                    tags: tags?.into(),
                    enabled: enabled?.into(),
                    archived: archived?.into(),
                },
                environment_id: environment_id?,
            })
        })?;
        if request.changes.is_empty() {
            return Err(OperationError::validation(vec![FieldViolation::new("arguments", UPDATE_EMPTY)]));
        }
        Ok(request)
    }

    /// Builds the outbound payload for the resolved environment.
    #[must_use]
    pub fn into_payload(self, environment_id: String) -> UpdateFeaturePayload {
        UpdateFeaturePayload::new(self.id, environment_id, self.comment, self.changes)
    }
}

/// Validated `archiveFeatureFlag` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFlagRequest {
    /// Feature id.
    pub id: String,
    /// Audit comment.
    pub comment: String,
    /// Explicit environment, if supplied.
    pub environment_id: Option<String>,
}

impl ArchiveFlagRequest {
    /// Validates raw archive arguments. Any `archived` argument is ignored.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_argument` [`OperationError`] listing every
    /// violation.
    pub fn from_arguments(arguments: &Value) -> Result<Self, OperationError> {
        ArgumentReader::parse(arguments, |reader| {
            let id = read_feature_id(reader, false);
            let comment = reader.required_string("comment", ARCHIVE_COMMENT_REQUIRED);
            let environment_id = read_environment(reader);
            Some(Self {
                id: id?,
                comment: comment?,
                environment_id: environment_id?,
            })
        })
    }

    /// Builds the outbound update payload with `archived` forced to true.
    #[must_use]
    pub fn into_payload(self, environment_id: String) -> UpdateFeaturePayload {
        let changes = FeatureChanges {
            archived: Patch::Set(true),
            ..FeatureChanges::default()
        };
        UpdateFeaturePayload::new(self.id, environment_id, self.comment, changes)
    }
}

/// Named list container used by update-only list fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringListValue {
    /// Contained values.
    pub values: Vec<String>,
}

/// Outbound `PATCH /v1/feature` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeaturePayload {
    /// Feature id.
    pub id: String,
    /// Resolved environment.
    pub environment_id: String,
    /// Audit comment.
    pub comment: String,
    /// New name.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub name: Patch<String>,
    /// New description.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<String>,
    /// Replacement tags.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub tags: Patch<StringListValue>,
    /// New enabled state.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub enabled: Patch<bool>,
    /// New archived state.
    #[serde(skip_serializing_if = "Patch::is_absent")]
    pub archived: Patch<bool>,
}

impl UpdateFeaturePayload {
    /// Assembles a payload from identity fields and a change set.
    fn new(id: String, environment_id: String, comment: String, changes: FeatureChanges) -> Self {
        Self {
            id,
            environment_id,
            comment,
            name: changes.name,
            description: changes.description,
            tags: changes.tags.map(|values| StringListValue { values }),
            enabled: changes.enabled,
            archived: changes.archived,
        }
    }
}
