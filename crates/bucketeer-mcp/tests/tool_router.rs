// crates/bucketeer-mcp/tests/tool_router.rs
// ============================================================================
// Module: Tool Router Tests
// Description: Dispatch tests against a recording service.
// Purpose: Validate end-to-end tool behavior without a network.
// Dependencies: bucketeer-mcp, bucketeer-mcp-client, bucketeer-mcp-core
// ============================================================================

//! ## Overview
//! Drives [`ToolRouter`] with a service double that records every outbound
//! payload and replays a canned response. Checks payload shaping, default
//! environment resolution, result envelopes, and error pass-through.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::Mutex;

use bucketeer_mcp::ToolError;
use bucketeer_mcp::ToolRouter;
use bucketeer_mcp_client::FeatureFlagService;
use bucketeer_mcp_client::FeatureResponse;
use bucketeer_mcp_client::ListFeaturesResponse;
use bucketeer_mcp_core::CreateFeaturePayload;
use bucketeer_mcp_core::EnvironmentResolver;
use bucketeer_mcp_core::ErrorKind;
use bucketeer_mcp_core::GetFeatureQuery;
use bucketeer_mcp_core::ListFeaturesQuery;
use bucketeer_mcp_core::OperationError;
use bucketeer_mcp_core::UpdateFeaturePayload;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Recording Service
// ============================================================================

/// Outbound call observed by the recording service.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    /// List query pairs.
    List(Vec<(&'static str, String)>),
    /// Create body.
    Create(Value),
    /// Get query pairs.
    Get(Vec<(&'static str, String)>),
    /// Update body.
    Update(Value),
}

/// Service double returning a fixed feature or a fixed error.
struct RecordingService {
    /// Calls in arrival order.
    calls: Mutex<Vec<Call>>,
    /// Error returned by every call, when set.
    failure: Option<OperationError>,
}

impl RecordingService {
    /// Creates a service that succeeds.
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failure: None,
        })
    }

    /// Creates a service that fails with `error`.
    fn failing(error: OperationError) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failure: Some(error),
        })
    }

    /// Returns the recorded calls.
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Records a call and returns the canned feature.
    fn answer(&self, call: Call) -> Result<FeatureResponse, OperationError> {
        self.calls.lock().unwrap().push(call);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(FeatureResponse {
                feature: json!({"id": "f1", "name": "F1", "version": "3", "samplingSeed": "abc"}),
            }),
        }
    }
}

impl FeatureFlagService for RecordingService {
    fn list_features(
        &self,
        query: &ListFeaturesQuery,
    ) -> Result<ListFeaturesResponse, OperationError> {
        self.answer(Call::List(query.query_pairs()))?;
        Ok(ListFeaturesResponse {
            features: vec![json!({"id": "a"}), json!({"id": "b"})],
            cursor: Some("c2".to_string()),
            total_count: Some(json!("2")),
        })
    }

    fn create_feature(
        &self,
        payload: &CreateFeaturePayload,
    ) -> Result<FeatureResponse, OperationError> {
        self.answer(Call::Create(serde_json::to_value(payload).unwrap()))
    }

    fn get_feature(&self, query: &GetFeatureQuery) -> Result<FeatureResponse, OperationError> {
        self.answer(Call::Get(query.query_pairs()))
    }

    fn update_feature(
        &self,
        payload: &UpdateFeaturePayload,
    ) -> Result<FeatureResponse, OperationError> {
        self.answer(Call::Update(serde_json::to_value(payload).unwrap()))
    }
}

/// Builds a router with `default-env` as the default environment.
fn router(service: &Arc<RecordingService>) -> ToolRouter {
    ToolRouter::new(service.clone(), EnvironmentResolver::new(Some("default-env".to_string())))
}

/// Calls a tool and returns `(is_error, payload)`.
fn call(router: &ToolRouter, name: &str, arguments: &Value) -> (bool, Value) {
    let result = router.handle_tool_call(name, arguments).unwrap();
    (result.is_error, result.payload().unwrap())
}

// ============================================================================
// SECTION: Success Paths
// ============================================================================

#[test]
fn create_sends_minimal_payload_with_default_environment() {
    let service = RecordingService::succeeding();
    let (is_error, payload) = call(
        &router(&service),
        "createFeatureFlag",
        &json!({
            "id": "new-checkout",
            "name": "New checkout",
            "variations": [
                {"value": "true", "name": "On"},
                {"value": "false", "name": "Off"}
            ],
            "defaultOnVariationIndex": 0,
            "defaultOffVariationIndex": 1
        }),
    );

    assert!(!is_error);
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["feature"]["samplingSeed"], json!("abc"));
    let calls = service.calls();
    let [Call::Create(body)] = calls.as_slice() else {
        panic!("expected one create call, got {calls:?}");
    };
    assert_eq!(body["environmentId"], json!("default-env"));
    assert_eq!(body["onVariationIndex"], json!(0));
    assert_eq!(body["offVariationIndex"], json!(1));
    assert!(body.get("description").is_none());
    assert!(body.get("tags").is_none());
    assert!(body.get("variationType").is_none());
    assert_eq!(body["variations"].as_array().unwrap().len(), 2);
}

#[test]
fn list_returns_page_and_forwards_filters() {
    let service = RecordingService::succeeding();
    let (is_error, payload) = call(
        &router(&service),
        "listFeatureFlags",
        &json!({"environmentId": "prod", "orderBy": "NAME", "archived": false}),
    );

    assert!(!is_error);
    assert_eq!(payload["features"], json!([{"id": "a"}, {"id": "b"}]));
    assert_eq!(payload["cursor"], json!("c2"));
    assert_eq!(payload["totalCount"], json!("2"));
    assert_eq!(
        service.calls(),
        vec![Call::List(vec![
            ("environmentId", "prod".to_string()),
            ("pageSize", "20".to_string()),
            ("orderBy", "NAME".to_string()),
            ("archived", "false".to_string()),
        ])]
    );
}

#[test]
fn get_forwards_version() {
    let service = RecordingService::succeeding();
    let (is_error, payload) =
        call(&router(&service), "getFeatureFlag", &json!({"id": "f1", "featureVersion": 2}));

    assert!(!is_error);
    assert_eq!(payload["feature"]["id"], json!("f1"));
    assert_eq!(
        service.calls(),
        vec![Call::Get(vec![
            ("id", "f1".to_string()),
            ("environmentId", "default-env".to_string()),
            ("featureVersion", "2".to_string()),
        ])]
    );
}

#[test]
fn update_sends_only_supplied_fields_and_echoes_them() {
    let service = RecordingService::succeeding();
    let (is_error, payload) = call(
        &router(&service),
        "updateFeatureFlag",
        &json!({"id": "f1", "comment": "turn on", "enabled": true}),
    );

    assert!(!is_error);
    assert_eq!(payload["updated"], json!({"enabled": true}));
    assert_eq!(
        service.calls(),
        vec![Call::Update(json!({
            "id": "f1",
            "environmentId": "default-env",
            "comment": "turn on",
            "enabled": true
        }))]
    );
}

#[test]
fn archive_forces_archived_and_reports_message() {
    let service = RecordingService::succeeding();
    let (is_error, payload) = call(
        &router(&service),
        "archiveFeatureFlag",
        &json!({"id": "f1", "comment": "retire", "archived": false}),
    );

    assert!(!is_error);
    assert_eq!(payload["message"], json!("Feature flag 'f1' has been archived"));
    assert_eq!(payload["archivedId"], json!("f1"));
    assert_eq!(
        service.calls(),
        vec![Call::Update(json!({
            "id": "f1",
            "environmentId": "default-env",
            "comment": "retire",
            "archived": true
        }))]
    );
}

// ============================================================================
// SECTION: Failure Paths
// ============================================================================

#[test]
fn unknown_tool_is_a_routing_error() {
    let service = RecordingService::succeeding();
    let err = router(&service).handle_tool_call("deleteFeatureFlag", &json!({})).unwrap_err();

    assert!(matches!(err, ToolError::UnknownTool(ref name) if name == "deleteFeatureFlag"));
    assert!(service.calls().is_empty());
}

#[test]
fn missing_environment_fails_before_transport() {
    let service = RecordingService::succeeding();
    let router = ToolRouter::new(service.clone(), EnvironmentResolver::new(None));
    let (is_error, payload) = call(&router, "getFeatureFlag", &json!({"id": "f1"}));

    assert!(is_error);
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["kind"], json!("invalid_argument"));
    assert_eq!(
        payload["error"],
        json!("environmentId must be provided or set in BUCKETEER_ENVIRONMENT_ID")
    );
    assert!(service.calls().is_empty());
}

#[test]
fn validation_failure_carries_violations() {
    let service = RecordingService::succeeding();
    let (is_error, payload) = call(
        &router(&service),
        "createFeatureFlag",
        &json!({
            "id": "x",
            "name": "X",
            "variations": [{"value": "a", "name": "A"}, {"value": "b", "name": "B"}],
            "defaultOnVariationIndex": 2,
            "defaultOffVariationIndex": 0
        }),
    );

    assert!(is_error);
    assert_eq!(payload["kind"], json!("invalid_argument"));
    assert_eq!(
        payload["error"],
        json!("defaultOnVariationIndex 2 is out of bounds. Must be less than 2")
    );
    assert!(payload["details"].is_array());
    assert!(service.calls().is_empty());
}

#[test]
fn empty_update_is_rejected_locally() {
    let service = RecordingService::succeeding();
    let (is_error, payload) =
        call(&router(&service), "updateFeatureFlag", &json!({"id": "f1", "comment": "noop"}));

    assert!(is_error);
    assert_eq!(payload["kind"], json!("invalid_argument"));
    assert!(service.calls().is_empty());
}

#[test]
fn service_errors_pass_through_unchanged() {
    let service = RecordingService::failing(OperationError::new(
        ErrorKind::NotFound,
        "Not found: feature f1 not found",
    ));
    let (is_error, payload) = call(&router(&service), "getFeatureFlag", &json!({"id": "f1"}));

    assert!(is_error);
    assert_eq!(payload["kind"], json!("not_found"));
    assert_eq!(payload["error"], json!("Not found: feature f1 not found"));
    assert!(payload.get("details").is_none());
    assert_eq!(service.calls().len(), 1);
}

#[test]
fn list_tools_advertises_five_tools() {
    let service = RecordingService::succeeding();
    let names: Vec<String> =
        router(&service).list_tools().iter().map(|tool| tool.name.to_string()).collect();

    assert_eq!(
        names,
        vec![
            "listFeatureFlags",
            "createFeatureFlag",
            "getFeatureFlag",
            "updateFeatureFlag",
            "archiveFeatureFlag"
        ]
    );
}
