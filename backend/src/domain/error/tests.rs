//! Tests for domain error construction and serialisation.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("login required"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("not a member"), ErrorCode::Forbidden)]
#[case(Error::not_found("group not found"), ErrorCode::NotFound)]
#[case(Error::service_unavailable("store down"), ErrorCode::ServiceUnavailable)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values() {
    let result = Error::invalid_request("bad").try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id.parse().expect("fixture is a UUID");
    let error = TraceId::scope(trace_id, async move { Error::forbidden("not a member") }).await;
    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
#[tokio::test]
async fn deserialised_errors_ignore_ambient_trace(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id.parse().expect("fixture is a UUID");
    let error = TraceId::scope(trace_id, async move {
        serde_json::from_value::<Error>(json!({ "code": "not_found", "message": "missing" }))
            .expect("valid payload")
    })
    .await;
    assert!(error.trace_id().is_none());
}

#[rstest]
fn serialises_camel_case_and_omits_empty_fields() {
    let value = serde_json::to_value(Error::forbidden("not a member")).expect("serialise");
    assert_eq!(value, json!({ "code": "forbidden", "message": "not a member" }));
}

#[rstest]
fn round_trips_details_and_trace(expected_trace_id: String) {
    let error = Error::invalid_request("bad")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "field": "username" }));
    let value = serde_json::to_value(&error).expect("serialise");
    assert_eq!(value.get("traceId").and_then(|v| v.as_str()), Some(TRACE_ID));

    let decoded: Error = serde_json::from_value(value).expect("deserialise");
    assert_eq!(decoded, error);
}

#[rstest]
fn rejects_blank_message_on_deserialise() {
    let result = serde_json::from_value::<Error>(json!({ "code": "not_found", "message": " " }));
    assert!(result.is_err());
}
