//! Common responses for the API shared by all the endpoints.
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Response status used when requests have only two possible results
/// `Ok` or `Error` and no data is returned.
#[derive(Serialize, Debug)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionStatus<'a> {
    Ok,
    Err { reason: std::borrow::Cow<'a, str> },
}

// OK responses

/// # Panics
///
/// Will panic if it can't convert the `ActionStatus` to json.
#[must_use]
pub fn ok_response() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&ActionStatus::Ok).unwrap(),
    )
        .into_response()
}

/// Like [`ok_response`] with a `201 Created` status, for successful
/// registrations.
///
/// # Panics
///
/// Will panic if it can't convert the `ActionStatus` to json.
#[must_use]
pub fn created_response() -> Response {
    (
        StatusCode::CREATED,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&ActionStatus::Ok).unwrap(),
    )
        .into_response()
}

// Error responses

/// # Panics
///
/// Will panic if it can't convert the `ActionStatus` to json.
#[must_use]
pub fn bad_request_response(reason: &str) -> Response {
    json_error_response(StatusCode::BAD_REQUEST, reason)
}

/// # Panics
///
/// Will panic if it can't convert the `ActionStatus` to json.
#[must_use]
pub fn forbidden_response(reason: &str) -> Response {
    json_error_response(StatusCode::FORBIDDEN, reason)
}

/// # Panics
///
/// Will panic if it can't convert the `ActionStatus` to json.
#[must_use]
pub fn internal_server_error_response(reason: &str) -> Response {
    json_error_response(StatusCode::INTERNAL_SERVER_ERROR, reason)
}

fn json_error_response(code: StatusCode, reason: &str) -> Response {
    (
        code,
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::to_string(&ActionStatus::Err {
            reason: reason.to_owned().into(),
        })
        .unwrap(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::ActionStatus;

    #[test]
    fn action_statuses_should_be_serialized_with_a_status_tag() {
        assert_eq!(serde_json::to_string(&ActionStatus::Ok).unwrap(), "{\"status\":\"ok\"}");

        assert_eq!(
            serde_json::to_string(&ActionStatus::Err {
                reason: "it went wrong".into()
            })
            .unwrap(),
            "{\"status\":\"err\",\"reason\":\"it went wrong\"}"
        );
    }
}
