//! HTTP response building helpers
//!
//! Provides a consistent API for building HTTP responses across all handlers.
//! Reduces boilerplate and ensures consistent error formatting.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Response, StatusCode};
use serde::Serialize;

use crate::error::MatchError;

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// Build a JSON response with 200 OK status
pub fn ok<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, body)
}

/// Build a JSON response with 201 Created status
pub fn created<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::CREATED, body)
}

/// Build an empty response with 204 No Content status
pub fn no_content() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Build a 404 Not Found response with message
pub fn not_found(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": message, "code": "NOT_FOUND" }),
    )
}

/// Build a 400 Bad Request response with message
pub fn bad_request(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::BAD_REQUEST,
        &serde_json::json!({ "error": message, "code": "INVALID_INPUT" }),
    )
}

/// Build a 405 Method Not Allowed response
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({ "error": "Method not allowed", "code": "METHOD_NOT_ALLOWED" }),
    )
}

/// Convert a MatchError to an appropriate HTTP response
pub fn error_response(error: MatchError) -> Response<Full<Bytes>> {
    let status = match &error {
        MatchError::NotFound(_) => StatusCode::NOT_FOUND,
        MatchError::Forbidden(_) | MatchError::OwnerCannotLeave => StatusCode::FORBIDDEN,
        e if e.is_conflict() => StatusCode::CONFLICT,
        MatchError::NotAMember => StatusCode::CONFLICT,
        MatchError::InvalidRole(_)
        | MatchError::SelfReference
        | MatchError::InvalidInput(_)
        | MatchError::Json(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    json_response(
        status,
        &serde_json::json!({ "error": error.to_string(), "code": error.code() }),
    )
}

/// Wrap a service result into an HTTP response
pub fn from_result<T: Serialize>(result: Result<T, MatchError>) -> Response<Full<Bytes>> {
    match result {
        Ok(value) => ok(&value),
        Err(e) => error_response(e),
    }
}

/// Wrap a create result into an HTTP response with 201 Created
pub fn from_create_result<T: Serialize>(result: Result<T, MatchError>) -> Response<Full<Bytes>> {
    match result {
        Ok(value) => created(&value),
        Err(e) => error_response(e),
    }
}

/// Wrap a delete result into an HTTP response with 204 No Content
pub fn from_delete_result(result: Result<(), MatchError>) -> Response<Full<Bytes>> {
    match result {
        Ok(()) => no_content(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response() {
        let resp = ok(&serde_json::json!({"test": true}));
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_response_not_found() {
        let resp = error_response(MatchError::NotFound("test".into()));
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_response_conflicts() {
        for err in [
            MatchError::AlreadyApplied,
            MatchError::AlreadyMember,
            MatchError::AlreadyFriends,
            MatchError::AlreadyResolved("r-1".into()),
            MatchError::DuplicatePending("x".into()),
            MatchError::RoleFull("backend".into()),
        ] {
            let resp = error_response(err);
            assert_eq!(resp.status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_error_response_invalid_arguments() {
        let resp = error_response(MatchError::SelfReference);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = error_response(MatchError::InvalidRole("designer".into()));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_response_forbidden() {
        let resp = error_response(MatchError::Forbidden("not the owner".into()));
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let resp = error_response(MatchError::OwnerCannotLeave);
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
