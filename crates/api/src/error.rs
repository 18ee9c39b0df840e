//! API error type with HTTP response mapping.

use analytics::AnalyticsError;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::ParseIdError;
use workflow::{ErrorKind, WorkflowError};

const GENERIC_INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Detail of a 500, attached to the response for [`expose_internal_detail`].
#[derive(Debug, Clone)]
struct InternalDetail(String);

/// Every failure a handler can return. Rendered as
/// `{"success": false, "message": ...}`.
#[derive(Debug)]
pub enum ApiError {
    /// A workflow rejected the request.
    Workflow(WorkflowError),
    /// Malformed path or form input caught before reaching a workflow.
    BadRequest(String),
    /// No credential was presented.
    Unauthenticated,
    /// The caller is signed in but not an admin.
    AdminOnly,
    /// A feature that depends on missing configuration.
    Unavailable(String),
    /// Local I/O failed (image uploads).
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Workflow(err) => match err.kind() {
                ErrorKind::InvalidInput
                | ErrorKind::InsufficientStock
                | ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
                ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::AdminOnly => StatusCode::FORBIDDEN,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> String {
        match self {
            ApiError::Workflow(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::Unavailable(msg) | ApiError::Internal(msg) => {
                msg
            }
            ApiError::Unauthenticated => "Not authorized. Please login.".to_string(),
            ApiError::AdminOnly => "Access denied. Admin only.".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status != StatusCode::INTERNAL_SERVER_ERROR {
            return envelope(status, &message);
        }
        tracing::error!(error = %message, "internal server error");
        let mut response = envelope(status, GENERIC_INTERNAL_MESSAGE);
        response.extensions_mut().insert(InternalDetail(message));
        response
    }
}

fn envelope(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "success": false, "message": message });
    (status, Json(body)).into_response()
}

/// Response mapper that swaps the generic 500 message for the real detail
/// when `expose` is set. Installed per router, in development only.
pub async fn expose_internal_detail(State(expose): State<bool>, mut response: Response) -> Response {
    let detail = response.extensions_mut().remove::<InternalDetail>();
    match detail {
        Some(InternalDetail(detail)) if expose => envelope(response.status(), &detail),
        _ => response,
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        ApiError::Workflow(err)
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        let err = match err {
            AnalyticsError::Store(e) => WorkflowError::from(e),
            AnalyticsError::Denied(e) => WorkflowError::from(e),
        };
        ApiError::Workflow(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ParseIdError> for ApiError {
    fn from(err: ParseIdError) -> Self {
        ApiError::BadRequest(format!("Resource not found. Invalid: {}", err.kind()))
    }
}
