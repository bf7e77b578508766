//! JSON extractor whose rejections use the API error body

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;

use super::error::{ApiErrorDetail, ApiErrorResponse, ApiErrorType};

/// `axum::Json` with rejections rendered as `ApiErrorResponse`
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consume the extractor and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Body rejection rendered in the API error format
#[derive(Debug)]
pub struct JsonRejection {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for JsonRejection {
    fn into_response(self) -> Response {
        let response = ApiErrorResponse {
            error: ApiErrorDetail {
                message: self.message,
                error_type: ApiErrorType::InvalidRequestError,
                param: None,
                code: Some(self.code.to_string()),
            },
        };

        (self.status, AxumJson(response)).into_response()
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => {
                let (code, message) = describe(&rejection);

                Err(JsonRejection {
                    status: rejection.status(),
                    code,
                    message,
                })
            }
        }
    }
}

/// Error code and message for a rejected body
fn describe(rejection: &axum::extract::rejection::JsonRejection) -> (&'static str, String) {
    use axum::extract::rejection::JsonRejection::*;

    match rejection {
        // Unknown control message types land here
        JsonDataError(err) => ("json_data_error", format!("Invalid request body: {}", err.body_text())),
        JsonSyntaxError(err) => ("json_syntax_error", format!("Invalid JSON syntax: {}", err.body_text())),
        MissingJsonContentType(_) => (
            "missing_content_type",
            "Expected 'Content-Type: application/json'".to_string(),
        ),
        BytesRejection(err) => ("body_read_error", format!("Failed to read request body: {}", err.body_text())),
        _ => ("json_parse_error", "Invalid JSON request".to_string()),
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}
