use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error,
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.body.details = Some(details);
        self
    }

    pub fn bad_request(details: Vec<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", "Invalid JSON format").with_details(details)
    }

    pub fn invalid_query(details: Vec<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            "Invalid query parameters",
        )
        .with_details(details)
    }

    pub fn validation_failed(details: Vec<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            "Invalid input data",
        )
        .with_details(details)
    }

    pub fn internal_server_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            "Something went wrong",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Malformed { details } => ApiError::bad_request(details),
            ApplicationError::Validation { details } => ApiError::validation_failed(details),
            // 其余都是服务端故障：完整信息只写日志，不返回给客户端
            other => {
                tracing::error!(error = %other, "request failed with internal error");
                ApiError::internal_server_error()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::StorageError;

    #[test]
    fn validation_errors_keep_details() {
        let err = ApiError::from(ApplicationError::Validation {
            details: vec!["Username is required".to_string()],
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = serde_json::to_value(&err.body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "error": "Validation failed",
                "message": "Invalid input data",
                "details": ["Username is required"]
            })
        );
    }

    #[test]
    fn internal_errors_hide_detail() {
        let err = ApiError::from(ApplicationError::Storage(StorageError::failure(
            "password=hunter2",
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_string(&err.body).unwrap();
        assert!(!body.contains("hunter2"));
        assert!(!body.contains("details"));
    }
}
