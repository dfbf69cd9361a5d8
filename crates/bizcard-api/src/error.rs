//! 통합 API 에러 응답 타입.
//!
//! 핸들러와 추출기는 [`ApiError`]를 반환하고, 응답 변환 시 상태 코드와
//! [`ApiErrorResponse`] JSON 본문으로 바뀝니다. 실패 내용은 응답 확장에
//! [`FailureNote`]로 남아 관측 싱크 미들웨어가 기록하고, 본문 사본은
//! 요청 정보 미들웨어가 메서드/경로를 채워 다시 씁니다.

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::observability::{FailureNote, LogLevel};
use crate::repository::StoreError;

/// 저장소/내부 오류 시 클라이언트에 노출하는 메시지.
pub const REQUEST_FAILED_MSG: &str = "Request failed";

/// 통합 API 에러 응답.
///
/// ```json
/// {
///   "code": "ACCOUNT_LOCKED",
///   "message": "The user is block to 24 please try log in later",
///   "details": { "blockHours": 24.0, "remainingHours": 23.5 },
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "NOT_FOUND")
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 핸들러 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 필드 검증 실패 (첫 번째 필드 메시지)
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    DuplicateKey(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => ApiError::DuplicateKey(format!("duplicate key: {key}")),
            other => ApiError::Store(other),
        }
    }
}

/// 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn parts(&self) -> (StatusCode, ApiErrorResponse) {
        match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("VALIDATION_ERROR", msg),
            ),
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ApiErrorResponse::new("NOT_FOUND", msg))
            }
            ApiError::DuplicateKey(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorResponse::new("DUPLICATE_KEY", msg),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("BAD_REQUEST", msg),
            ),
            ApiError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorResponse::new("STORE_ERROR", REQUEST_FAILED_MSG),
            ),
            ApiError::Auth(err) => auth_parts(err),
        }
    }
}

fn auth_parts(err: &AuthError) -> (StatusCode, ApiErrorResponse) {
    let status = match err {
        AuthError::InvalidCredentials
        | AuthError::AccountLocked { .. }
        | AuthError::InvalidToken => StatusCode::BAD_REQUEST,
        AuthError::NoToken | AuthError::Forbidden(_) => StatusCode::UNAUTHORIZED,
        AuthError::Store(_) | AuthError::Token(_) | AuthError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = match err {
        AuthError::AccountLocked {
            block_hours,
            remaining_hours,
        } => ApiErrorResponse::new(err.code(), err.to_string()).with_details(json!({
            "blockHours": block_hours,
            "remainingHours": remaining_hours,
        })),
        _ if status.is_server_error() => ApiErrorResponse::new(err.code(), REQUEST_FAILED_MSG),
        _ => ApiErrorResponse::new(err.code(), err.to_string()),
    };

    (status, body)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();

        let level = if status.is_server_error() {
            error!(error = %self, "Request failed");
            LogLevel::Error
        } else {
            LogLevel::Warn
        };

        let mut response = (status, Json(body.clone())).into_response();
        // 내부 오류는 상세 메시지를 싱크에만 남김
        response.extensions_mut().insert(FailureNote {
            level,
            message: self.to_string(),
        });
        response.extensions_mut().insert(body);
        response
    }
}
