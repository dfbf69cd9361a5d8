//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health`, `/health/ready` - 헬스 체크
//! - `/metrics` - Prometheus 메트릭
//! - `/users` - 회원 가입, 로그인, 사용자 관리
//! - `/auth` - 로그인 (별칭)
//! - `/cards` - 명함 조회/생성/수정/좋아요/삭제

pub mod cards;
pub mod health;
pub mod users;

pub use cards::{cards_router, CardRequest};
pub use health::{health_router, metrics_handler, ComponentHealth, ComponentStatus, HealthResponse};
pub use users::{
    auth_router, users_router, LoginRequest, MessageResponse, TokenResponse, UserRequest,
    UserResponse,
};

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use bizcard_core::{Address, Image, PersonName};

use crate::error::ApiError;
use crate::middleware::{attach_request_info, metrics_layer};
use crate::observability::record_failures;
use crate::state::AppState;

/// 매칭되는 라우트가 없을 때의 메시지.
pub const NOT_FOUND_MSG: &str = "404 Page not found";

/// 국내 전화번호 (0으로 시작, 9~10자리)
static PHONE_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^0[2-9]\d{7,8}$").ok());

pub(crate) fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_RE.as_ref().is_some_and(|re| re.is_match(value)) {
        Ok(())
    } else {
        Err(ValidationError::new("phone")
            .with_message("user \"phone\" must be a valid phone number".into()))
    }
}

/// 전체 API 라우터 생성.
///
/// 에러 본문 요청 정보, 실패 기록, HTTP 메트릭 레이어를 포함합니다. 트레이스/타임아웃/CORS는
/// 바이너리에서 추가합니다.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/health", health_router())
        .route("/metrics", get(metrics_handler))
        .nest("/users", users_router())
        .nest("/auth", auth_router())
        .nest("/cards", cards_router())
        .fallback(not_found)
        .layer(middleware::from_fn(attach_request_info))
        .layer(middleware::from_fn_with_state(
            state.sink.clone(),
            record_failures,
        ))
        .layer(middleware::from_fn(metrics_layer))
        .with_state(state)
}

async fn not_found() -> Response {
    ApiError::NotFound(NOT_FOUND_MSG.to_string()).into_response()
}

// ==================== 요청 본문 검증 ====================

/// JSON 본문을 역직렬화만 하는 추출기.
///
/// 권한 검사를 먼저 해야 하는 핸들러는 이 추출기로 받은 뒤
/// [`validate_body`]를 직접 호출합니다.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// `validator` 규칙 검사. 실패 시 첫 번째 필드 메시지로 400.
pub(crate) fn validate_body<T: Validate>(value: &T) -> Result<(), ApiError> {
    value
        .validate()
        .map_err(|errors| ApiError::Validation(first_validation_message(&errors)))
}

/// JSON 본문을 역직렬화한 뒤 바로 검증하는 추출기.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        validate_body(&value)?;
        Ok(ValidatedJson(value))
    }
}

/// 필드 이름 순으로 첫 번째 검증 메시지를 찾습니다. 중첩 구조도 따라갑니다.
pub(crate) fn first_validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                if let Some(err) = errs.first() {
                    return err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("\"{field}\" is invalid"));
                }
            }
            ValidationErrorsKind::Struct(nested) => return first_validation_message(nested),
            ValidationErrorsKind::List(items) => {
                if let Some(nested) = items.values().next() {
                    return first_validation_message(nested);
                }
            }
        }
    }

    "Invalid request body".to_string()
}

// ==================== 공통 입력 타입 ====================

/// 이름 입력. 각 부분은 선택이며, 있으면 2자 이상입니다.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct NameInput {
    #[validate(length(min = 2, max = 255, message = "\"name.first\" length must be 2-255"))]
    pub first: Option<String>,
    #[validate(length(min = 2, max = 255, message = "\"name.middle\" length must be 2-255"))]
    pub middle: Option<String>,
    #[validate(length(min = 2, max = 255, message = "\"name.last\" length must be 2-255"))]
    pub last: Option<String>,
}

impl From<NameInput> for PersonName {
    fn from(input: NameInput) -> Self {
        Self {
            first: input.first.unwrap_or_default(),
            middle: input.middle.unwrap_or_default(),
            last: input.last.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct ImageInput {
    #[validate(length(max = 1024, message = "\"image.url\" length must be at most 1024"))]
    pub url: String,
    #[validate(length(max = 1024, message = "\"image.alt\" length must be at most 1024"))]
    pub alt: String,
}

impl From<ImageInput> for Image {
    fn from(input: ImageInput) -> Self {
        Self {
            url: input.url,
            alt: input.alt,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressInput {
    #[validate(length(max = 400, message = "\"address.state\" length must be at most 400"))]
    pub state: Option<String>,
    #[validate(length(min = 2, max = 400, message = "\"address.country\" length must be 2-400"))]
    pub country: Option<String>,
    #[validate(length(min = 2, max = 400, message = "\"address.city\" length must be 2-400"))]
    pub city: Option<String>,
    #[validate(length(min = 2, max = 400, message = "\"address.street\" length must be 2-400"))]
    pub street: Option<String>,
    #[validate(length(min = 1, max = 8, message = "\"address.houseNumber\" length must be 1-8"))]
    pub house_number: Option<String>,
    #[validate(length(min = 1, max = 14, message = "\"address.zip\" length must be 1-14"))]
    pub zip: Option<String>,
}

impl From<AddressInput> for Address {
    fn from(input: AddressInput) -> Self {
        Self {
            state: input.state.unwrap_or_default(),
            country: input.country.unwrap_or_default(),
            city: input.city.unwrap_or_default(),
            street: input.street.unwrap_or_default(),
            house_number: input.house_number.unwrap_or_default(),
            zip: input.zip.unwrap_or_default(),
        }
    }
}
