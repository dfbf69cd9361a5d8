//! 사용자 endpoint.
//!
//! 회원 가입, 로그인, 사용자 조회/수정/사업자 전환/삭제를 제공합니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use bizcard_core::{Address, Image, PersonName, User};

use super::{validate_phone, AddressInput, ImageInput, NameInput, ValidatedJson};
use crate::auth::{hash_password, AdminPrincipal, AuthError, SelfOnly, SelfOrAdmin};
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::state::AppState;

pub(crate) const NO_USER_MSG: &str = "No such user exists in the system";
pub(crate) const USER_NOT_FOUND_MSG: &str = "User not found";
pub(crate) const DUP_EMAIL_MSG: &str = "The email is exist please try another email";
pub(crate) const BIZ_EXIST_MSG: &str = "The biz number is exist please try another number";
pub(crate) const CHANGE_BIZ_MSG: &str = "Only admin can change biz number";
pub(crate) const USER_DELETED_MSG: &str = "The User deleted successfully";

// ==================== 요청/응답 타입 ====================

/// 회원 가입 및 사용자 수정 본문.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(default)]
    #[validate(nested)]
    pub name: NameInput,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(
        email(message = "\"email\" must be a valid email"),
        length(min = 6, max = 255, message = "\"email\" length must be 6-255")
    )]
    pub email: String,
    #[validate(length(min = 6, max = 1024, message = "\"password\" length must be 6-1024"))]
    pub password: String,
    #[serde(default)]
    #[validate(nested)]
    pub image: ImageInput,
    #[serde(default)]
    #[validate(nested)]
    pub address: AddressInput,
    /// 가입 시에만 반영됩니다.
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default, alias = "biz")]
    pub is_business: Option<bool>,
    #[serde(default)]
    #[validate(length(max = 10000, message = "\"bizNumber\" is too long"))]
    pub biz_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        email(message = "\"email\" must be a valid email"),
        length(min = 6, max = 255, message = "\"email\" length must be 6-255")
    )]
    pub email: String,
    #[validate(length(min = 6, max = 1024, message = "\"password\" length must be 6-1024"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 사용자 응답. 비밀번호 해시와 잠금 이력은 포함하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: PersonName,
    pub phone: String,
    pub email: String,
    pub image: Image,
    pub address: Address,
    pub is_admin: bool,
    pub is_business: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biz_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            phone: user.phone,
            email: user.email,
            image: user.image,
            address: user.address,
            is_admin: user.is_admin,
            is_business: user.is_business,
            biz_number: user.biz_number,
            created_at: user.created_at,
        }
    }
}

fn hash(password: &str) -> Result<String, ApiError> {
    hash_password(password).map_err(|e| ApiError::Auth(AuthError::Internal(e.to_string())))
}

// ==================== 핸들러 ====================

/// 회원 가입.
///
/// POST /users
#[utoipa::path(
    post,
    path = "/users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "가입 성공", body = UserResponse),
        (status = 400, description = "검증 실패", body = ApiErrorResponse),
        (status = 500, description = "중복 키", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<UserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(ApiError::DuplicateKey(DUP_EMAIL_MSG.to_string()));
    }
    if let Some(biz_number) = req.biz_number.as_deref() {
        if state.users.find_by_biz_number(biz_number).await?.is_some() {
            return Err(ApiError::DuplicateKey(BIZ_EXIST_MSG.to_string()));
        }
    }

    let mut user = User::new(req.email, hash(&req.password)?);
    user.name = req.name.into();
    user.phone = req.phone;
    user.image = req.image.into();
    user.address = req.address.into();
    user.is_admin = req.is_admin.unwrap_or(false);
    user.is_business = req.is_business.unwrap_or(false);
    user.biz_number = req.biz_number;

    let saved = state.users.save(&user).await?;
    info!(user_id = %saved.id, "User registered");

    Ok((StatusCode::CREATED, Json(saved.into())))
}

/// 로그인.
///
/// POST /users/login, POST /auth
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = TokenResponse),
        (status = 400, description = "자격 증명 오류 또는 잠금", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let outcome = state.auth.login(&req.email, &req.password, Utc::now()).await?;
    Ok(Json(TokenResponse {
        token: outcome.token,
    }))
}

/// 사용자 목록 (관리자).
///
/// GET /users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "조회 성공", body = Vec<UserResponse>),
        (status = 401, description = "권한 없음", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminPrincipal(_admin): AdminPrincipal,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// 사용자 조회 (본인 또는 관리자).
///
/// GET /users/{id}
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    responses(
        (status = 201, description = "조회 성공", body = UserResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    SelfOrAdmin(_principal, id): SelfOrAdmin,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NO_USER_MSG.to_string()))?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// 사용자 수정 (본인만).
///
/// 다른 사용자가 쓰는 이메일, 관리자가 아닌 사용자의 사업자 번호 변경은 거부됩니다.
/// 비밀번호는 다시 해싱되며 관리자 플래그는 바뀌지 않습니다.
///
/// PUT /users/{id}
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    request_body = UserRequest,
    responses(
        (status = 201, description = "수정 성공", body = UserResponse),
        (status = 400, description = "검증 실패", body = ApiErrorResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse),
        (status = 500, description = "중복 키", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    SelfOnly(principal, id): SelfOnly,
    ValidatedJson(req): ValidatedJson<UserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    if let Some(other) = state.users.find_by_email(&req.email).await? {
        if other.id != id {
            return Err(ApiError::DuplicateKey(DUP_EMAIL_MSG.to_string()));
        }
    }

    if let Some(biz_number) = req.biz_number.as_deref() {
        if !principal.is_admin() {
            return Err(ApiError::DuplicateKey(CHANGE_BIZ_MSG.to_string()));
        }
        if let Some(other) = state.users.find_by_biz_number(biz_number).await? {
            if other.id != id {
                return Err(ApiError::DuplicateKey(BIZ_EXIST_MSG.to_string()));
            }
        }
    }

    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND_MSG.to_string()))?;

    user.name = req.name.into();
    user.phone = req.phone;
    user.email = req.email;
    user.password_hash = hash(&req.password)?;
    user.image = req.image.into();
    user.address = req.address.into();
    if let Some(is_business) = req.is_business {
        user.is_business = is_business;
    }
    if req.biz_number.is_some() {
        user.biz_number = req.biz_number;
    }

    let saved = state.users.save(&user).await?;
    info!(user_id = %saved.id, "User updated");

    Ok((StatusCode::CREATED, Json(saved.into())))
}

/// 사업자 플래그 전환 (본인만).
///
/// PATCH /users/{id}
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    responses(
        (status = 201, description = "전환 성공", body = UserResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn toggle_business(
    State(state): State<Arc<AppState>>,
    SelfOnly(_principal, id): SelfOnly,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(NO_USER_MSG.to_string()))?;

    let is_business = user.toggle_business();
    let saved = state.users.save(&user).await?;
    info!(user_id = %saved.id, is_business, "Business flag toggled");

    Ok((StatusCode::CREATED, Json(saved.into())))
}

/// 사용자 삭제 (본인 또는 관리자).
///
/// DELETE /users/{id}
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "사용자 ID")),
    responses(
        (status = 201, description = "삭제 성공", body = MessageResponse),
        (status = 404, description = "사용자 없음", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    SelfOrAdmin(principal, id): SelfOrAdmin,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    if !state.users.remove(id).await? {
        return Err(ApiError::NotFound(NO_USER_MSG.to_string()));
    }
    info!(user_id = %id, by = %principal.id(), "User deleted");

    Ok((StatusCode::CREATED, Json(MessageResponse::new(USER_DELETED_MSG))))
}

// ==================== 라우터 ====================

pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users).post(register))
        .route("/login", post(login))
        .route(
            "/{id}",
            get(get_user)
                .put(update_user)
                .patch(toggle_business)
                .delete(delete_user),
        )
}

/// `POST /auth` 로그인 별칭.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(login))
}
