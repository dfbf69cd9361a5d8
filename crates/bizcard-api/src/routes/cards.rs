//! 명함 endpoint.
//!
//! 조회는 공개, 생성은 사업자 계정, 수정/삭제는 소유자 또는 관리자만 가능합니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use bizcard_core::Card;

use super::{
    validate_body, validate_phone, AddressInput, ImageInput, JsonBody, MessageResponse,
    ValidatedJson,
};
use crate::auth::{require_self_or_admin, AuthPrincipal, BusinessPrincipal, PathId};
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::state::AppState;

pub(crate) const CARD_NOT_FOUND_MSG: &str = "The card with the given ID was not found.";
pub(crate) const ALREADY_LIKED_MSG: &str = "You already liked this card.";
pub(crate) const CARD_DELETED_MSG: &str = "The card has been successfully deleted";

/// 사업자 번호 범위 (7자리)
const BIZ_NUMBER_RANGE: std::ops::RangeInclusive<u32> = 1_000_000..=9_999_999;
const BIZ_NUMBER_RETRIES: usize = 10;

/// 명함 생성/수정 본문.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CardRequest {
    #[validate(length(min = 2, max = 256, message = "\"title\" length must be 2-256"))]
    pub title: String,
    #[validate(length(min = 2, max = 256, message = "\"subtitle\" length must be 2-256"))]
    pub subtitle: String,
    #[validate(length(min = 2, max = 1024, message = "\"description\" length must be 2-1024"))]
    pub description: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(
        email(message = "\"email\" must be a valid email"),
        length(min = 5, max = 255, message = "\"email\" length must be 5-255")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 1024, message = "\"web\" length must be at most 1024"))]
    pub web: String,
    #[serde(default)]
    #[validate(nested)]
    pub image: ImageInput,
    #[serde(default)]
    #[validate(nested)]
    pub address: AddressInput,
}

impl CardRequest {
    fn apply_to(self, card: &mut Card) {
        card.title = self.title;
        card.subtitle = self.subtitle;
        card.description = self.description;
        card.phone = self.phone;
        card.email = self.email;
        card.web = self.web;
        card.image = self.image.into();
        card.address = self.address.into();
    }
}

async fn find_card(state: &AppState, id: Uuid) -> Result<Card, ApiError> {
    state
        .cards
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(CARD_NOT_FOUND_MSG.to_string()))
}

/// 사용 중이지 않은 사업자 번호를 무작위로 고릅니다.
async fn allocate_biz_number(state: &AppState) -> Result<u32, ApiError> {
    for _ in 0..BIZ_NUMBER_RETRIES {
        let candidate = rand::thread_rng().gen_range(BIZ_NUMBER_RANGE);
        if state.cards.find_by_biz_number(candidate).await?.is_none() {
            return Ok(candidate);
        }
    }

    warn!(retries = BIZ_NUMBER_RETRIES, "Biz number allocation exhausted");
    Err(ApiError::DuplicateKey(
        "Could not allocate a unique biz number".to_string(),
    ))
}

/// 전체 명함 목록.
///
/// GET /cards
#[utoipa::path(
    get,
    path = "/cards",
    responses((status = 200, description = "조회 성공", body = Vec<Card>)),
    tag = "cards"
)]
pub async fn list_cards(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Card>>> {
    Ok(Json(state.cards.list().await?))
}

/// 내 명함 목록.
///
/// GET /cards/my-cards
#[utoipa::path(
    get,
    path = "/cards/my-cards",
    responses(
        (status = 200, description = "조회 성공", body = Vec<Card>),
        (status = 401, description = "토큰 없음", body = ApiErrorResponse)
    ),
    tag = "cards"
)]
pub async fn my_cards(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Vec<Card>>> {
    Ok(Json(state.cards.find_by_owner(principal.id()).await?))
}

/// 명함 조회.
///
/// GET /cards/{id}
#[utoipa::path(
    get,
    path = "/cards/{id}",
    params(("id" = Uuid, Path, description = "명함 ID")),
    responses(
        (status = 200, description = "조회 성공", body = Card),
        (status = 404, description = "명함 없음", body = ApiErrorResponse)
    ),
    tag = "cards"
)]
pub async fn get_card(
    State(state): State<Arc<AppState>>,
    PathId(id): PathId,
) -> ApiResult<Json<Card>> {
    Ok(Json(find_card(&state, id).await?))
}

/// 명함 생성 (사업자 계정).
///
/// POST /cards
#[utoipa::path(
    post,
    path = "/cards",
    request_body = CardRequest,
    responses(
        (status = 201, description = "생성 성공", body = Card),
        (status = 400, description = "검증 실패", body = ApiErrorResponse),
        (status = 401, description = "사업자 계정 아님", body = ApiErrorResponse)
    ),
    tag = "cards"
)]
pub async fn create_card(
    State(state): State<Arc<AppState>>,
    BusinessPrincipal(principal): BusinessPrincipal,
    ValidatedJson(req): ValidatedJson<CardRequest>,
) -> ApiResult<(StatusCode, Json<Card>)> {
    let biz_number = allocate_biz_number(&state).await?;

    let mut card = Card {
        id: Uuid::new_v4(),
        owner_id: principal.id(),
        title: String::new(),
        subtitle: String::new(),
        description: String::new(),
        phone: String::new(),
        email: String::new(),
        web: String::new(),
        image: Default::default(),
        address: Default::default(),
        biz_number,
        likes: Vec::new(),
        created_at: Utc::now(),
    };
    req.apply_to(&mut card);

    let saved = state.cards.save(&card).await?;
    info!(card_id = %saved.id, owner = %saved.owner_id, biz_number, "Card created");

    Ok((StatusCode::CREATED, Json(saved)))
}

/// 명함 수정 (소유자 또는 관리자).
///
/// 소유권을 먼저 확인하고 본문을 검증합니다.
///
/// PUT /cards/{id}
#[utoipa::path(
    put,
    path = "/cards/{id}",
    params(("id" = Uuid, Path, description = "명함 ID")),
    request_body = CardRequest,
    responses(
        (status = 201, description = "수정 성공", body = Card),
        (status = 400, description = "검증 실패", body = ApiErrorResponse),
        (status = 401, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "명함 없음", body = ApiErrorResponse)
    ),
    tag = "cards"
)]
pub async fn update_card(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
    PathId(id): PathId,
    JsonBody(req): JsonBody<CardRequest>,
) -> ApiResult<(StatusCode, Json<Card>)> {
    let mut card = find_card(&state, id).await?;
    require_self_or_admin(&principal, card.owner_id)?;
    validate_body(&req)?;

    req.apply_to(&mut card);
    let saved = state.cards.save(&card).await?;
    info!(card_id = %saved.id, by = %principal.id(), "Card updated");

    Ok((StatusCode::CREATED, Json(saved)))
}

/// 좋아요.
///
/// 이미 좋아요한 사용자는 거부합니다. 검사와 추가는 원자적이지 않습니다.
///
/// PATCH /cards/{id}
#[utoipa::path(
    patch,
    path = "/cards/{id}",
    params(("id" = Uuid, Path, description = "명함 ID")),
    responses(
        (status = 200, description = "좋아요 성공", body = Card),
        (status = 400, description = "이미 좋아요함", body = ApiErrorResponse),
        (status = 404, description = "명함 없음", body = ApiErrorResponse)
    ),
    tag = "cards"
)]
pub async fn like_card(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
    PathId(id): PathId,
) -> ApiResult<Json<Card>> {
    let card = find_card(&state, id).await?;
    if card.is_liked_by(principal.id()) {
        return Err(ApiError::BadRequest(ALREADY_LIKED_MSG.to_string()));
    }

    let liked = state
        .cards
        .push_like(id, principal.id())
        .await?
        .ok_or_else(|| ApiError::NotFound(CARD_NOT_FOUND_MSG.to_string()))?;

    Ok(Json(liked))
}

/// 명함 삭제 (소유자 또는 관리자).
///
/// DELETE /cards/{id}
#[utoipa::path(
    delete,
    path = "/cards/{id}",
    params(("id" = Uuid, Path, description = "명함 ID")),
    responses(
        (status = 201, description = "삭제 성공", body = MessageResponse),
        (status = 401, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "명함 없음", body = ApiErrorResponse)
    ),
    tag = "cards"
)]
pub async fn delete_card(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
    PathId(id): PathId,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let card = find_card(&state, id).await?;
    require_self_or_admin(&principal, card.owner_id)?;

    if !state.cards.remove(id).await? {
        return Err(ApiError::NotFound(CARD_NOT_FOUND_MSG.to_string()));
    }
    info!(card_id = %id, by = %principal.id(), "Card deleted");

    Ok((StatusCode::CREATED, Json(MessageResponse::new(CARD_DELETED_MSG))))
}

pub fn cards_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_cards).post(create_card))
        .route("/my-cards", get(my_cards))
        .route(
            "/{id}",
            get(get_card)
                .put(update_card)
                .patch(like_card)
                .delete(delete_card),
        )
}
