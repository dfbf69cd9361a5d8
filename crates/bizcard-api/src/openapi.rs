//! OpenAPI 문서화 설정.
//!
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//! 새 endpoint는 핸들러에 `#[utoipa::path(...)]`를 달고 아래 `paths(...)`에 추가합니다.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use bizcard_core::{Address, Card, Image, PersonName};

use crate::error::ApiErrorResponse;
use crate::routes::{
    AddressInput, CardRequest, ComponentHealth, ComponentStatus, HealthResponse, ImageInput,
    LoginRequest, MessageResponse, NameInput, TokenResponse, UserRequest, UserResponse,
};

/// Bizcard API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bizcard API",
        version = "0.1.0",
        description = r#"
# 명함 디렉터리 REST API

## 인증

`POST /users/login`으로 받은 토큰을 `x-auth-token` 헤더
(또는 `Authorization: Bearer <token>`)에 담아 보냅니다.

## 로그인 잠금

연속 실패가 한도(기본 5회)에 도달하면 계정이 잠기고,
마지막 실패로부터 잠금 시간(기본 24시간)이 지나면 다음 로그인 시 해제됩니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    tags(
        (name = "health", description = "헬스 체크"),
        (name = "users", description = "회원 가입, 로그인, 사용자 관리"),
        (name = "cards", description = "명함")
    ),
    components(
        schemas(
            ApiErrorResponse,
            HealthResponse,
            ComponentHealth,
            ComponentStatus,
            UserRequest,
            LoginRequest,
            TokenResponse,
            MessageResponse,
            UserResponse,
            NameInput,
            ImageInput,
            AddressInput,
            CardRequest,
            Card,
            PersonName,
            Image,
            Address,
        )
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        crate::routes::users::register,
        crate::routes::users::login,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::toggle_business,
        crate::routes::users::delete_user,

        crate::routes::cards::list_cards,
        crate::routes::cards::my_cards,
        crate::routes::cards::get_card,
        crate::routes::cards::create_card,
        crate::routes::cards::update_card,
        crate::routes::cards::like_card,
        crate::routes::cards::delete_card,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터.
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
