//! Axum용 권한 검사 체인.
//!
//! 상태 전이: `Unauthenticated -> Authenticated -> Authorized`.
//! 어느 단계든 실패하면 거부 응답으로 끝납니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn list_users(AdminPrincipal(admin): AdminPrincipal) -> impl IntoResponse {
//!     format!("admin: {}", admin.email())
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

use super::{
    require_admin, require_business_role, require_self_only, require_self_or_admin, AuthError,
    Principal,
};
use crate::error::ApiError;
use crate::state::AppState;

/// 세션 토큰 헤더.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// 요청 헤더에서 토큰을 꺼냅니다.
///
/// `x-auth-token`을 우선하고, 없으면 `Authorization: Bearer`를 사용합니다.
fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    if let Some(value) = headers.get(AUTH_TOKEN_HEADER) {
        let token = value.to_str().map_err(|_| AuthError::InvalidToken)?.trim();
        if token.is_empty() {
            return Err(AuthError::NoToken);
        }
        return Ok(token);
    }

    let header = headers.get(AUTHORIZATION).ok_or(AuthError::NoToken)?;
    header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidToken)
}

/// 경로의 `{id}` 세그먼트.
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub Uuid);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation("Invalid id".to_string()))?;
        Ok(PathId(id))
    }
}

/// 토큰 검증 단계. 유효한 토큰이면 [`Principal`]을 제공합니다.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

impl FromRequestParts<Arc<AppState>> for AuthPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)?;
        let claims = state
            .tokens
            .verify(token)
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthPrincipal(Principal::from_claims(claims)))
    }
}

/// 관리자 전용.
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl FromRequestParts<Arc<AppState>> for AdminPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthPrincipal(principal) = AuthPrincipal::from_request_parts(parts, state).await?;
        require_admin(&principal)?;
        Ok(AdminPrincipal(principal))
    }
}

/// 사업자 계정 전용.
#[derive(Debug, Clone)]
pub struct BusinessPrincipal(pub Principal);

impl FromRequestParts<Arc<AppState>> for BusinessPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthPrincipal(principal) = AuthPrincipal::from_request_parts(parts, state).await?;
        require_business_role(&principal)?;
        Ok(BusinessPrincipal(principal))
    }
}

/// 경로 `{id}`의 본인 또는 관리자.
#[derive(Debug, Clone)]
pub struct SelfOrAdmin(pub Principal, pub Uuid);

impl FromRequestParts<Arc<AppState>> for SelfOrAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthPrincipal(principal) = AuthPrincipal::from_request_parts(parts, state).await?;
        let PathId(id) = PathId::from_request_parts(parts, state).await?;
        require_self_or_admin(&principal, id)?;
        Ok(SelfOrAdmin(principal, id))
    }
}

/// 경로 `{id}`의 본인만. 관리자도 거부됩니다.
#[derive(Debug, Clone)]
pub struct SelfOnly(pub Principal, pub Uuid);

impl FromRequestParts<Arc<AppState>> for SelfOnly {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthPrincipal(principal) = AuthPrincipal::from_request_parts(parts, state).await?;
        let PathId(id) = PathId::from_request_parts(parts, state).await?;
        require_self_only(&principal, id)?;
        Ok(SelfOnly(principal, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    #[test]
    fn test_extract_custom_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("abc.def.ghi"));
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_custom_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_TOKEN_HEADER, HeaderValue::from_static("first"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer second"));
        assert_eq!(extract_token(&headers).unwrap(), "first");
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(
            extract_token(&HeaderMap::new()),
            Err(AuthError::NoToken)
        ));
    }

    #[test]
    fn test_non_bearer_scheme_is_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(matches!(
            extract_token(&headers),
            Err(AuthError::InvalidToken)
        ));
    }

    proptest! {
        #[test]
        fn prop_bearer_token_extracted_verbatim(token in "[A-Za-z0-9_-]{1,40}(\\.[A-Za-z0-9_-]{1,40}){0,2}") {
            let mut headers = HeaderMap::new();
            let value = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();
            headers.insert(AUTHORIZATION, value);
            prop_assert_eq!(extract_token(&headers).unwrap(), token.as_str());
        }

        #[test]
        fn prop_non_bearer_scheme_is_invalid(token in "[A-Za-z0-9]{1,40}") {
            let mut headers = HeaderMap::new();
            let value = HeaderValue::from_str(&format!("Basic {token}")).unwrap();
            headers.insert(AUTHORIZATION, value);
            prop_assert!(matches!(extract_token(&headers), Err(AuthError::InvalidToken)));
        }
    }
}
