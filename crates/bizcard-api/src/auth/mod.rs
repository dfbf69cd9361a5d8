//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`AuthService`]: 로그인 (잠금 정책 + 자격 증명 검증 + 토큰 발급)
//! - [`TokenCodec`], [`JwtCodec`]: 세션 토큰 서명/검증
//! - [`Principal`]: 토큰 검증으로만 만들어지는 인증 주체
//! - [`AuthPrincipal`], [`AdminPrincipal`], [`BusinessPrincipal`],
//!   [`SelfOrAdmin`], [`SelfOnly`]: Axum 추출기 형태의 권한 검사 체인
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn update_user(SelfOnly(principal, id): SelfOnly) -> impl IntoResponse {
//!     format!("{} updates {}", principal.email(), id)
//! }
//! ```

mod error;
mod jwt;
mod middleware;
mod password;
mod permissions;
mod principal;
mod service;

pub use error::AuthError;
pub use jwt::{Claims, JwtCodec, JwtError, TokenCodec};
pub use middleware::{
    AdminPrincipal, AuthPrincipal, BusinessPrincipal, PathId, SelfOnly, SelfOrAdmin,
    AUTH_TOKEN_HEADER,
};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::{require_admin, require_business_role, require_self_only, require_self_or_admin};
pub use principal::Principal;
pub use service::{AuthService, LoginOutcome};
