//! 인증/권한 에러.

use thiserror::Error;

use super::jwt::JwtError;
use crate::repository::StoreError;

/// 인증 서비스 및 권한 검사 체인의 에러.
#[derive(Debug, Error)]
pub enum AuthError {
    /// 이메일 없음과 비밀번호 불일치를 구분하지 않습니다.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("The user is block to {block_hours} please try log in later")]
    AccountLocked {
        block_hours: f64,
        /// 잠금 해제까지 남은 시간
        remaining_hours: f64,
    },

    #[error("Access denied. No token provided.")]
    NoToken,

    #[error("Invalid token.")]
    InvalidToken,

    /// 단계별 메시지
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("token error: {0}")]
    Token(#[from] JwtError),

    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// 에러 코드 (응답 본문용)
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountLocked { .. } => "ACCOUNT_LOCKED",
            Self::NoToken => "NO_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Store(_) => "STORE_ERROR",
            Self::Token(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
