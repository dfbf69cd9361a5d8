//! 인증 주체.

use uuid::Uuid;

use super::jwt::Claims;

/// 검증된 토큰에서만 생성되는 인증 주체.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    id: Uuid,
    email: String,
    is_admin: bool,
    is_business: bool,
}

impl Principal {
    pub(crate) fn from_claims(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            is_admin: claims.is_admin,
            is_business: claims.is_business,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_business(&self) -> bool {
        self.is_business
    }
}
