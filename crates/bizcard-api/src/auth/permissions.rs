//! 역할/소유권 검사.
//!
//! 토큰 검증 이후 단계입니다. 실패는 모두 `Forbidden`이며 체인을 중단합니다.

use uuid::Uuid;

use super::{AuthError, Principal};

pub(crate) const NO_PERMISSION_MSG: &str = "You dont have permissions!!!";
pub(crate) const NOT_BUSINESS_MSG: &str = "You dont have access to create a card!!!";

pub fn require_admin(principal: &Principal) -> Result<(), AuthError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(AuthError::forbidden(NO_PERMISSION_MSG))
    }
}

/// 본인이거나 관리자여야 합니다.
pub fn require_self_or_admin(principal: &Principal, owner_id: Uuid) -> Result<(), AuthError> {
    if principal.id() == owner_id || principal.is_admin() {
        Ok(())
    } else {
        Err(AuthError::forbidden(NO_PERMISSION_MSG))
    }
}

/// 본인만 허용합니다. 관리자도 예외가 아닙니다.
pub fn require_self_only(principal: &Principal, owner_id: Uuid) -> Result<(), AuthError> {
    if principal.id() == owner_id {
        Ok(())
    } else {
        Err(AuthError::forbidden(NO_PERMISSION_MSG))
    }
}

pub fn require_business_role(principal: &Principal) -> Result<(), AuthError> {
    if principal.is_business() {
        Ok(())
    } else {
        Err(AuthError::forbidden(NOT_BUSINESS_MSG))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;

    fn principal(is_admin: bool, is_business: bool) -> Principal {
        Principal::from_claims(Claims {
            sub: Uuid::new_v4(),
            email: "p@example.com".to_string(),
            is_admin,
            is_business,
            iat: 0,
            exp: None,
        })
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&principal(true, false)).is_ok());
        assert!(matches!(
            require_admin(&principal(false, true)),
            Err(AuthError::Forbidden(_))
        ));
    }

    #[test]
    fn test_self_only_rejects_admin_on_other() {
        let admin = principal(true, false);
        let other = Uuid::new_v4();

        assert!(require_self_only(&admin, other).is_err());
        assert!(require_self_or_admin(&admin, other).is_ok());
    }

    #[test]
    fn test_self_access() {
        let user = principal(false, false);

        assert!(require_self_only(&user, user.id()).is_ok());
        assert!(require_self_or_admin(&user, user.id()).is_ok());
        assert!(require_self_or_admin(&user, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_business_role_message() {
        let err = require_business_role(&principal(false, false)).unwrap_err();
        assert_eq!(err.to_string(), NOT_BUSINESS_MSG);
        assert!(require_business_role(&principal(false, true)).is_ok());
    }
}
