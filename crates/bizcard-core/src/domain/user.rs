//! 사용자 레코드.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::{Address, Image, PersonName};

/// 저장소에 보관되는 사용자 문서.
///
/// `blocked`와 `failed_attempts`는 [`LockoutPolicy`](super::LockoutPolicy)만
/// 변경할 수 있습니다. 외부에서는 읽기 전용 접근자만 제공됩니다.
///
/// 불변식: `blocked == true`이면 `failed_attempts`가 비어 있지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub name: PersonName,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    /// PHC 형식 해시
    pub password_hash: String,
    #[serde(default)]
    pub image: Image,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_business: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biz_number: Option<String>,
    #[serde(default)]
    pub(super) blocked: bool,
    /// 연속 실패 시각 (오래된 순)
    #[serde(default)]
    pub(super) failed_attempts: Vec<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// 잠금 이력이 없는 새 사용자를 생성합니다.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: PersonName::default(),
            phone: String::new(),
            email: email.into(),
            password_hash: password_hash.into(),
            image: Image::default(),
            address: Address::default(),
            is_admin: false,
            is_business: false,
            biz_number: None,
            blocked: false,
            failed_attempts: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn failed_attempts(&self) -> &[DateTime<Utc>] {
        &self.failed_attempts
    }

    pub fn last_failed_attempt(&self) -> Option<DateTime<Utc>> {
        self.failed_attempts.last().copied()
    }

    /// 사업자 플래그를 반전하고 새 값을 반환합니다.
    pub fn toggle_business(&mut self) -> bool {
        self.is_business = !self.is_business;
        self.is_business
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_is_unlocked() {
        let user = User::new("dana@example.com", "$argon2id$...");
        assert!(!user.is_blocked());
        assert!(user.failed_attempts().is_empty());
        assert!(user.last_failed_attempt().is_none());
        assert!(!user.is_admin);
        assert!(!user.is_business);
    }

    #[test]
    fn test_toggle_business() {
        let mut user = User::new("dana@example.com", "hash");
        assert!(user.toggle_business());
        assert!(!user.toggle_business());
    }

    #[test]
    fn test_document_roundtrip_keeps_lockout_state() {
        let json = serde_json::json!({
            "id": "6f1c2d4e-0000-4000-8000-000000000001",
            "email": "dana@example.com",
            "passwordHash": "hash",
            "blocked": true,
            "failedAttempts": ["2024-01-01T10:00:00Z"],
            "createdAt": "2024-01-01T00:00:00Z"
        });

        let user: User = serde_json::from_value(json).unwrap();
        assert!(user.is_blocked());
        assert_eq!(user.failed_attempts().len(), 1);

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["blocked"], true);
        assert!(back.get("bizNumber").is_none());
    }
}
