//! 명함 레코드.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::{Address, Image};

/// 사업자 사용자가 게시하는 명함.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    /// 소유자 사용자 ID
    pub owner_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub web: String,
    #[serde(default)]
    pub image: Image,
    #[serde(default)]
    pub address: Address,
    /// 서버가 발급하는 사업자 번호
    pub biz_number: u32,
    /// 좋아요를 누른 사용자 ID 목록
    #[serde(default)]
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }
}
