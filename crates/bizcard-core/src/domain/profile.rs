//! 사용자/명함이 공유하는 프로필 값 타입.

use serde::{Deserialize, Serialize};

/// 사람 이름.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct PersonName {
    pub first: String,
    pub middle: String,
    pub last: String,
}

/// 이미지 참조.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct Image {
    pub url: String,
    pub alt: String,
}

/// 주소.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    pub state: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
    pub zip: String,
}
