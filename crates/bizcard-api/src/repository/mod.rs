//! 저장소 계층.
//!
//! 사용자/명함 문서 저장소 인터페이스와 구현을 제공합니다.
//!
//! - [`MemoryUserStore`], [`MemoryCardStore`]: DB 미설정 시 및 테스트용
//! - [`PgUserStore`], [`PgCardStore`]: PostgreSQL JSONB 문서 저장
//!
//! 쓰기는 레코드 단위로 직렬화되지만, 읽기-수정-쓰기 구간은 보호하지 않습니다.
//! 같은 계정에 대한 동시 로그인 실패는 카운트가 누락될 수 있습니다.

mod memory;
mod postgres;

pub use memory::{MemoryCardStore, MemoryUserStore};
pub use postgres::{PgCardStore, PgUserStore};

use async_trait::async_trait;
use bizcard_core::{Card, User};
use thiserror::Error;
use uuid::Uuid;

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 유일성 제약 위반 (제약/필드 이름)
    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 사용자 자격증명 저장소.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 저장소 종류 (헬스 체크 표시용)
    fn backend(&self) -> &'static str;

    /// 저장소 연결 확인.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_biz_number(&self, biz_number: &str) -> Result<Option<User>, StoreError>;

    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// ID 기준 upsert. 이메일/사업자 번호가 다른 사용자와 겹치면 `Duplicate`.
    async fn save(&self, user: &User) -> Result<User, StoreError>;

    /// 삭제되었으면 `true`.
    async fn remove(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// 명함 저장소.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Card>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Card>, StoreError>;

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Card>, StoreError>;

    async fn find_by_biz_number(&self, biz_number: u32) -> Result<Option<Card>, StoreError>;

    /// ID 기준 upsert. 사업자 번호가 겹치면 `Duplicate`.
    async fn save(&self, card: &Card) -> Result<Card, StoreError>;

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError>;

    /// 좋아요 목록 끝에 사용자를 추가합니다. 중복 검사는 하지 않습니다.
    async fn push_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Card>, StoreError>;
}
