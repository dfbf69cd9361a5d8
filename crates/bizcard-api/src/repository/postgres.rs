//! PostgreSQL 저장소.
//!
//! 레코드 전체를 JSONB `doc` 컬럼에 저장하고, 유일성 검사가 필요한
//! 필드(email, biz_number)만 별도 컬럼으로 둡니다.

use async_trait::async_trait;
use bizcard_core::{Card, User};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::{CardStore, StoreError, UserStore};

const USERS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          UUID PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    biz_number  TEXT UNIQUE,
    doc         JSONB NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CARDS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cards (
    id          UUID PRIMARY KEY,
    owner_id    UUID NOT NULL,
    biz_number  BIGINT NOT NULL UNIQUE,
    doc         JSONB NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// 유일성 위반을 `StoreError::Duplicate`로 변환합니다.
fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Duplicate(db.constraint().unwrap_or("unique").to_string())
        }
        _ => StoreError::Database(err),
    }
}

/// 사용자 저장소.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 테이블이 없으면 생성합니다.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(USERS_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<(Json<User>,)> = sqlx::query_as("SELECT doc FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(Json(user),)| user))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row: Option<(Json<User>,)> = sqlx::query_as("SELECT doc FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(Json(user),)| user))
    }

    async fn find_by_biz_number(&self, biz_number: &str) -> Result<Option<User>, StoreError> {
        let row: Option<(Json<User>,)> =
            sqlx::query_as("SELECT doc FROM users WHERE biz_number = $1")
                .bind(biz_number)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(user),)| user))
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<(Json<User>,)> =
            sqlx::query_as("SELECT doc FROM users ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(Json(user),)| user).collect())
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, biz_number, doc, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                biz_number = EXCLUDED.biz_number,
                doc = EXCLUDED.doc,
                updated_at = NOW()
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.biz_number)
        .bind(Json(user))
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(user.clone())
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// 명함 저장소.
#[derive(Clone)]
pub struct PgCardStore {
    pool: PgPool,
}

impl PgCardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CARDS_SCHEMA).execute(&self.pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cards_owner ON cards(owner_id)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CardStore for PgCardStore {
    async fn list(&self) -> Result<Vec<Card>, StoreError> {
        let rows: Vec<(Json<Card>,)> =
            sqlx::query_as("SELECT doc FROM cards ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(Json(card),)| card).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Card>, StoreError> {
        let row: Option<(Json<Card>,)> = sqlx::query_as("SELECT doc FROM cards WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(Json(card),)| card))
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Card>, StoreError> {
        let rows: Vec<(Json<Card>,)> =
            sqlx::query_as("SELECT doc FROM cards WHERE owner_id = $1 ORDER BY created_at")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(Json(card),)| card).collect())
    }

    async fn find_by_biz_number(&self, biz_number: u32) -> Result<Option<Card>, StoreError> {
        let row: Option<(Json<Card>,)> =
            sqlx::query_as("SELECT doc FROM cards WHERE biz_number = $1")
                .bind(i64::from(biz_number))
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(card),)| card))
    }

    async fn save(&self, card: &Card) -> Result<Card, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO cards (id, owner_id, biz_number, doc, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET owner_id = EXCLUDED.owner_id,
                biz_number = EXCLUDED.biz_number,
                doc = EXCLUDED.doc,
                updated_at = NOW()
            "#,
        )
        .bind(card.id)
        .bind(card.owner_id)
        .bind(i64::from(card.biz_number))
        .bind(Json(card))
        .bind(card.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(card.clone())
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn push_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Card>, StoreError> {
        // 단일 UPDATE로 배열 끝에 추가
        let row: Option<(Json<Card>,)> = sqlx::query_as(
            r#"
            UPDATE cards
            SET doc = jsonb_set(
                    doc,
                    '{likes}',
                    COALESCE(doc->'likes', '[]'::jsonb) || to_jsonb($2::text)
                ),
                updated_at = NOW()
            WHERE id = $1
            RETURNING doc
            "#,
        )
        .bind(id)
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(Json(card),)| card))
    }
}
