//! 인메모리 저장소.

use std::collections::HashMap;

use async_trait::async_trait;
use bizcard_core::{Card, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CardStore, StoreError, UserStore};

/// `RwLock<HashMap>` 기반 사용자 저장소.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_biz_number(&self, biz_number: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.biz_number.as_deref() == Some(biz_number))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        for other in users.values().filter(|u| u.id != user.id) {
            if other.email == user.email {
                return Err(StoreError::Duplicate("email".to_string()));
            }
            if user.biz_number.is_some() && other.biz_number == user.biz_number {
                return Err(StoreError::Duplicate("biz_number".to_string()));
            }
        }

        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

/// `RwLock<HashMap>` 기반 명함 저장소.
#[derive(Debug, Default)]
pub struct MemoryCardStore {
    cards: RwLock<HashMap<Uuid, Card>>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardStore for MemoryCardStore {
    async fn list(&self) -> Result<Vec<Card>, StoreError> {
        let cards = self.cards.read().await;
        let mut all: Vec<Card> = cards.values().cloned().collect();
        all.sort_by_key(|c| c.created_at);
        Ok(all)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Card>, StoreError> {
        Ok(self.cards.read().await.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Vec<Card>, StoreError> {
        let cards = self.cards.read().await;
        let mut owned: Vec<Card> = cards
            .values()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by_key(|c| c.created_at);
        Ok(owned)
    }

    async fn find_by_biz_number(&self, biz_number: u32) -> Result<Option<Card>, StoreError> {
        let cards = self.cards.read().await;
        Ok(cards.values().find(|c| c.biz_number == biz_number).cloned())
    }

    async fn save(&self, card: &Card) -> Result<Card, StoreError> {
        let mut cards = self.cards.write().await;

        if cards
            .values()
            .any(|c| c.id != card.id && c.biz_number == card.biz_number)
        {
            return Err(StoreError::Duplicate("biz_number".to_string()));
        }

        cards.insert(card.id, card.clone());
        Ok(card.clone())
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.cards.write().await.remove(&id).is_some())
    }

    async fn push_like(&self, id: Uuid, user_id: Uuid) -> Result<Option<Card>, StoreError> {
        let mut cards = self.cards.write().await;
        Ok(cards.get_mut(&id).map(|card| {
            card.likes.push(user_id);
            card.clone()
        }))
    }
}
