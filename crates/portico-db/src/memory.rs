use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use portico_models::{NewUser, User, UserChanges};
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::UserStore;

/// Process-local [`UserStore`]. Records are kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<User>> {
        self.users.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<User>> {
        self.users.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn email_taken(users: &[User], email: &str, exclude_id: Option<Uuid>) -> bool {
    users
        .iter()
        .any(|u| u.email == email && Some(u.id) != exclude_id)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<User>, u64), StoreError> {
        let users = self.read();
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let page = users.iter().rev().skip(offset).take(limit).cloned().collect();
        Ok((page, users.len() as u64))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError> {
        self.read()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn exists_by_email(
        &self,
        email: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        Ok(email_taken(&self.read(), email, exclude_id))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.write();
        if email_taken(&users, &user.email, None) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            created_at: now,
            updated_at: now,
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError> {
        let mut users = self.write();
        if let Some(email) = &changes.email {
            if email_taken(&users, email, Some(id)) {
                return Err(StoreError::UniqueViolation("users_email_key".to_string()));
            }
        }

        let record = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(email) = changes.email {
            record.email = email;
        }
        if let Some(name) = changes.name {
            record.name = name;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = self.write();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Test User".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryUserStore::new();
        let created = store.insert(new_user("a@example.com")).await.unwrap();

        let fetched = store.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_total() {
        let store = MemoryUserStore::new();
        for i in 0..5 {
            store.insert(new_user(&format!("u{i}@example.com"))).await.unwrap();
        }

        let (page, total) = store.list(0, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].email, "u4@example.com");

        let (page, _) = store.list(4, 2).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].email, "u0@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let store = MemoryUserStore::new();
        store.insert(new_user("dup@example.com")).await.unwrap();

        let err = store.insert(new_user("dup@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_exists_by_email_excludes_record() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("me@example.com")).await.unwrap();

        assert!(store.exists_by_email("me@example.com", None).await.unwrap());
        assert!(!store.exists_by_email("me@example.com", Some(user.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_applies_present_fields() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("old@example.com")).await.unwrap();

        let updated = store
            .update(
                user.id,
                UserChanges {
                    email: None,
                    name: Some("Renamed".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, "old@example.com");
        assert_eq!(updated.name, "Renamed");
        assert!(updated.updated_at >= user.updated_at);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = MemoryUserStore::new();
        let user = store.insert(new_user("gone@example.com")).await.unwrap();

        store.delete(user.id).await.unwrap();
        assert!(matches!(store.delete(user.id).await, Err(StoreError::NotFound)));
        assert!(matches!(store.get_by_id(user.id).await, Err(StoreError::NotFound)));
    }
}
