use async_trait::async_trait;
use portico_models::{NewUser, User, UserChanges};
use uuid::Uuid;

use crate::error::StoreError;

/// Persistence for user records.
///
/// Implementations report a missing record as [`StoreError::NotFound`] and
/// a duplicate email as [`StoreError::UniqueViolation`]; anything else is an
/// unexpected failure.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Newest first. Returns the page and the total number of records.
    async fn list(&self, offset: u64, limit: u64) -> Result<(Vec<User>, u64), StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<User, StoreError>;

    /// Whether `email` belongs to a record other than `exclude_id`.
    async fn exists_by_email(&self, email: &str, exclude_id: Option<Uuid>)
    -> Result<bool, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Cheap connectivity check for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;
}
