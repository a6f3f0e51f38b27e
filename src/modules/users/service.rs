use portico_core::{AppError, PageRequest};
use portico_db::{StoreError, UserStore};
use portico_models::{CreateUserDto, NewUser, UpdateUserDto, User, UserChanges, UserPage};
use tracing::{info, instrument};
use uuid::Uuid;

pub const USER_NOT_FOUND: &str = "User not found";
pub const EMAIL_TAKEN: &str = "User with this email already exists";

/// Maps storage failures onto the error taxonomy.
fn store_error(err: StoreError, action: &'static str) -> AppError {
    match err {
        StoreError::NotFound => AppError::not_found(USER_NOT_FOUND),
        StoreError::UniqueViolation(_) => AppError::conflict(EMAIL_TAKEN),
        other => AppError::unexpected(anyhow::Error::new(other).context(action)),
    }
}

pub struct UserService;

impl UserService {
    #[instrument(skip(store))]
    pub async fn list_users(store: &dyn UserStore, page: PageRequest) -> Result<UserPage, AppError> {
        let (items, total) = store
            .list(page.offset(), page.limit)
            .await
            .map_err(|e| store_error(e, "Failed to list users"))?;

        Ok(UserPage::new(items, page, total))
    }

    #[instrument(skip(store))]
    pub async fn get_user(store: &dyn UserStore, id: Uuid) -> Result<User, AppError> {
        store
            .get_by_id(id)
            .await
            .map_err(|e| store_error(e, "Failed to fetch user"))
    }

    #[instrument(skip(store, dto))]
    pub async fn create_user(store: &dyn UserStore, dto: CreateUserDto) -> Result<User, AppError> {
        let new_user = NewUser::from(dto);

        let taken = store
            .exists_by_email(&new_user.email, None)
            .await
            .map_err(|e| store_error(e, "Failed to check email"))?;
        if taken {
            return Err(AppError::conflict(EMAIL_TAKEN));
        }

        let user = store
            .insert(new_user)
            .await
            .map_err(|e| store_error(e, "Failed to insert user"))?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(store, dto))]
    pub async fn update_user(
        store: &dyn UserStore,
        id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let existing = Self::get_user(store, id).await?;
        let changes = UserChanges::from(dto);

        if let Some(email) = changes.email.as_deref() {
            let taken = store
                .exists_by_email(email, Some(existing.id))
                .await
                .map_err(|e| store_error(e, "Failed to check email"))?;
            if taken {
                return Err(AppError::conflict(EMAIL_TAKEN));
            }
        }

        if changes.is_empty() {
            return Ok(existing);
        }

        let user = store
            .update(id, changes)
            .await
            .map_err(|e| store_error(e, "Failed to update user"))?;

        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    #[instrument(skip(store))]
    pub async fn delete_user(store: &dyn UserStore, id: Uuid) -> Result<(), AppError> {
        Self::get_user(store, id).await?;

        store
            .delete(id)
            .await
            .map_err(|e| store_error(e, "Failed to delete user"))?;

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}
