//! User models and DTOs.

use std::borrow::Cow;

use portico_core::Page;
use portico_core::pagination::deserialize_optional_u64;
use serde::{Deserialize, Deserializer, Serialize, de};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

pub const NAME_MAX_LEN: usize = 100;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

pub type UserPage = Page<User>;

/// Fields for a new user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl UserChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none()
    }
}

/// Body of `POST /api/v1/users`.
///
/// Fields are optional at the type level so a missing field is reported
/// alongside every other violation instead of failing deserialization.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CreateUserDto {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Validate for CreateUserDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match &self.email {
            Some(email) => check_email(&mut errors, email),
            None => errors.add("email", rule_error("required", "Email is required")),
        }
        match &self.name {
            Some(name) => check_name(&mut errors, name),
            None => errors.add("name", rule_error("required", "Name is required")),
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Expects a validated DTO.
impl From<CreateUserDto> for NewUser {
    fn from(dto: CreateUserDto) -> Self {
        Self {
            email: dto.email.unwrap_or_default(),
            name: dto.name.unwrap_or_default(),
        }
    }
}

/// Body of `PUT /api/v1/users/:id`. Same rules as creation, for the
/// fields that are present.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Validate for UpdateUserDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(email) = &self.email {
            check_email(&mut errors, email);
        }
        if let Some(name) = &self.name {
            check_name(&mut errors, name);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<UpdateUserDto> for UserChanges {
    fn from(dto: UpdateUserDto) -> Self {
        Self {
            email: dto.email,
            name: dto.name,
        }
    }
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if !email.validate_email() {
        errors.add("email", rule_error("email", "Invalid email format"));
    }
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    let len = name.chars().count();
    if len < 1 {
        errors.add("name", rule_error("length", "Name is required"));
    } else if len > NAME_MAX_LEN {
        errors.add("name", rule_error("length", "Name is too long"));
    }
}

#[derive(Deserialize, Debug, Clone, Default, Validate)]
pub struct ListUsersQuery {
    #[serde(default, deserialize_with = "deserialize_optional_u64")]
    #[validate(range(min = 1, message = "page must be a positive integer"))]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_optional_u64")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u64>,
}

/// Path parameters of `/api/v1/users/:id`.
#[derive(Deserialize, Debug, Clone, Validate)]
pub struct UserIdParams {
    #[serde(deserialize_with = "deserialize_user_id")]
    pub id: Uuid,
}

fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Uuid::parse_str(raw.trim()).map_err(|_| de::Error::custom("Invalid user ID format"))
}
