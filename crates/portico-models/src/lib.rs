//! # Portico Models
//!
//! Domain models and request DTOs.
//!
//! - [`users`]: the `User` record, its write models and request DTOs
//! - [`health`]: health check payloads

pub mod health;
pub mod users;

pub use health::{HealthReport, HealthStatus, Liveness};
pub use users::{
    CreateUserDto, ListUsersQuery, NewUser, UpdateUserDto, User, UserChanges, UserIdParams,
    UserPage,
};
