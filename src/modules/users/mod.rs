pub mod controller;
pub mod router;
pub mod service;

pub use portico_models::{CreateUserDto, UpdateUserDto, User};
