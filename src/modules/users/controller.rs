use axum::extract::State;
use portico_core::{AppError, PageRequest, RequestContext, Success};
use portico_models::{CreateUserDto, ListUsersQuery, UpdateUserDto, User, UserIdParams, UserPage};
use serde::Serialize;

use crate::middleware::validation::{NoInput, Schema, Validated};
use crate::modules::users::service::UserService;
use crate::state::AppState;

impl Schema for ListUsersQuery {}
impl Schema for UserIdParams {}
impl Schema for CreateUserDto {}
impl Schema for UpdateUserDto {}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
}

pub async fn list_users(
    State(state): State<AppState>,
    ctx: RequestContext,
    input: Validated<ListUsersQuery>,
) -> Result<Success<UserPage>, AppError> {
    let page = PageRequest::new(input.query.page, input.query.limit);
    let users = UserService::list_users(state.users.as_ref(), page).await?;
    Ok(ctx.ok(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    input: Validated<NoInput, UserIdParams>,
) -> Result<Success<User>, AppError> {
    let user = UserService::get_user(state.users.as_ref(), input.params.id).await?;
    Ok(ctx.ok(user))
}

/// Responds with 201 and the stored record.
pub async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    input: Validated<NoInput, NoInput, CreateUserDto>,
) -> Result<Success<User>, AppError> {
    let user = UserService::create_user(state.users.as_ref(), input.body).await?;
    Ok(ctx.created(user))
}

/// Partial update; absent fields keep their value.
pub async fn update_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    input: Validated<NoInput, UserIdParams, UpdateUserDto>,
) -> Result<Success<User>, AppError> {
    let user = UserService::update_user(state.users.as_ref(), input.params.id, input.body).await?;
    Ok(ctx.ok(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    input: Validated<NoInput, UserIdParams>,
) -> Result<Success<DeletedResponse>, AppError> {
    UserService::delete_user(state.users.as_ref(), input.params.id).await?;
    Ok(ctx.ok(DeletedResponse {
        message: "User deleted successfully",
    }))
}
