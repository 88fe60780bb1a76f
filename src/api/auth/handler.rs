//! Authentication Handlers
//!
//! Registration, login, and account management

use std::time::Duration;

use axum::{Extension, Json, extract::State};
use serde::Serialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    ChangePasswordRequest, LoginRequest, ProfileUpdate, RegisterRequest, User,
};
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResult};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Token plus the sanitized account (password hash never serializes)
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Register a new account
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    req.validate()?;

    let repo = UserRepository::new(state.db.clone());

    if repo.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::conflict(
            "Email already registered. Please login instead.",
        ));
    }

    let password_hash = User::hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;

    let user = repo
        .create(req.name, req.email, password_hash, req.phone)
        .await?;

    let user_id = user
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::internal("User record has no id"))?;

    let token = state
        .jwt_service
        .generate_token(&user_id, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(user_id = %user_id, email = %user.email, "User registered");

    Ok(Json(AuthResponse { token, user }))
}

/// Login with email and password
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo.find_by_email(&req.email).await?;

    // Fixed delay before inspecting the result, so "no such account" and
    // "wrong password" are indistinguishable by timing
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let user = match user {
        Some(user) => {
            let password_valid = user
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                tracing::warn!(email = %req.email, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            user
        }
        None => {
            tracing::warn!(email = %req.email, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    let user_id = user
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::internal("User record has no id"))?;

    let token = state
        .jwt_service
        .generate_token(&user_id, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(user_id = %user_id, email = %user.email, "User logged in");

    Ok(Json(AuthResponse { token, user }))
}

/// Current account profile
pub async fn me(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<User>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user))
}

/// Update name/phone/saved addresses
pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ProfileUpdate>,
) -> AppResult<Json<User>> {
    req.validate()?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo.update_profile(&current.id, req).await?;
    Ok(Json(user))
}

/// Change password after verifying the current one
pub async fn change_password(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<Json<Value>> {
    req.validate()?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let current_valid = user
        .verify_password(&req.current_password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;
    if !current_valid {
        return Err(AppError::invalid("Current password is incorrect"));
    }

    let password_hash = User::hash_password(&req.new_password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))?;
    repo.set_password(&current.id, password_hash).await?;

    tracing::info!(user_id = %current.id, "Password changed");

    Ok(Json(json!({ "message": "Password changed successfully" })))
}
