use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
            LoginResponse, ProfileResponse, RegisterRequest, ResetPasswordRequest,
            UpdateProfileRequest,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{NewUser, ProfileChanges},
    },
    db::{StoreError, UniqueField},
    error::AppError,
    response::{ApiJson, ApiResponse},
    state::AppState,
    validation::{
        max_len, max_len_opt, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_USERNAME_LENGTH,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/change-password", put(change_password))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password/:token", post(reset_password))
        .route("/auth/profile", get(get_profile).put(update_profile))
}

fn duplicate(field: UniqueField) -> AppError {
    AppError::Store(StoreError::Duplicate(field))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<ProfileResponse>, AppError> {
    max_len("name", &payload.name, MAX_NAME_LENGTH)?;
    max_len("username", &payload.username, MAX_USERNAME_LENGTH)?;
    max_len("email", &payload.email, MAX_EMAIL_LENGTH)?;

    if state.users.username_taken(&payload.username, None).await? {
        warn!(username = %payload.username, "username already registered");
        return Err(duplicate(UniqueField::Username));
    }

    if state.users.email_taken(&payload.email, None).await? {
        warn!(email = %payload.email, "email already registered");
        return Err(duplicate(UniqueField::Email));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .users
        .create(NewUser {
            name: payload.name,
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(ApiResponse::created(
        "Account created successful",
        ProfileResponse::from(&user),
    ))
}

#[instrument(skip(state, keys, payload))]
pub async fn login(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<ApiResponse<LoginResponse>, AppError> {
    let Some(user) = state.users.find_by_username(&payload.username).await? else {
        warn!(username = %payload.username, "login unknown username");
        return Err(AppError::Unauthorized("Username is not registered".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Incorrect password".into()));
    }

    let access_token = keys.sign_access(user.id)?;
    let user = state
        .users
        .set_token(user.id, &format!("Bearer {access_token}"))
        .await?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            token: user.token.unwrap_or_default(),
        },
    ))
}

#[instrument(skip(state, caller, payload), fields(user_id = %caller.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<ApiResponse<ProfileResponse>, AppError> {
    if !verify_password(&payload.current_password, &caller.password_hash)? {
        warn!("change password with incorrect current password");
        return Err(AppError::Unauthorized("Incorrect current password".into()));
    }

    let password_hash = hash_password(&payload.new_password)?;
    let user = state.users.set_password(caller.id, &password_hash).await?;

    info!("password changed");
    Ok(ApiResponse::ok(
        "Password changed successful",
        ProfileResponse::from(&user),
    ))
}

#[instrument(skip(state, keys, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    State(keys): State<JwtKeys>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<ApiResponse<ForgotPasswordResponse>, AppError> {
    let Some(user) = state.users.find_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "password reset for unknown email");
        return Err(AppError::Unauthorized("Email is not registered".into()));
    };

    // Handed back in the response; a mailer would deliver it instead.
    let reset_token = keys.sign_reset(user.id)?;
    state.users.set_reset_token(user.id, &reset_token).await?;

    info!(user_id = %user.id, "password reset initiated");
    Ok(ApiResponse::ok(
        "Password reset initiated successful",
        ForgotPasswordResponse { reset_token },
    ))
}

#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<ApiResponse<ProfileResponse>, AppError> {
    let invalid = || AppError::NotFound("Invalid or expired token".into());

    let claims = state.jwt.verify_reset(&token).map_err(|e| {
        warn!(error = %e, "rejected reset token");
        invalid()
    })?;

    let Some(user) = state.users.find_by_id(claims.sub).await? else {
        warn!(user_id = %claims.sub, "reset token for missing user");
        return Err(invalid());
    };

    let password_hash = hash_password(&payload.new_password)?;
    let user = state.users.set_password(user.id, &password_hash).await?;

    info!(user_id = %user.id, "password reset");
    Ok(ApiResponse::ok(
        "Password reset successful",
        ProfileResponse::from(&user),
    ))
}

#[instrument(skip(state, caller), fields(user_id = %caller.id))]
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> Result<ApiResponse<ProfileResponse>, AppError> {
    let user = state
        .users
        .find_by_id(caller.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".into()))?;

    Ok(ApiResponse::ok(
        "Request processed successful",
        ProfileResponse::from(&user),
    ))
}

#[instrument(skip(state, caller, payload), fields(user_id = %caller.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<ApiResponse<ProfileResponse>, AppError> {
    let user = state
        .users
        .find_by_id(caller.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".into()))?;

    max_len_opt("name", payload.name.as_deref(), MAX_NAME_LENGTH)?;
    max_len_opt("username", payload.username.as_deref(), MAX_USERNAME_LENGTH)?;
    max_len_opt("email", payload.email.as_deref(), MAX_EMAIL_LENGTH)?;

    if let Some(username) = payload.username.as_deref() {
        if state.users.username_taken(username, Some(user.id)).await? {
            warn!(%username, "profile username already registered");
            return Err(duplicate(UniqueField::Username));
        }
    }

    if let Some(email) = payload.email.as_deref() {
        if state.users.email_taken(email, Some(user.id)).await? {
            warn!(%email, "profile email already registered");
            return Err(duplicate(UniqueField::Email));
        }
    }

    let changes = ProfileChanges {
        name: payload.name,
        username: payload.username,
        email: payload.email,
    };
    let user = state.users.update_profile(user.id, changes).await?;

    info!("profile updated");
    Ok(ApiResponse::ok(
        "Profile updated successful",
        ProfileResponse::from(&user),
    ))
}
