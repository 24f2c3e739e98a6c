use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::admin;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::models::admin::{LoginRequest, LoginResponse, MeResponse, validate_login_request};
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// Handle admin login.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "Admin",
    operation_id = "adminLogin",
    summary = "Admin login",
    description = "Exchanges admin credentials for a bearer token valid for 24 hours.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let email = payload.email.trim();

    let admin = admin::Entity::find()
        .filter(admin::Column::Email.eq(email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &admin.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = jwt::sign(
        admin.id,
        &admin.email,
        &admin.role,
        &state.config.auth.jwt_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    Ok(Json(LoginResponse {
        token,
        email: admin.email,
        role: admin.role,
    }))
}

/// Return the current authenticated admin's identity.
#[utoipa::path(
    get,
    path = "/api/admin/me",
    tag = "Admin",
    operation_id = "adminMe",
    summary = "Current admin identity",
    responses(
        (status = 200, description = "Authenticated admin", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(admin), fields(admin_id = admin.id))]
pub async fn me(admin: AdminUser) -> Json<MeResponse> {
    Json(MeResponse {
        id: admin.id,
        email: admin.email,
        role: admin.role,
    })
}
