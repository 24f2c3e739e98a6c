use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::team_member;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::models::team::{DeleteTeamMemberResponse, TeamMemberForm, TeamMemberResponse};
use crate::state::AppState;
use crate::storage::{discard_image, store_image};

#[utoipa::path(
    post,
    path = "/api/team",
    tag = "Team",
    operation_id = "addTeamMember",
    summary = "Add a team member",
    description = "Creates a team member from multipart form data. `name`, `role` and the \
        `image` file are all required — unlike courses, a member always has a photo. The \
        image is uploaded before the record is written.",
    request_body(content_type = "multipart/form-data", description = "Member fields with required image"),
    responses(
        (status = 201, description = "Team member added", body = TeamMemberResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Blob store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(admin, state, multipart), fields(admin_id = admin.id))]
pub async fn add_team_member(
    admin: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form =
        TeamMemberForm::from_multipart(multipart, state.config.storage.max_image_size).await?;

    let upload = form
        .image
        .as_ref()
        .ok_or_else(|| AppError::Validation("Image is required".into()))?;

    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Name and role are required".into()))?
        .to_string();
    let role = form
        .role
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("Name and role are required".into()))?
        .to_string();

    let stored = store_image(&*state.images, &upload.data, &upload.content_type, "team").await?;

    let new_member = team_member::ActiveModel {
        name: Set(name),
        role: Set(role),
        image: Set(stored.url.clone()),
        image_key: Set(stored.key.clone()),
        is_active: Set(true),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = match new_member.insert(&state.db).await {
        Ok(model) => model,
        Err(err) => {
            discard_image(&*state.images, &stored.key).await;
            return Err(err.into());
        }
    };

    Ok((StatusCode::CREATED, Json(TeamMemberResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/api/team",
    tag = "Team",
    operation_id = "listTeamMembers",
    summary = "List active team members",
    description = "Public listing of active team members, newest first.",
    responses(
        (status = 200, description = "Active team members", body = Vec<TeamMemberResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_team_members(
    State(state): State<AppState>,
) -> Result<Json<Vec<TeamMemberResponse>>, AppError> {
    let members = team_member::Entity::find()
        .filter(team_member::Column::IsActive.eq(true))
        .order_by_desc(team_member::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        members.into_iter().map(TeamMemberResponse::from).collect(),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/team/{id}",
    tag = "Team",
    operation_id = "deleteTeamMember",
    summary = "Delete a team member",
    description = "Hard-deletes a team member; the photo blob is removed first, best-effort.",
    params(("id" = i32, Path, description = "Team member ID")),
    responses(
        (status = 200, description = "Team member deleted", body = DeleteTeamMemberResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Team member not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(admin, state), fields(id, admin_id = admin.id))]
pub async fn delete_team_member(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteTeamMemberResponse>, AppError> {
    let existing = team_member::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team member not found".into()))?;

    discard_image(&*state.images, &existing.image_key).await;

    team_member::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;

    Ok(Json(DeleteTeamMemberResponse {
        message: "Team member deleted".into(),
    }))
}
