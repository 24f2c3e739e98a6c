use axum::extract::Multipart;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::team_member;
use crate::error::AppError;
use crate::models::shared::{ImageUpload, read_image_field, read_text_field};

/// Team-member fields lifted out of a multipart request.
#[derive(Default)]
pub struct TeamMemberForm {
    pub name: Option<String>,
    pub role: Option<String>,
    pub image: Option<ImageUpload>,
}

impl TeamMemberForm {
    pub async fn from_multipart(
        mut multipart: Multipart,
        max_image_size: u64,
    ) -> Result<Self, AppError> {
        let mut form = TeamMemberForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some("name") => form.name = Some(read_text_field(field, "name").await?),
                Some("role") => form.role = Some(read_text_field(field, "role").await?),
                Some("image") => {
                    form.image = Some(read_image_field(field, max_image_size).await?)
                }
                _ => {} // Ignore unknown fields.
            }
        }

        Ok(form)
    }
}

/// A team member as returned to clients.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "Lead Instructor")]
    pub role: String,
    /// Absolute image URL; members always have one.
    #[schema(example = "https://cdn.example.com/team/c3d4.jpg")]
    pub image: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<team_member::Model> for TeamMemberResponse {
    fn from(model: team_member::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            role: model.role,
            image: model.image,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Confirmation returned by team-member deletion.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteTeamMemberResponse {
    #[schema(example = "Team member deleted")]
    pub message: String,
}
