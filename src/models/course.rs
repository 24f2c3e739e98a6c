use axum::extract::Multipart;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::course;
use crate::error::AppError;
use crate::models::shared::{ImageUpload, read_image_field, read_text_field};

/// Course fields lifted out of a multipart request. All fields optional at
/// this layer; create/update decide what is required.
#[derive(Default)]
pub struct CourseForm {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw price text as submitted; coerced to a number by `parse_price`.
    pub price: Option<String>,
    pub image: Option<ImageUpload>,
}

impl CourseForm {
    pub async fn from_multipart(
        mut multipart: Multipart,
        max_image_size: u64,
    ) -> Result<Self, AppError> {
        let mut form = CourseForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some("title") => form.title = Some(read_text_field(field, "title").await?),
                Some("description") => {
                    form.description = Some(read_text_field(field, "description").await?)
                }
                Some("price") => form.price = Some(read_text_field(field, "price").await?),
                Some("image") => {
                    form.image = Some(read_image_field(field, max_image_size).await?)
                }
                _ => {} // Ignore unknown fields.
            }
        }

        Ok(form)
    }
}

/// Coerce a form-data price string to a non-negative finite number.
pub fn parse_price(raw: &str) -> Result<f64, AppError> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("Price must be a number".into()))?;

    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(
            "Price must be a non-negative number".into(),
        ));
    }

    Ok(price)
}

/// A course as returned to clients, image resolved to an absolute URL.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "Intro to Rust")]
    pub title: String,
    #[schema(example = "Ownership, borrowing, and fearless concurrency")]
    pub description: String,
    #[schema(example = 49.99)]
    pub price: f64,
    /// Absolute image URL, or null if the course has no image.
    #[schema(example = "https://cdn.example.com/courses/a1b2.png")]
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<course::Model> for CourseResponse {
    fn from(model: course::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            price: model.price,
            image: model.image,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Confirmation returned by course deletion.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCourseResponse {
    #[schema(example = "Course deleted permanently")]
    pub message: String,
    #[schema(example = 42)]
    pub course_id: i32,
}
