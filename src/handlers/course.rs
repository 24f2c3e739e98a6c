use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::sse::{Event, KeepAlive, Sse};
use sea_orm::*;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::instrument;

use crate::entity::course;
use crate::error::{AppError, ErrorBody};
use crate::events::EventKind;
use crate::extractors::auth::AdminUser;
use crate::models::course::{CourseForm, CourseResponse, DeleteCourseResponse, parse_price};
use crate::state::AppState;
use crate::storage::{discard_image, store_image};

#[utoipa::path(
    post,
    path = "/api/courses",
    tag = "Courses",
    operation_id = "createCourse",
    summary = "Create a course",
    description = "Creates a course from multipart form data. `title`, `description` and \
        `price` are required; `image` is an optional JPEG/PNG/WebP file. The image is \
        uploaded to the blob store before the record is written, so a failed upload \
        leaves no partial state.",
    request_body(content_type = "multipart/form-data", description = "Course fields with optional image"),
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Blob store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(admin, state, multipart), fields(admin_id = admin.id))]
pub async fn create_course(
    admin: AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = CourseForm::from_multipart(multipart, state.config.storage.max_image_size).await?;

    let title = require_text(form.title, "Title")?;
    let description = require_text(form.description, "Description")?;
    let price = parse_price(
        form.price
            .as_deref()
            .ok_or_else(|| AppError::Validation("Price is required".into()))?,
    )?;

    // Upload first; the record is only written once the blob is durable.
    let stored = match &form.image {
        Some(upload) => Some(
            store_image(
                &*state.images,
                &upload.data,
                &upload.content_type,
                "courses",
            )
            .await?,
        ),
        None => None,
    };

    let now = chrono::Utc::now();
    let new_course = course::ActiveModel {
        title: Set(title),
        description: Set(description),
        price: Set(price),
        image: Set(stored.as_ref().map(|s| s.url.clone())),
        image_key: Set(stored.as_ref().map(|s| s.key.clone())),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = match new_course.insert(&state.db).await {
        Ok(model) => model,
        Err(err) => {
            // The record never existed; reclaim the fresh blob.
            if let Some(stored) = &stored {
                discard_image(&*state.images, &stored.key).await;
            }
            return Err(err.into());
        }
    };

    let response = CourseResponse::from(model);
    state.events.publish(EventKind::Create, &response);

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "Courses",
    operation_id = "listCourses",
    summary = "List active courses",
    description = "Public listing of active courses, newest first. Image URLs are absolute.",
    responses(
        (status = 200, description = "Active courses", body = Vec<CourseResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, AppError> {
    let courses = course::Entity::find()
        .filter(course::Column::IsActive.eq(true))
        .order_by_desc(course::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    tag = "Courses",
    operation_id = "updateCourse",
    summary = "Update a course",
    description = "Updates a course from multipart form data; omitted fields keep their \
        current values. When a new image is supplied it is uploaded first, the record is \
        updated with the new URL, and only then is the superseded blob deleted \
        (best-effort) — the record never points at a deleted blob.",
    params(("id" = i32, Path, description = "Course ID")),
    request_body(content_type = "multipart/form-data", description = "Changed fields with optional replacement image"),
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Blob store failure (UPLOAD_FAILED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(admin, state, multipart), fields(id, admin_id = admin.id))]
pub async fn update_course(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<CourseResponse>, AppError> {
    let form = CourseForm::from_multipart(multipart, state.config.storage.max_image_size).await?;

    let existing = find_course(&state.db, id).await?;
    let previous_key = existing.image_key.clone();

    // Validate text fields before touching the blob store so a bad price
    // can't strand a freshly uploaded image.
    let title = match form.title {
        Some(title) => {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::Validation("Title must not be empty".into()));
            }
            Some(title)
        }
        None => None,
    };
    let description = match form.description {
        Some(description) => {
            let description = description.trim().to_string();
            if description.is_empty() {
                return Err(AppError::Validation("Description must not be empty".into()));
            }
            Some(description)
        }
        None => None,
    };
    let price = form.price.as_deref().map(parse_price).transpose()?;

    // New blob goes in before the record is touched.
    let new_image = match &form.image {
        Some(upload) => Some(
            store_image(
                &*state.images,
                &upload.data,
                &upload.content_type,
                "courses",
            )
            .await?,
        ),
        None => None,
    };

    let mut active: course::ActiveModel = existing.into();
    if let Some(title) = title {
        active.title = Set(title);
    }
    if let Some(description) = description {
        active.description = Set(description);
    }
    if let Some(price) = price {
        active.price = Set(price);
    }
    if let Some(stored) = &new_image {
        active.image = Set(Some(stored.url.clone()));
        active.image_key = Set(Some(stored.key.clone()));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = match active.update(&state.db).await {
        Ok(model) => model,
        Err(err) => {
            // Update never committed; the record still owns the old blob.
            if let Some(stored) = &new_image {
                discard_image(&*state.images, &stored.key).await;
            }
            return Err(err.into());
        }
    };

    // Only after the new URL is durably on the record may the old blob go.
    if new_image.is_some()
        && let Some(old_key) = previous_key
    {
        discard_image(&*state.images, &old_key).await;
    }

    let response = CourseResponse::from(model);
    state.events.publish(EventKind::Update, &response);

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    tag = "Courses",
    operation_id = "deleteCourse",
    summary = "Delete a course",
    description = "Hard-deletes a course. Its image blob is removed first (best-effort, \
        tolerating an already-absent blob) so the record reference is never the last \
        thing standing between the blob and a leak.",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted", body = DeleteCourseResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Course not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(admin, state), fields(id, admin_id = admin.id))]
pub async fn delete_course(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteCourseResponse>, AppError> {
    let existing = find_course(&state.db, id).await?;

    if let Some(key) = &existing.image_key {
        discard_image(&*state.images, key).await;
    }

    course::Entity::delete_by_id(id).exec(&state.db).await?;

    state
        .events
        .publish(EventKind::Delete, &serde_json::json!({ "id": id }));

    Ok(Json(DeleteCourseResponse {
        message: "Course deleted permanently".into(),
        course_id: id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/courses/stream",
    tag = "Courses",
    operation_id = "streamCourses",
    summary = "Course change feed (SSE)",
    description = "Server-sent-events stream of course lifecycle changes. Frames are \
        `event: create|update|delete` with a JSON `data` payload. The first frame \
        carries a 10s reconnect hint; there is no replay of events published before \
        the connection opened.",
    responses(
        (status = 200, description = "text/event-stream of course lifecycle events"),
    ),
)]
#[instrument(skip(state))]
pub async fn stream_courses(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    tracing::debug!(
        subscribers = state.events.subscriber_count(),
        "sse client connected"
    );

    // Reconnect hint, matching the original feed's `retry: 10000`.
    let hello = tokio_stream::once(Ok::<_, Infallible>(
        Event::default().retry(Duration::from_millis(10_000)),
    ));

    let events = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(ev) => Some(Ok(Event::default().event(ev.kind.as_str()).data(ev.data))),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "sse subscriber lagged, events skipped");
            None
        }
    });

    Sse::new(hello.chain(events)).keep_alive(KeepAlive::default())
}

fn require_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    let value = value
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

async fn find_course<C: ConnectionTrait>(db: &C, id: i32) -> Result<course::Model, AppError> {
    course::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".into()))
}
