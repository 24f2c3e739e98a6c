use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::mailer::ContactMessage;
use crate::models::contact::{ContactRequest, ContactResponse, validate_contact_request};
use crate::state::AppState;

/// Forward a contact-form submission to the configured recipient.
#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "Contact",
    operation_id = "sendContactMessage",
    summary = "Submit the contact form",
    description = "Validates the submission and dispatches one notification email. \
        Delivery failure is reported with a generic message; the provider error is \
        only logged.",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message sent", body = ContactResponse),
        (status = 400, description = "Missing required fields (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Delivery failure (DEPENDENCY_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(from = %payload.email))]
pub async fn send_contact_message(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    validate_contact_request(&payload)?;

    let message = ContactMessage {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        program: payload.program.filter(|p| !p.trim().is_empty()),
        message: payload.message,
    };

    state.mailer.send_contact(&message).await?;

    Ok(Json(ContactResponse {
        success: true,
        message: "Message sent successfully".into(),
    }))
}
