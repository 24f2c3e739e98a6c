use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Contact-form submission.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ContactRequest {
    #[schema(example = "Jordan Smith")]
    pub name: String,
    #[schema(example = "jordan@example.com")]
    pub email: String,
    /// Program the visitor is asking about, if any.
    #[serde(default)]
    #[schema(example = "Data Engineering")]
    pub program: Option<String>,
    #[schema(example = "When does the next cohort start?")]
    pub message: String,
}

pub fn validate_contact_request(payload: &ContactRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.message.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Name, Email and Message are required".into(),
        ));
    }
    Ok(())
}

/// Contact submission acknowledgement.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ContactResponse {
    pub success: bool,
    #[schema(example = "Message sent successfully")]
    pub message: String,
}
