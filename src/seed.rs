use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::admin;
use crate::utils::hash;

/// Create the bootstrap admin account when the admin table is empty and
/// credentials are configured. Existing accounts are never touched.
pub async fn ensure_admin(db: &DatabaseConnection, auth: &AuthConfig) -> anyhow::Result<()> {
    let existing = admin::Entity::find().count(db).await?;
    if existing > 0 {
        return Ok(());
    }

    let (Some(email), Some(password)) = (&auth.admin_email, &auth.admin_password) else {
        tracing::warn!(
            "no admin accounts exist and no bootstrap credentials are configured; \
             all mutation endpoints will be unreachable"
        );
        return Ok(());
    };

    let hashed = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("password hash error: {e}"))?;

    admin::ActiveModel {
        email: Set(email.clone()),
        password: Set(hashed),
        role: Set("admin".to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(email = %email, "seeded bootstrap admin account");
    Ok(())
}
