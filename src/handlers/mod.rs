pub mod admin;
pub mod contact;
pub mod course;
pub mod team;

use axum::extract::DefaultBodyLimit;

/// Body limit for multipart image mutations: the 8 MB image cap plus
/// headroom for the text fields and multipart framing.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(10 * 1024 * 1024)
}
