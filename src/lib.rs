pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod events;
pub mod extractors;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod storage;
pub mod utils;

use std::time::Duration;

use axum::Json;
use axum::http::HeaderValue;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LearnLogix Admin API",
        version = "1.0.0",
        description = "Administrative backend for the LearnLogix course-listing site"
    ),
    paths(
        handlers::admin::login,
        handlers::admin::me,
        handlers::course::create_course,
        handlers::course::list_courses,
        handlers::course::update_course,
        handlers::course::delete_course,
        handlers::course::stream_courses,
        handlers::team::add_team_member,
        handlers::team::list_team_members,
        handlers::team::delete_team_member,
        handlers::contact::send_contact_message,
    ),
    components(schemas(
        error::ErrorBody,
        models::admin::LoginRequest,
        models::admin::LoginResponse,
        models::admin::MeResponse,
        models::course::CourseResponse,
        models::course::DeleteCourseResponse,
        models::team::TeamMemberResponse,
        models::team::DeleteTeamMemberResponse,
        models::contact::ContactRequest,
        models::contact::ContactResponse,
    )),
    tags(
        (name = "Admin", description = "Admin authentication"),
        (name = "Courses", description = "Course CRUD and the SSE change feed"),
        (name = "Team", description = "Team member management"),
        (name = "Contact", description = "Contact-form mailer"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Server is alive!" }))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(state.config.server.cors.max_age));

    let origins = &state.config.server.cors.allow_origins;
    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state);
    let api = ApiDoc::openapi();

    axum::Router::new()
        .nest("/api", routes::api_routes())
        .route("/health", get(health))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
}
