use axum::{
    Router,
    routing::{get, post, put},
};

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/admin", admin_routes())
        .nest("/courses", course_routes())
        .nest("/team", team_routes())
        .nest("/contact", contact_routes())
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::admin::login))
        .route("/me", get(handlers::admin::me))
}

fn course_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::course::list_courses).post(handlers::course::create_course),
        )
        .route(
            "/{id}",
            put(handlers::course::update_course).delete(handlers::course::delete_course),
        )
        .route("/stream", get(handlers::course::stream_courses))
        .layer(handlers::upload_body_limit())
}

fn team_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::team::list_team_members).post(handlers::team::add_team_member),
        )
        .route("/{id}", axum::routing::delete(handlers::team::delete_team_member))
        .layer(handlers::upload_body_limit())
}

fn contact_routes() -> Router<AppState> {
    Router::new().route("/", post(handlers::contact::send_contact_message))
}
