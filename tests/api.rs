//! In-process API tests: the real router driven through `tower::ServiceExt`,
//! with a mock database, an in-memory image store, and a recording mailer.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};
use serde_json::{Value, json};
use tower::ServiceExt;

use learnlogix_server::build_router;
use learnlogix_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, MailConfig, ServerConfig, StorageConfig,
};
use learnlogix_server::entity::{admin, course, team_member};
use learnlogix_server::events::EventHub;
use learnlogix_server::mailer::{ContactMessage, MailError, Mailer};
use learnlogix_server::state::AppState;
use learnlogix_server::storage::ImageStore;
use learnlogix_server::storage::memory::MemoryImageStore;
use learnlogix_server::utils::{hash, jwt};

const TEST_SECRET: &str = "test-jwt-secret";
const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

/// Mailer double that records sent messages and can be told to fail.
#[derive(Default)]
struct MockMailer {
    sent: Mutex<Vec<ContactMessage>>,
    fail: AtomicBool,
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_contact(&self, msg: &ContactMessage) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError("injected delivery failure".into()));
        }
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }
}

struct TestApp {
    router: axum::Router,
    images: Arc<MemoryImageStore>,
    mailer: Arc<MockMailer>,
    events: EventHub,
}

impl TestApp {
    fn new(db: DatabaseConnection) -> Self {
        let images = Arc::new(MemoryImageStore::new());
        let mailer = Arc::new(MockMailer::default());
        let events = EventHub::new();

        let state = AppState {
            db,
            images: images.clone() as Arc<dyn ImageStore>,
            mailer: mailer.clone() as Arc<dyn Mailer>,
            events: events.clone(),
            config: Arc::new(test_config()),
        };

        Self {
            router: build_router(state),
            images,
            mailer,
            events,
        }
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }
}

struct TestResponse {
    status: StatusCode,
    body: Value,
}

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec!["*".into()],
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: "postgres://unused".into(),
        },
        auth: AuthConfig {
            jwt_secret: TEST_SECRET.into(),
            admin_email: None,
            admin_password: None,
        },
        storage: StorageConfig {
            bucket: "test-bucket".into(),
            region: "auto".into(),
            endpoint: "http://127.0.0.1:9000".into(),
            access_key: "key".into(),
            secret_key: "secret".into(),
            public_base_url: "https://images.test".into(),
            max_image_size: 8 * 1024 * 1024,
        },
        mail: MailConfig {
            smtp_host: "127.0.0.1".into(),
            smtp_username: "noreply@test.invalid".into(),
            smtp_password: "pw".into(),
            contact_recipient: "owner@test.invalid".into(),
        },
    }
}

fn admin_row(password: &str) -> admin::Model {
    admin::Model {
        id: 1,
        email: "admin@example.com".into(),
        password: hash::hash_password(password).unwrap(),
        role: "admin".into(),
        created_at: Utc::now(),
    }
}

fn course_row(id: i32, image_key: Option<&str>) -> course::Model {
    let now = Utc::now();
    course::Model {
        id,
        title: "Intro".into(),
        description: "basics".into(),
        price: 0.0,
        image: image_key.map(|k| format!("https://images.test/{k}")),
        image_key: image_key.map(str::to_string),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn member_row(id: i32, image_key: &str) -> team_member::Model {
    team_member::Model {
        id,
        name: "Ada".into(),
        role: "Instructor".into(),
        image: format!("https://images.test/{image_key}"),
        image_key: image_key.into(),
        is_active: true,
        created_at: Utc::now(),
    }
}

fn bearer() -> String {
    let token = jwt::sign(1, "admin@example.com", "admin", TEST_SECRET).unwrap();
    format!("Bearer {token}")
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn multipart_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((content_type, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::from(body)).unwrap()
}

mod auth {
    use super::*;

    #[tokio::test]
    async fn login_requires_both_fields() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(json_request(
                "POST",
                "/api/admin/login",
                None,
                &json!({"email": "admin@example.com", "password": ""}),
            ))
            .await;

        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn login_with_unknown_email_is_unauthorized() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<admin::Model>::new()])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(json_request(
                "POST",
                "/api/admin/login",
                None,
                &json!({"email": "ghost@example.com", "password": "whatever"}),
            ))
            .await;

        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("correct-horse")]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(json_request(
                "POST",
                "/api/admin/login",
                None,
                &json!({"email": "admin@example.com", "password": "battery-staple"}),
            ))
            .await;

        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn login_returns_usable_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("correct-horse")]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(json_request(
                "POST",
                "/api/admin/login",
                None,
                &json!({"email": "admin@example.com", "password": "correct-horse"}),
            ))
            .await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["email"], "admin@example.com");

        let token = res.body["token"].as_str().unwrap();
        let claims = jwt::verify(token, TEST_SECRET).unwrap();
        assert_eq!(claims.uid, 1);
        assert_eq!(claims.sub, "admin@example.com");
    }

    #[tokio::test]
    async fn me_without_token_is_unauthorized() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(
                Request::builder()
                    .method("GET")
                    .uri("/api/admin/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn me_returns_identity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(
                Request::builder()
                    .method("GET")
                    .uri("/api/admin/me")
                    .header(header::AUTHORIZATION, bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["email"], "admin@example.com");
        assert_eq!(res.body["role"], "admin");
    }

    #[tokio::test]
    async fn token_for_deleted_admin_is_rejected() {
        // Token is valid, but the admin row no longer exists.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<admin::Model>::new()])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(
                Request::builder()
                    .method("GET")
                    .uri("/api/admin/me")
                    .header(header::AUTHORIZATION, bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod courses {
    use super::*;

    #[tokio::test]
    async fn create_without_image_yields_null_image() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([vec![course_row(1, None)]])
            .into_connection();
        let app = TestApp::new(db);
        let mut rx = app.events.subscribe();

        let res = app
            .send(multipart_request(
                "POST",
                "/api/courses",
                Some(&bearer()),
                &[("title", "Intro"), ("description", "basics"), ("price", "0")],
                None,
            ))
            .await;

        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.body["image"], Value::Null);
        assert_eq!(res.body["isActive"], true);
        assert!(app.images.is_empty());

        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind.as_str(), "create");
    }

    #[tokio::test]
    async fn create_requires_a_numeric_price() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(multipart_request(
                "POST",
                "/api/courses",
                Some(&bearer()),
                &[
                    ("title", "Intro"),
                    ("description", "basics"),
                    ("price", "abc"),
                ],
                None,
            ))
            .await;

        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.images.is_empty());
    }

    #[tokio::test]
    async fn create_uploads_image_before_inserting() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([vec![course_row(2, Some("courses/new.png"))]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(multipart_request(
                "POST",
                "/api/courses",
                Some(&bearer()),
                &[
                    ("title", "Intro"),
                    ("description", "basics"),
                    ("price", "49.99"),
                ],
                Some(("image/png", b"\x89PNG fake image bytes")),
            ))
            .await;

        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(app.images.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_disallowed_image_type() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(multipart_request(
                "POST",
                "/api/courses",
                Some(&bearer()),
                &[
                    ("title", "Intro"),
                    ("description", "basics"),
                    ("price", "0"),
                ],
                Some(("image/gif", b"GIF89a")),
            ))
            .await;

        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.images.is_empty());
    }

    #[tokio::test]
    async fn upload_failure_aborts_before_any_record_is_written() {
        // Only the admin lookup is prepared; if the handler reached the
        // insert it would consume a missing mock result and 500 instead.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .into_connection();
        let app = TestApp::new(db);
        app.images.set_fail_uploads(true);

        let res = app
            .send(multipart_request(
                "POST",
                "/api/courses",
                Some(&bearer()),
                &[
                    ("title", "Intro"),
                    ("description", "basics"),
                    ("price", "0"),
                ],
                Some(("image/png", b"\x89PNG")),
            ))
            .await;

        assert_eq!(res.status, StatusCode::BAD_GATEWAY);
        assert_eq!(res.body["code"], "UPLOAD_FAILED");
        assert!(app.images.is_empty());
    }

    #[tokio::test]
    async fn failed_insert_reclaims_the_fresh_blob() {
        // The image upload succeeds, then the insert blows up; the blob
        // must not be left orphaned.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();
        let app = TestApp::new(db);
        let mut rx = app.events.subscribe();

        let res = app
            .send(multipart_request(
                "POST",
                "/api/courses",
                Some(&bearer()),
                &[
                    ("title", "Intro"),
                    ("description", "basics"),
                    ("price", "0"),
                ],
                Some(("image/png", b"\x89PNG")),
            ))
            .await;

        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert!(app.images.is_empty());
        assert!(rx.try_recv().is_err(), "no event for a failed create");
    }

    #[tokio::test]
    async fn failed_update_reclaims_only_the_new_blob() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([vec![course_row(4, Some("courses/old.png"))]])
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();
        let app = TestApp::new(db);

        app.images
            .upload(b"old bytes", "courses/old.png", "image/png")
            .await
            .unwrap();

        let res = app
            .send(multipart_request(
                "PUT",
                "/api/courses/4",
                Some(&bearer()),
                &[],
                Some(("image/png", b"\x89PNG replacement")),
            ))
            .await;

        // The record still owns the old blob, so only the new upload goes.
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.images.len(), 1);
        assert!(app.images.contains("courses/old.png"));
    }

    #[tokio::test]
    async fn update_coerces_string_price() {
        let updated = course::Model {
            price: 49.99,
            ..course_row(3, None)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([vec![course_row(3, None)]])
            .append_query_results([vec![updated]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(multipart_request(
                "PUT",
                "/api/courses/3",
                Some(&bearer()),
                &[("price", "49.99")],
                None,
            ))
            .await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["price"], 49.99);
    }

    #[tokio::test]
    async fn update_of_missing_course_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([Vec::<course::Model>::new()])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(multipart_request(
                "PUT",
                "/api/courses/99",
                Some(&bearer()),
                &[("title", "Renamed")],
                None,
            ))
            .await;

        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn image_replacement_survives_a_failing_stale_delete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([vec![course_row(4, Some("courses/old.png"))]])
            .append_query_results([vec![course_row(4, Some("courses/replaced.png"))]])
            .into_connection();
        let app = TestApp::new(db);

        // Seed the previous blob, then make deletions fail.
        app.images
            .upload(b"old bytes", "courses/old.png", "image/png")
            .await
            .unwrap();
        app.images.set_fail_deletes(true);

        let res = app
            .send(multipart_request(
                "PUT",
                "/api/courses/4",
                Some(&bearer()),
                &[],
                Some(("image/png", b"\x89PNG replacement")),
            ))
            .await;

        // The record update committed; the failed cleanup is swallowed.
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(app.images.len(), 2);
        assert!(app.images.contains("courses/old.png"));
    }

    #[tokio::test]
    async fn update_deletes_the_superseded_blob_after_commit() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([vec![course_row(4, Some("courses/old.png"))]])
            .append_query_results([vec![course_row(4, Some("courses/replaced.png"))]])
            .into_connection();
        let app = TestApp::new(db);

        app.images
            .upload(b"old bytes", "courses/old.png", "image/png")
            .await
            .unwrap();

        let res = app
            .send(multipart_request(
                "PUT",
                "/api/courses/4",
                Some(&bearer()),
                &[],
                Some(("image/png", b"\x89PNG replacement")),
            ))
            .await;

        assert_eq!(res.status, StatusCode::OK);
        // Old blob gone, exactly the new one remains.
        assert!(!app.images.contains("courses/old.png"));
        assert_eq!(app.images.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_blob_and_notifies_every_subscriber() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([vec![course_row(5, Some("courses/gone.png"))]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let app = TestApp::new(db);

        app.images
            .upload(b"bytes", "courses/gone.png", "image/png")
            .await
            .unwrap();

        let mut first = app.events.subscribe();
        let mut second = app.events.subscribe();

        let res = app
            .send(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/courses/5")
                    .header(header::AUTHORIZATION, bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["courseId"], 5);
        assert!(!app.images.contains("courses/gone.png"));

        for rx in [&mut first, &mut second] {
            let event = rx.try_recv().unwrap();
            assert_eq!(event.kind.as_str(), "delete");
            assert_eq!(event.data, r#"{"id":5}"#);
            assert!(rx.try_recv().is_err(), "expected exactly one frame");
        }
    }

    #[tokio::test]
    async fn delete_of_missing_course_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([Vec::<course::Model>::new()])
            .into_connection();
        let app = TestApp::new(db);
        let mut rx = app.events.subscribe();

        let res = app
            .send(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/courses/99")
                    .header(header::AUTHORIZATION, bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert!(rx.try_recv().is_err(), "no event for a failed delete");
    }

    #[tokio::test]
    async fn listing_is_public() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                course_row(2, Some("courses/b.png")),
                course_row(1, None),
            ]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(
                Request::builder()
                    .method("GET")
                    .uri("/api/courses")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(res.status, StatusCode::OK);
        let list = res.body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["id"], 2);
        assert_eq!(
            list[0]["image"],
            "https://images.test/courses/b.png"
        );
    }

    #[tokio::test]
    async fn mutations_require_a_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(multipart_request(
                "POST",
                "/api/courses",
                None,
                &[("title", "Intro")],
                None,
            ))
            .await;

        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn stream_endpoint_speaks_sse() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = TestApp::new(db);

        let res = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/courses/stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let content_type = res.headers().get(header::CONTENT_TYPE).unwrap();
        assert_eq!(content_type, "text/event-stream");
        // One live subscriber while the connection body is held open.
        assert_eq!(app.events.subscriber_count(), 1);
        drop(res);
    }
}

mod team {
    use super::*;

    #[tokio::test]
    async fn member_requires_an_image() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(multipart_request(
                "POST",
                "/api/team",
                Some(&bearer()),
                &[("name", "Ada"), ("role", "Instructor")],
                None,
            ))
            .await;

        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["message"], "Image is required");
    }

    #[tokio::test]
    async fn member_is_created_with_its_photo() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([vec![member_row(7, "team/ada.jpg")]])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(multipart_request(
                "POST",
                "/api/team",
                Some(&bearer()),
                &[("name", "Ada"), ("role", "Instructor")],
                Some(("image/jpeg", b"\xff\xd8\xff jpeg bytes")),
            ))
            .await;

        assert_eq!(res.status, StatusCode::CREATED);
        assert_eq!(res.body["name"], "Ada");
        assert_eq!(app.images.len(), 1);
    }

    #[tokio::test]
    async fn failed_member_insert_reclaims_the_photo() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(multipart_request(
                "POST",
                "/api/team",
                Some(&bearer()),
                &[("name", "Ada"), ("role", "Instructor")],
                Some(("image/jpeg", b"\xff\xd8\xff jpeg bytes")),
            ))
            .await;

        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(app.images.is_empty());
    }

    #[tokio::test]
    async fn deleting_a_member_removes_the_photo() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![admin_row("pw")]])
            .append_query_results([vec![member_row(7, "team/ada.jpg")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let app = TestApp::new(db);

        app.images
            .upload(b"bytes", "team/ada.jpg", "image/jpeg")
            .await
            .unwrap();

        let res = app
            .send(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/team/7")
                    .header(header::AUTHORIZATION, bearer())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(res.status, StatusCode::OK);
        assert!(!app.images.contains("team/ada.jpg"));
    }
}

mod contact {
    use super::*;

    #[tokio::test]
    async fn missing_email_sends_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(json_request(
                "POST",
                "/api/contact",
                None,
                &json!({"name": "Jordan", "email": "", "message": "hi"}),
            ))
            .await;

        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn valid_submission_dispatches_one_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(json_request(
                "POST",
                "/api/contact",
                None,
                &json!({
                    "name": "Jordan",
                    "email": "jordan@example.com",
                    "message": "When does the next cohort start?"
                }),
            ))
            .await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["success"], true);

        let sent = app.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].email, "jordan@example.com");
        assert_eq!(sent[0].program, None);
    }

    #[tokio::test]
    async fn delivery_failure_is_a_dependency_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = TestApp::new(db);
        app.mailer.fail.store(true, Ordering::SeqCst);

        let res = app
            .send(json_request(
                "POST",
                "/api/contact",
                None,
                &json!({
                    "name": "Jordan",
                    "email": "jordan@example.com",
                    "message": "hello"
                }),
            ))
            .await;

        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body["code"], "DEPENDENCY_ERROR");
        assert_eq!(res.body["message"], "Email sending failed");
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn liveness_probe_answers() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let app = TestApp::new(db);

        let res = app
            .send(
                Request::builder()
                    .method("GET")
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;

        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["message"], "Server is alive!");
    }
}
