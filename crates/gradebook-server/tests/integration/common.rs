use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use headers::{Authorization, HeaderMapExt};
use http_body_util::BodyExt;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tower::ServiceExt;

use gradebook_core::models::Group;
use gradebook_db::Database;
use gradebook_server::routes;
use gradebook_server::state::AppState;

pub const SUBJECT: i32 = 1;
pub const OTHER_SUBJECT: i32 = 2;
pub const GROUP: i32 = 10;
pub const GROUP_SIZE: i32 = 3;

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    _container: ContainerAsync<GenericImage>,
}

/// Spin up PostgreSQL, run migrations, and seed two subjects plus one group.
pub async fn setup_test_app() -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "gradebook_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/gradebook_test");

    let db = Database::from_pool(retry_connect(&url).await);
    db.migrate().await.expect("Failed to run migrations");

    let catalog = db.catalog_repo();
    catalog.create_subject(SUBJECT).await.unwrap();
    catalog.create_subject(OTHER_SUBJECT).await.unwrap();
    catalog
        .create_group(Group {
            group_id: GROUP,
            quantity: GROUP_SIZE,
        })
        .await
        .unwrap();

    let state = Arc::new(AppState { db: db.clone() });

    TestApp {
        router: routes::router(state),
        db,
        _container: container,
    }
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}

impl TestApp {
    /// Send one request and return the status with the raw body text.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<(&str, &str)>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let mut request = builder
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        if let Some((username, password)) = auth {
            request
                .headers_mut()
                .typed_insert(Authorization::basic(username, password));
        }

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn get_json(
        &self,
        uri: &str,
        auth: Option<(&str, &str)>,
    ) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.send(Method::GET, uri, auth, None).await;
        (status, serde_json::from_str(&body).unwrap_or_default())
    }

    /// Register a teacher through the public endpoint.
    pub async fn add_teacher(&self, teacher_id: &str, password: &str, subject_id: i32) {
        let (status, body) = self
            .send(
                Method::POST,
                "/teachers",
                None,
                Some(serde_json::json!({
                    "TeacherId": teacher_id,
                    "Password": password,
                    "Firstname": "Ada",
                    "Surname": "Lovelace",
                    "SubjectId": subject_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    /// Enrol a student into the seeded group as `teacher`.
    pub async fn add_student(
        &self,
        teacher: (&str, &str),
        student_id: &str,
        password: &str,
    ) -> (StatusCode, String) {
        self.send(
            Method::POST,
            "/groups",
            Some(teacher),
            Some(serde_json::json!({
                "StudentId": student_id,
                "Firstname": "Alan",
                "Surname": "Turing",
                "Password": password,
                "GroupId": GROUP,
            })),
        )
        .await
    }

    pub async fn add_mark(
        &self,
        teacher: (&str, &str),
        student_id: &str,
        mark_id: i32,
        value: i32,
    ) -> (StatusCode, String) {
        self.send(
            Method::POST,
            "/teacher",
            Some(teacher),
            Some(serde_json::json!({
                "MarkId": mark_id,
                "Date": "2024-05-17",
                "Value": value,
                "SubjectId": SUBJECT,
                "StudentId": student_id,
                "TeacherId": teacher.0,
            })),
        )
        .await
    }

    pub async fn count_users(&self, username: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = $1")
            .bind(username)
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }
}
