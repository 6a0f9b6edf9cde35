use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Extension, Router, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gradebook_core::auth::Identity;
use gradebook_core::error::AppError;
use gradebook_core::models::{MarkUpdate, NewStudent, NewTeacher, StudentUpdate};
use gradebook_core::password::hash_password;

use crate::auth::{require_admin, require_user};
use crate::dto::{
    CreateMarkRequest, CreateStudentRequest, HealthResponse, MarkView, StudentResponse,
    StudentView, TeacherRequest, TeacherResponse, TeacherView, UpdateMarkRequest,
    UpdateStudentRequest, is_subject_key, project,
};
use crate::error::ApiError;
use crate::extract::ValidatedJson;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
///
/// Routes sharing a path across role groups (e.g. `/student/{student_id}`)
/// are merged per method, so each method keeps its own guard.
pub fn router(state: Arc<AppState>) -> Router {
    let students = Router::new()
        .route("/student/{student_id}", get(get_student).put(update_student))
        .route("/students/{student_id}", get(list_marks))
        .route(
            "/students/{subject_id}/{student_id}",
            get(list_marks_in_subject),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    let teachers = Router::new()
        .route("/groups", post(create_student))
        .route("/student/{student_id}", delete(delete_student))
        .route("/teachers/{id}", put(update_teacher).delete(delete_teacher))
        .route("/teacher", post(create_mark))
        .route("/teacher/{student_id}/{mark_id}", put(update_mark))
        .route(
            "/teacher/{student_id}/{mark_id}/{teacher_id}",
            delete(delete_mark),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let public = Router::new()
        .route("/teachers", get(list_teachers).post(create_teacher))
        .route("/teachers/{id}", get(get_teacher_or_subject))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(students).merge(teachers).with_state(state)
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn hash(password: String) -> Result<String, ApiError> {
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::PasswordHash(e.to_string()))??;
    Ok(hashed)
}

async fn require_subject(state: &AppState, subject_id: i32) -> Result<(), ApiError> {
    if state.db.catalog_repo().subject_exists(subject_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Subject not found: {subject_id}")).into())
    }
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/student/{student_id}",
    params(("student_id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student record", body = StudentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's record", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "students"
)]
pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_owner(&student_id)?;

    let student = state.db.student_repo().get(&student_id).await?;

    Ok(axum::Json(StudentResponse {
        student: StudentView::from(student),
    }))
}

#[utoipa::path(
    put,
    path = "/student/{student_id}",
    params(("student_id" = String, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = String),
        (status = 400, description = "Invalid data", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's record", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "New StudentId already taken", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "students"
)]
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(student_id): Path<String>,
    body: Result<ValidatedJson<UpdateStudentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_owner(&student_id)?;
    let ValidatedJson(body) = body?;

    let update = StudentUpdate {
        student_id: body.student_id,
        firstname: body.firstname,
        surname: body.surname,
        password_hash: hash(body.password).await?,
    };
    state.db.student_repo().update(&student_id, &update).await?;

    Ok((StatusCode::OK, "Success: Student was updated"))
}

#[utoipa::path(
    post,
    path = "/groups",
    request_body = CreateStudentRequest,
    responses(
        (status = 200, description = "Student added", body = String),
        (status = 400, description = "Invalid data", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Teachers only", body = crate::dto::ErrorResponse),
        (status = 404, description = "Group not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Group full or StudentId taken", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "students"
)]
pub async fn create_student(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student = NewStudent {
        student_id: body.student_id,
        firstname: body.firstname,
        surname: body.surname,
        password_hash: hash(body.password).await?,
        group_id: body.group_id,
    };
    state.db.student_repo().create(&student).await?;

    Ok((StatusCode::OK, "Success: Student was added"))
}

#[utoipa::path(
    delete,
    path = "/student/{student_id}",
    params(("student_id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student deleted", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Teachers only", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "students"
)]
pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.student_repo().delete(&student_id).await?;

    Ok((StatusCode::OK, "Success: Student was deleted"))
}

// ---------------------------------------------------------------------------
// Marks (student view)
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/students/{student_id}",
    params(("student_id" = String, Path, description = "Student ID")),
    responses(
        (status = 200, description = "All marks of the student", body = Vec<MarkView>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's marks", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "marks"
)]
pub async fn list_marks(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(student_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_owner(&student_id)?;

    let marks = state.db.mark_repo().list_for_student(&student_id).await?;

    Ok(axum::Json(project::<_, MarkView>(marks)))
}

#[utoipa::path(
    get,
    path = "/students/{subject_id}/{student_id}",
    params(
        ("subject_id" = i32, Path, description = "Subject ID"),
        ("student_id" = String, Path, description = "Student ID"),
    ),
    responses(
        (status = 200, description = "Marks of the student in one subject", body = Vec<MarkView>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's marks", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "marks"
)]
pub async fn list_marks_in_subject(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((subject_id, student_id)): Path<(i32, String)>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_owner(&student_id)?;

    let marks = state
        .db
        .mark_repo()
        .list_for_student_in_subject(&student_id, subject_id)
        .await?;

    Ok(axum::Json(project::<_, MarkView>(marks)))
}

// ---------------------------------------------------------------------------
// Teachers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/teachers",
    responses((status = 200, description = "All teachers", body = Vec<TeacherView>)),
    tag = "teachers"
)]
pub async fn list_teachers(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let teachers = state.db.teacher_repo().list().await?;

    Ok(axum::Json(project::<_, TeacherView>(teachers)))
}

/// All-digit segments address a subject, anything else a teacher.
fn subject_key(segment: &str) -> Option<i32> {
    if is_subject_key(segment) {
        segment.parse().ok()
    } else {
        None
    }
}

#[utoipa::path(
    get,
    path = "/teachers/{id}",
    params(("id" = String, Path, description = "SubjectId (digits) or TeacherId")),
    responses(
        (status = 200, description = "Teachers of a subject, or one teacher", body = TeacherResponse),
        (status = 404, description = "Subject or teacher not found", body = crate::dto::ErrorResponse),
    ),
    tag = "teachers"
)]
pub async fn get_teacher_or_subject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    if let Some(subject_id) = subject_key(&id) {
        require_subject(&state, subject_id).await?;
        let teachers = state.db.teacher_repo().list_by_subject(subject_id).await?;
        return Ok(axum::Json(project::<_, TeacherView>(teachers)).into_response());
    }

    let teacher = state.db.teacher_repo().get(&id).await?;

    Ok(axum::Json(TeacherResponse {
        teacher: TeacherView::from(teacher),
    })
    .into_response())
}

#[utoipa::path(
    post,
    path = "/teachers",
    request_body = TeacherRequest,
    responses(
        (status = 200, description = "Teacher added", body = String),
        (status = 400, description = "Invalid data", body = crate::dto::ErrorResponse),
        (status = 404, description = "Subject not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "TeacherId taken", body = crate::dto::ErrorResponse),
    ),
    tag = "teachers"
)]
pub async fn create_teacher(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<TeacherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_subject(&state, body.subject_id).await?;

    let teacher = NewTeacher {
        teacher_id: body.teacher_id,
        firstname: body.firstname,
        surname: body.surname,
        password_hash: hash(body.password).await?,
        subject_id: body.subject_id,
    };
    state.db.teacher_repo().create(&teacher).await?;

    Ok((StatusCode::OK, "Success: Teacher was added"))
}

#[utoipa::path(
    put,
    path = "/teachers/{id}",
    params(("id" = String, Path, description = "Teacher ID")),
    request_body = TeacherRequest,
    responses(
        (status = 200, description = "Teacher updated", body = String),
        (status = 400, description = "Invalid data", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's record", body = crate::dto::ErrorResponse),
        (status = 404, description = "Teacher or subject not found", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "teachers"
)]
pub async fn update_teacher(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(teacher_id): Path<String>,
    body: Result<ValidatedJson<TeacherRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_owner(&teacher_id)?;
    let ValidatedJson(body) = body?;
    require_subject(&state, body.subject_id).await?;

    let update = NewTeacher {
        teacher_id: body.teacher_id,
        firstname: body.firstname,
        surname: body.surname,
        password_hash: hash(body.password).await?,
        subject_id: body.subject_id,
    };
    state.db.teacher_repo().update(&teacher_id, &update).await?;

    Ok((StatusCode::OK, "Success: Teacher was updated"))
}

#[utoipa::path(
    delete,
    path = "/teachers/{id}",
    params(("id" = String, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher deleted", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the caller's record", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Teacher still has marks", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "teachers"
)]
pub async fn delete_teacher(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(teacher_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_owner(&teacher_id)?;

    state.db.teacher_repo().delete(&teacher_id).await?;

    Ok((StatusCode::OK, "Success: Teacher was deleted"))
}

// ---------------------------------------------------------------------------
// Marks (teacher view)
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/teacher",
    request_body = CreateMarkRequest,
    responses(
        (status = 200, description = "Mark added", body = String),
        (status = 400, description = "Invalid data", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "TeacherId is not the caller", body = crate::dto::ErrorResponse),
        (status = 404, description = "Student or subject not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "MarkId already used for this student", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "marks"
)]
pub async fn create_mark(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ValidatedJson(body): ValidatedJson<CreateMarkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_owner(&body.teacher_id)?;

    if !state.db.student_repo().exists(&body.student_id).await? {
        return Err(AppError::NotFound(format!("Student not found: {}", body.student_id)).into());
    }
    require_subject(&state, body.subject_id).await?;

    state.db.mark_repo().create(&body.into()).await?;

    Ok((StatusCode::OK, "Success: Mark was added"))
}

#[utoipa::path(
    put,
    path = "/teacher/{student_id}/{mark_id}",
    params(
        ("student_id" = String, Path, description = "Student ID"),
        ("mark_id" = i32, Path, description = "Mark ID"),
    ),
    request_body = UpdateMarkRequest,
    responses(
        (status = 200, description = "Mark updated", body = String),
        (status = 400, description = "Invalid data", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "TeacherId is not the caller", body = crate::dto::ErrorResponse),
        (status = 404, description = "Mark or subject not found", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "marks"
)]
pub async fn update_mark(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((student_id, mark_id)): Path<(String, i32)>,
    body: Result<ValidatedJson<UpdateMarkRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let marks = state.db.mark_repo();
    if !marks.exists(&student_id, mark_id).await? {
        return Err(AppError::NotFound(format!("Mark not found: {mark_id}")).into());
    }

    let ValidatedJson(body) = body?;
    identity.require_owner(&body.teacher_id)?;
    require_subject(&state, body.subject_id).await?;

    let update = MarkUpdate {
        date: body.date,
        value: body.value,
        subject_id: body.subject_id,
        teacher_id: body.teacher_id,
    };
    marks.update(&student_id, mark_id, &update).await?;

    Ok((StatusCode::OK, "Success: Mark was updated"))
}

#[utoipa::path(
    delete,
    path = "/teacher/{student_id}/{mark_id}/{teacher_id}",
    params(
        ("student_id" = String, Path, description = "Student ID"),
        ("mark_id" = i32, Path, description = "Mark ID"),
        ("teacher_id" = String, Path, description = "Caller's TeacherId"),
    ),
    responses(
        (status = 200, description = "Mark deleted", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "TeacherId is not the caller", body = crate::dto::ErrorResponse),
        (status = 404, description = "Mark not found", body = crate::dto::ErrorResponse),
    ),
    security(("basic" = [])),
    tag = "marks"
)]
pub async fn delete_mark(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((student_id, mark_id, teacher_id)): Path<(String, i32, String)>,
) -> Result<impl IntoResponse, ApiError> {
    identity.require_owner(&teacher_id)?;

    state.db.mark_repo().delete(&student_id, mark_id).await?;

    Ok((StatusCode::OK, "Success: Mark was deleted"))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_status = match state.db.health_check().await {
        Ok(()) => "ok",
        Err(_) => "error",
    };

    let status = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_status == "ok" {
            "healthy"
        } else {
            "unhealthy"
        },
        database: db_status,
    };

    (status, axum::Json(response))
}
