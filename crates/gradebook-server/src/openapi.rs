use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gradebook API",
        version = "0.1.0",
        description = "School gradebook: students, teachers, groups and marks."
    ),
    paths(
        crate::routes::get_student,
        crate::routes::update_student,
        crate::routes::create_student,
        crate::routes::delete_student,
        crate::routes::list_marks,
        crate::routes::list_marks_in_subject,
        crate::routes::list_teachers,
        crate::routes::get_teacher_or_subject,
        crate::routes::create_teacher,
        crate::routes::update_teacher,
        crate::routes::delete_teacher,
        crate::routes::create_mark,
        crate::routes::update_mark,
        crate::routes::delete_mark,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::CreateStudentRequest,
        crate::dto::UpdateStudentRequest,
        crate::dto::StudentView,
        crate::dto::StudentResponse,
        crate::dto::TeacherRequest,
        crate::dto::TeacherView,
        crate::dto::TeacherResponse,
        crate::dto::CreateMarkRequest,
        crate::dto::UpdateMarkRequest,
        crate::dto::MarkView,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "students", description = "Student records"),
        (name = "teachers", description = "Teacher records and subject lookup"),
        (name = "marks", description = "Marks issued by teachers"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the HTTP Basic security scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Basic)
                        .description(Some(
                            "StudentId or TeacherId as username, with the account password.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
