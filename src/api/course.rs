use crate::auth::auth::AuthUser;
use crate::model::course::Course;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateCourse {
    #[schema(example = "CS-101")]
    pub course_code: String,
    #[schema(example = "Introduction to Programming")]
    pub title: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CourseQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct CourseListResponse {
    pub data: Vec<Course>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Create Course
#[utoipa::path(
    post,
    path = "/api/v1/course",
    request_body = CreateCourse,
    responses(
        (status = 201, description = "Course created"),
        (status = 400, description = "Duplicate course code"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Course"
)]
pub async fn create_course(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCourse>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let result = sqlx::query(r#"INSERT INTO courses (course_code, title) VALUES (?, ?)"#)
        .bind(&payload.course_code)
        .bind(&payload.title)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Course created successfully"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::BadRequest().json(json!({
                        "message": "Course code already exists"
                    })));
                }
            }

            error!(error = %e, "Failed to create course");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// List Courses
#[utoipa::path(
    get,
    path = "/api/v1/course",
    params(CourseQuery),
    responses(
        (status = 200, description = "Paginated course list", body = CourseListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Course"
)]
pub async fn list_courses(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CourseQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count courses");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let data = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, course_code, title, status, created_at
        FROM courses
        ORDER BY course_code
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch course list");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(CourseListResponse {
        data,
        page,
        per_page,
        total,
    }))
}
