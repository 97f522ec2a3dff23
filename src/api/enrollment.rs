use crate::auth::auth::AuthUser;
use crate::model::enrollment::{CourseEnrollment, EnrollmentStatus, pick_duplicate_survivor};
use crate::utils::notifier::{Notifier, OutboundNotification};
use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct EnrollReq {
    #[schema(example = 42)]
    pub course_id: u64,
    /// Target student; ignored for student callers (always themselves)
    #[schema(example = 2001)]
    pub student_id: Option<u64>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct EnrollmentFilter {
    #[schema(example = 2001)]
    pub student_id: Option<u64>,
    #[schema(example = 42)]
    pub course_id: Option<u64>,
    #[schema(example = "ongoing")]
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct EnrollmentListResponse {
    pub data: Vec<CourseEnrollment>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Enroll a student into a course
///
/// Two uniqueness rules apply: a (student, course) pair enrolls once ever,
/// and a student holds at most one ongoing course. Both come back from the
/// database as duplicate-key errors and are told apart by the key name.
#[utoipa::path(
    post,
    path = "/api/v1/enrollment",
    request_body = EnrollReq,
    responses(
        (status = 201, description = "Enrolled"),
        (status = 400, description = "Already enrolled, or an ongoing course exists", body = Object, example = json!({
            "message": "Student already has an ongoing course"
        })),
        (status = 404, description = "Course not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollment"
)]
pub async fn enroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    payload: web::Json<EnrollReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_student_or_admin()?;

    let student_id = if auth.is_student() {
        auth.profile_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No student profile"))?
    } else {
        match payload.student_id {
            Some(id) => id,
            None => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "student_id is required"
                })));
            }
        }
    };

    let course_status =
        sqlx::query_scalar::<_, String>("SELECT status FROM courses WHERE id = ?")
            .bind(payload.course_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, course_id = payload.course_id, "Failed to fetch course");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    match course_status.as_deref() {
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Course not found"
            })));
        }
        Some("active") => {}
        Some(_) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Course is not active"
            })));
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO course_enrollments (student_id, course_id, status, enrolled_at)
        VALUES (?, ?, 'ongoing', ?)
        "#,
    )
    .bind(student_id)
    .bind(payload.course_id)
    .bind(Utc::now().naive_utc())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            notify_student(
                pool.get_ref(),
                notifier.get_ref(),
                student_id,
                "Enrollment confirmed",
                format!("You are enrolled in course #{}", payload.course_id),
            )
            .await;

            Ok(HttpResponse::Created().json(serde_json::json!({
                "message": "Enrolled successfully"
            })))
        }
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    // The key name tells which rule was violated
                    let message = if db_err.message().contains("uq_one_ongoing") {
                        "Student already has an ongoing course"
                    } else {
                        "Student is already enrolled in this course"
                    };

                    return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                        "message": message
                    })));
                }
            }

            error!(error = %e, student_id, course_id = payload.course_id, "Enrollment failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

async fn transition(
    auth: &AuthUser,
    pool: &MySqlPool,
    enrollment_id: u64,
    to: EnrollmentStatus,
) -> actix_web::Result<HttpResponse> {
    let mut sql = String::from(
        "UPDATE course_enrollments SET status = ? WHERE id = ? AND status = 'ongoing'",
    );

    // Students may only touch their own rows
    if auth.is_student() {
        sql.push_str(" AND student_id = ?");
    }

    let mut query = sqlx::query(&sql).bind(to.as_ref()).bind(enrollment_id);
    if auth.is_student() {
        let own = auth
            .profile_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No student profile"))?;
        query = query.bind(own);
    }

    let result = query.execute(pool).await.map_err(|e| {
        error!(error = %e, enrollment_id, "Enrollment transition failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Enrollment not found or not ongoing"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Enrollment {}", to)
    })))
}

/// Complete an ongoing enrollment (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/enrollment/{enrollment_id}/complete",
    params(
        ("enrollment_id" = u64, Path, description = "Enrollment ID")
    ),
    responses(
        (status = 200, description = "Enrollment completed"),
        (status = 400, description = "Enrollment not found or not ongoing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollment"
)]
pub async fn complete_enrollment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    transition(&auth, pool.get_ref(), path.into_inner(), EnrollmentStatus::Completed).await
}

/// Drop an ongoing enrollment (Student own / Admin)
#[utoipa::path(
    put,
    path = "/api/v1/enrollment/{enrollment_id}/drop",
    params(
        ("enrollment_id" = u64, Path, description = "Enrollment ID")
    ),
    responses(
        (status = 200, description = "Enrollment dropped"),
        (status = 400, description = "Enrollment not found or not ongoing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollment"
)]
pub async fn drop_enrollment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_student_or_admin()?;
    transition(&auth, pool.get_ref(), path.into_inner(), EnrollmentStatus::Dropped).await
}

/// for getting enrollments endpoint
#[utoipa::path(
    get,
    path = "/api/v1/enrollment",
    params(EnrollmentFilter),
    responses(
        (status = 200, description = "Paginated enrollment list", body = EnrollmentListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollment"
)]
pub async fn enrollment_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EnrollmentFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_student_or_admin()?;

    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if auth.is_student() {
        let own = auth
            .profile_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No student profile"))?;
        where_sql.push_str(" AND student_id = ?");
        args.push(FilterValue::U64(own));
    } else if let Some(student_id) = query.student_id {
        where_sql.push_str(" AND student_id = ?");
        args.push(FilterValue::U64(student_id));
    }

    if let Some(course_id) = query.course_id {
        where_sql.push_str(" AND course_id = ?");
        args.push(FilterValue::U64(course_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!("SELECT COUNT(*) FROM course_enrollments{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count enrollments");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, student_id, course_id, status, enrolled_at
        FROM course_enrollments
        {}
        ORDER BY enrolled_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, CourseEnrollment>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let enrollments = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch enrollment list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(EnrollmentListResponse {
        data: enrollments,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Repair legacy duplicate ongoing enrollments (Admin)
///
/// The uq_one_ongoing key stops new duplicates; rows written before it
/// existed are reconciled here: the most recent enrollment stays ongoing,
/// the rest are dropped.
#[utoipa::path(
    post,
    path = "/api/v1/enrollment/repair-duplicates",
    responses(
        (status = 200, description = "Repair summary", body = Object, example = json!({
            "students_repaired": 2,
            "enrollments_dropped": 3
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Enrollment"
)]
pub async fn repair_duplicate_enrollments(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let students = sqlx::query_scalar::<_, u64>(
        r#"
        SELECT student_id
        FROM course_enrollments
        WHERE status = 'ongoing'
        GROUP BY student_id
        HAVING COUNT(*) > 1
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to scan for duplicate enrollments");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let mut students_repaired = 0u64;
    let mut enrollments_dropped = 0u64;

    for student_id in students {
        let rows = sqlx::query_as::<_, (u64, NaiveDateTime)>(
            r#"
            SELECT id, enrolled_at
            FROM course_enrollments
            WHERE student_id = ? AND status = 'ongoing'
            "#,
        )
        .bind(student_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, student_id, "Failed to fetch duplicate rows");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        let survivor = match pick_duplicate_survivor(&rows) {
            Some(id) => id,
            None => continue,
        };

        let result = sqlx::query(
            r#"
            UPDATE course_enrollments
            SET status = 'dropped'
            WHERE student_id = ? AND status = 'ongoing' AND id <> ?
            "#,
        )
        .bind(student_id)
        .bind(survivor)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, student_id, "Failed to drop duplicate rows");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        students_repaired += 1;
        enrollments_dropped += result.rows_affected();
    }

    info!(students_repaired, enrollments_dropped, "Duplicate enrollment repair done");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "students_repaired": students_repaired,
        "enrollments_dropped": enrollments_dropped
    })))
}

/// Side-effect only: resolve the student's login and queue a notification.
async fn notify_student(
    pool: &MySqlPool,
    notifier: &Notifier,
    student_id: u64,
    title: &str,
    body: String,
) {
    let user_id = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM users WHERE role_id = 3 AND profile_id = ?",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await;

    match user_id {
        Ok(Some(user_id)) => notifier.enqueue(OutboundNotification {
            user_id,
            title: title.to_string(),
            body,
        }),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, student_id, "Skipping notification, user lookup failed");
        }
    }
}
