use crate::auth::auth::AuthUser;
use crate::model::attendance::{ApprovalStatus, Attendance, AttendanceKind, evaluate_lateness};
use crate::model::work_settings::ShiftPolicy;
use crate::utils::notifier::{Notifier, OutboundNotification};
use crate::utils::settings_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    /// present / wfh / leave, defaults to present
    #[schema(example = "present")]
    pub kind: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    #[schema(example = 1001)]
    /// Filter by employee ID (admin only)
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by approval status
    pub status: Option<String>,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    /// Start of date range
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-01-31", value_type = String, format = "date")]
    /// End of date range
    pub to: Option<NaiveDate>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<Attendance>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 40)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
    Date(NaiveDate),
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = CheckInReq,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckInReq>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = match (auth.is_employee(), auth.profile_id) {
        (true, Some(id)) => id,
        _ => return Err(actix_web::error::ErrorForbidden("No employee profile")),
    };

    let kind = match payload.kind.as_deref() {
        None => AttendanceKind::Present,
        Some(raw) => match raw.parse::<AttendanceKind>() {
            Ok(k) => k,
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "Invalid attendance kind. Allowed: present, wfh, leave"
                })));
            }
        },
    };

    let now = Local::now().naive_local();

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, kind, check_in)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(now.date())
    .bind(kind.as_ref())
    .bind(now.time())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Checked in successfully"
        }))),

        Err(e) => {
            // Duplicate check-in for same day
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                        "message": "Already checked in today"
                    })));
                }
            }

            tracing::error!(error = %e, employee_id, "Check-in failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = match (auth.is_employee(), auth.profile_id) {
        (true, Some(id)) => id,
        _ => return Err(actix_web::error::ErrorForbidden("No employee profile")),
    };

    let now = Local::now().naive_local();

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out = ?
        WHERE employee_id = ?
        AND date = ?
        AND check_out IS NULL
        "#,
    )
    .bind(now.time())
    .bind(employee_id)
    .bind(now.date())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, employee_id, "Check-out failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active check-in found for today"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

/* =========================
Approve attendance (Admin)
========================= */
/// Swagger doc for approve_attendance endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{attendance_id}/approve",
    params(
        ("attendance_id" = u64, Path, description = "ID of the attendance row to approve")
    ),
    responses(
        (status = 200, description = "Attendance approved with derived lateness fields", body = Object, example = json!({
            "message": "Attendance approved",
            "is_late": true,
            "is_half_day": true,
            "late_minutes": 90
        })),
        (status = 400, description = "Attendance not found or already processed", body = Object, example = json!({
            "message": "Attendance not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn approve_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let attendance_id = path.into_inner();

    let row = sqlx::query_as::<_, (u64, NaiveDate, Option<NaiveTime>, String)>(
        r#"
        SELECT employee_id, date, check_in, status
        FROM attendance
        WHERE id = ?
        "#,
    )
    .bind(attendance_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, attendance_id, "Failed to fetch attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (employee_id, date, check_in, status) = match row {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Attendance not found"
            })));
        }
    };

    if status.parse::<ApprovalStatus>() != Ok(ApprovalStatus::Pending) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Attendance not found or already processed"
        })));
    }

    // Lateness is derived at approval time from the configured shift policy.
    // A row with no check-in (e.g. leave) is approved with no flags set.
    let settings = settings_cache::resolve(pool.get_ref()).await;
    let policy = ShiftPolicy::from_settings(&settings);

    let verdict = check_in
        .map(|t| evaluate_lateness(date.and_time(t), &policy))
        .unwrap_or_default();

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET status = 'approved', is_late = ?, is_half_day = ?, late_minutes = ?
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(verdict.is_late)
    .bind(verdict.is_half_day)
    .bind(verdict.late_minutes)
    .bind(attendance_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, attendance_id, "Approve attendance failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Attendance not found or already processed"
        })));
    }

    notify_employee(
        pool.get_ref(),
        notifier.get_ref(),
        employee_id,
        "Attendance approved",
        format!("Your attendance for {} was approved", date),
    )
    .await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance approved",
        "is_late": verdict.is_late,
        "is_half_day": verdict.is_half_day,
        "late_minutes": verdict.late_minutes
    })))
}

/* =========================
Reject attendance (Admin)
========================= */
/// Swagger doc for reject_attendance endpoint
#[utoipa::path(
    put,
    path = "/api/v1/attendance/{attendance_id}/reject",
    params(
        ("attendance_id" = u64, Path, description = "ID of the attendance row to reject")
    ),
    responses(
        (status = 200, description = "Attendance rejected", body = Object, example = json!({
            "message": "Attendance rejected"
        })),
        (status = 400, description = "Attendance not found or already processed", body = Object, example = json!({
            "message": "Attendance not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn reject_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    notifier: web::Data<Notifier>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let attendance_id = path.into_inner();

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET status = 'rejected', is_late = 0, is_half_day = 0, late_minutes = 0
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(attendance_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, attendance_id, "Reject attendance failed");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Attendance not found or already processed"
        })));
    }

    let employee_id = sqlx::query_scalar::<_, u64>(
        "SELECT employee_id FROM attendance WHERE id = ?",
    )
    .bind(attendance_id)
    .fetch_optional(pool.get_ref())
    .await
    .ok()
    .flatten();

    if let Some(employee_id) = employee_id {
        notify_employee(
            pool.get_ref(),
            notifier.get_ref(),
            employee_id,
            "Attendance rejected",
            "Your attendance was rejected, contact HR".to_string(),
        )
        .await;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance rejected"
    })))
}

/// for getting attendance rows endpoint
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn attendance_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    // Employees only ever see their own rows
    if auth.is_employee() {
        let own = auth
            .profile_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?;
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(own));
    } else if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    if let Some(from) = query.from {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(from));
    }

    if let Some(to) = query.to {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(to));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count attendance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT id, employee_id, date, kind, check_in, check_out, status,
               is_late, is_half_day, late_minutes
        FROM attendance
        {}
        ORDER BY date DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Attendance>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let rows = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch attendance list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: rows,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

#[derive(sqlx::FromRow)]
struct ExportRow {
    employee_code: String,
    first_name: String,
    last_name: String,
    date: NaiveDate,
    kind: String,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    status: String,
    is_late: bool,
    is_half_day: bool,
    late_minutes: i32,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ExportQuery {
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-01-31", value_type = String, format = "date")]
    pub to: Option<NaiveDate>,
}

/// CSV export of attendance rows (Admin)
#[utoipa::path(
    get,
    path = "/api/v1/attendance/export",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn export_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ExportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<NaiveDate> = Vec::new();

    if let Some(from) = query.from {
        where_sql.push_str(" AND a.date >= ?");
        args.push(from);
    }

    if let Some(to) = query.to {
        where_sql.push_str(" AND a.date <= ?");
        args.push(to);
    }

    let sql = format!(
        r#"
        SELECT e.employee_code, e.first_name, e.last_name,
               a.date, a.kind, a.check_in, a.check_out, a.status,
               a.is_late, a.is_half_day, a.late_minutes
        FROM attendance a
        JOIN employees e ON e.id = a.employee_id
        {}
        ORDER BY a.date, e.employee_code
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, ExportRow>(&sql);
    for d in args {
        data_q = data_q.bind(d);
    }

    let rows = data_q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch attendance export");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let mut csv = String::from(
        "employee_code,employee_name,date,kind,check_in,check_out,status,is_late,is_half_day,late_minutes\n",
    );

    for row in rows {
        let check_in = row.check_in.map(|t| t.to_string()).unwrap_or_default();
        let check_out = row.check_out.map(|t| t.to_string()).unwrap_or_default();
        csv.push_str(&format!(
            "{},\"{} {}\",{},{},{},{},{},{},{},{}\n",
            row.employee_code,
            row.first_name,
            row.last_name,
            row.date,
            row.kind,
            check_in,
            check_out,
            row.status,
            row.is_late,
            row.is_half_day,
            row.late_minutes
        ));
    }

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"attendance.csv\"",
        ))
        .body(csv))
}

/// Side-effect only: resolve the employee's login and queue a notification.
/// Lookup failures are logged and swallowed, never bubbled to the caller.
async fn notify_employee(
    pool: &MySqlPool,
    notifier: &Notifier,
    employee_id: u64,
    title: &str,
    body: String,
) {
    let user_id = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM users WHERE role_id = 2 AND profile_id = ?",
    )
    .bind(employee_id)
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
            tracing::warn!(error = %e, employee_id, "Skipping notification, user lookup failed");
        }
    }
}
