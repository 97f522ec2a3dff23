use crate::auth::auth::AuthUser;
use crate::model::goal::{Goal, GoalStatus, rollup_progress};
use crate::model::task::Task;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateGoal {
    /// Owner employee; ignored for employee callers (always their own)
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
    #[schema(example = "Ship Q1 onboarding revamp")]
    pub title: String,
    #[schema(nullable = true)]
    pub description: Option<String>,
    #[schema(example = "2026-03-31", format = "date", value_type = String)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateGoal {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "2026-03-31", format = "date", value_type = String)]
    pub due_date: Option<NaiveDate>,
    #[schema(example = "in_progress")]
    pub status: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct GoalFilter {
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
    #[schema(example = "in_progress")]
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct GoalListResponse {
    pub data: Vec<Goal>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Goal plus its tasks, joined with an explicit second query
#[derive(Serialize, ToSchema)]
pub struct GoalWithTasks {
    pub goal: Goal,
    pub tasks: Vec<Task>,
}

enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// Recompute a goal's progress and status from its tasks. Invoked after
/// every task mutation that can change the aggregate; recomputing over an
/// unchanged task set writes the same values again.
pub(crate) async fn recalculate_goal(pool: &MySqlPool, goal_id: u64) -> Result<(), sqlx::Error> {
    let status = sqlx::query_scalar::<_, String>("SELECT status FROM goals WHERE id = ?")
        .bind(goal_id)
        .fetch_optional(pool)
        .await?;

    let current = match status {
        Some(raw) => raw.parse::<GoalStatus>().unwrap_or(GoalStatus::NotStarted),
        None => return Ok(()), // goal vanished under us, nothing to roll up
    };

    let task_progress =
        sqlx::query_scalar::<_, i32>("SELECT progress FROM tasks WHERE goal_id = ?")
            .bind(goal_id)
            .fetch_all(pool)
            .await?;

    let rollup = rollup_progress(current, &task_progress);

    sqlx::query("UPDATE goals SET progress = ?, status = ? WHERE id = ?")
        .bind(rollup.progress)
        .bind(rollup.status.as_ref())
        .bind(goal_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create Goal
#[utoipa::path(
    post,
    path = "/api/v1/goal",
    request_body = CreateGoal,
    responses(
        (status = 201, description = "Goal created", body = Object, example = json!({
            "message": "Goal created successfully"
        })),
        (status = 400, description = "Missing owner"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Goal"
)]
pub async fn create_goal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateGoal>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

    // Employees always own their goals; admins must name the owner
    let employee_id = if auth.is_employee() {
        auth.profile_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))?
    } else {
        match payload.employee_id {
            Some(id) => id,
            None => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "employee_id is required"
                })));
            }
        }
    };

    sqlx::query(
        r#"
        INSERT INTO goals (employee_id, title, description, due_date)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.due_date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create goal");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Goal created successfully"
    })))
}

/// Get Goal with its tasks
#[utoipa::path(
    get,
    path = "/api/v1/goal/{goal_id}",
    params(
        ("goal_id" = u64, Path, description = "Goal ID")
    ),
    responses(
        (status = 200, description = "Goal with tasks", body = GoalWithTasks),
        (status = 404, description = "Goal not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Goal"
)]
pub async fn get_goal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

    let goal_id = path.into_inner();

    let goal = sqlx::query_as::<_, Goal>(
        r#"
        SELECT id, employee_id, title, description, due_date, status, progress, created_at
        FROM goals
        WHERE id = ?
        "#,
    )
    .bind(goal_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, goal_id, "Failed to fetch goal");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let goal = match goal {
        Some(g) => g,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Goal not found"
            })));
        }
    };

    if auth.is_employee() && auth.profile_id != Some(goal.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your goal"));
    }

    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, goal_id, employee_id, title, status, progress, completed_at, created_at
        FROM tasks
        WHERE goal_id = ?
        ORDER BY id
        "#,
    )
    .bind(goal_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, goal_id, "Failed to fetch goal tasks");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(GoalWithTasks { goal, tasks }))
}

/// for getting goals endpoint
#[utoipa::path(
    get,
    path = "/api/v1/goal",
    params(GoalFilter),
    responses(
        (status = 200, description = "Paginated goal list", body = GoalListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Goal"
)]
pub async fn goal_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<GoalFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

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

    let count_sql = format!("SELECT COUNT(*) FROM goals{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count goals");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, employee_id, title, description, due_date, status, progress, created_at
        FROM goals
        {}
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Goal>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let goals = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch goal list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(GoalListResponse {
        data: goals,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Update Goal
#[utoipa::path(
    put,
    path = "/api/v1/goal/{goal_id}",
    params(
        ("goal_id" = u64, Path, description = "Goal ID")
    ),
    request_body = UpdateGoal,
    responses(
        (status = 200, description = "Goal updated"),
        (status = 400, description = "Invalid status value"),
        (status = 404, description = "Goal not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Goal"
)]
pub async fn update_goal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateGoal>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

    let goal_id = path.into_inner();

    let current = sqlx::query_as::<_, Goal>(
        r#"
        SELECT id, employee_id, title, description, due_date, status, progress, created_at
        FROM goals
        WHERE id = ?
        "#,
    )
    .bind(goal_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, goal_id, "Failed to fetch goal");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let current = match current {
        Some(g) => g,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Goal not found"
            })));
        }
    };

    if auth.is_employee() && auth.profile_id != Some(current.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your goal"));
    }

    let status = match body.status.as_deref() {
        Some(raw) => match raw.parse::<GoalStatus>() {
            Ok(s) => s.as_ref().to_string(),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "Invalid status. Allowed: not_started, in_progress, completed"
                })));
            }
        },
        None => current.status,
    };

    let title = body.title.clone().unwrap_or(current.title);
    let description = body.description.clone().or(current.description);
    let due_date = body.due_date.or(current.due_date);

    sqlx::query(
        r#"
        UPDATE goals
        SET title = ?, description = ?, due_date = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(&title)
    .bind(&description)
    .bind(due_date)
    .bind(&status)
    .bind(goal_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, goal_id, "Failed to update goal");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Goal updated successfully"
    })))
}

/// Delete Goal (detaches its tasks first)
#[utoipa::path(
    delete,
    path = "/api/v1/goal/{goal_id}",
    params(
        ("goal_id" = u64, Path, description = "Goal ID")
    ),
    responses(
        (status = 200, description = "Goal deleted, tasks detached"),
        (status = 404, description = "Goal not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Goal"
)]
pub async fn delete_goal(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let goal_id = path.into_inner();

    // Child tasks survive the goal: detach, then delete
    let detached = sqlx::query("UPDATE tasks SET goal_id = NULL WHERE goal_id = ?")
        .bind(goal_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, goal_id, "Failed to detach tasks");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let result = sqlx::query("DELETE FROM goals WHERE id = ?")
        .bind(goal_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, goal_id, "Failed to delete goal");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Goal not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Goal deleted successfully",
        "tasks_detached": detached.rows_affected()
    })))
}
