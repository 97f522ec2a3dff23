use crate::api::goal::recalculate_goal;
use crate::auth::auth::AuthUser;
use crate::model::task::{Task, TaskStatus, synchronize_completion};
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateTask {
    #[schema(example = 10, nullable = true)]
    pub goal_id: Option<u64>,
    /// Assignee; ignored for employee callers (always themselves)
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
    #[schema(example = "Draft onboarding checklist")]
    pub title: String,
    #[schema(example = "pending")]
    pub status: Option<String>,
    #[schema(example = 0)]
    pub progress: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTask {
    pub title: Option<String>,
    #[schema(example = "completed")]
    pub status: Option<String>,
    #[schema(example = 100)]
    pub progress: Option<i32>,
    /// Move the task under another goal
    #[schema(example = 11, nullable = true)]
    pub goal_id: Option<u64>,
    /// Detach the task from its goal (wins over goal_id)
    pub detach_goal: Option<bool>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TaskFilter {
    #[schema(example = 10)]
    pub goal_id: Option<u64>,
    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct TaskListResponse {
    pub data: Vec<Task>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

fn parse_status(raw: &str) -> Result<TaskStatus, HttpResponse> {
    raw.parse::<TaskStatus>().map_err(|_| {
        HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid status. Allowed: pending, in_progress, completed"
        }))
    })
}

async fn goal_exists(pool: &MySqlPool, goal_id: u64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM goals WHERE id = ? LIMIT 1)")
        .bind(goal_id)
        .fetch_one(pool)
        .await
}

/// Create Task
#[utoipa::path(
    post,
    path = "/api/v1/task",
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created"),
        (status = 400, description = "Invalid status or unknown goal"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn create_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTask>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

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

    let status = match payload.status.as_deref() {
        Some(raw) => match parse_status(raw) {
            Ok(s) => s,
            Err(resp) => return Ok(resp),
        },
        None => TaskStatus::Pending,
    };

    if let Some(goal_id) = payload.goal_id {
        let exists = goal_exists(pool.get_ref(), goal_id).await.map_err(|e| {
            error!(error = %e, goal_id, "Failed to check goal");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        if !exists {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Goal not found"
            })));
        }
    }

    // Completion fields always pass through the synchronizer before a write
    let (progress, completed_at) = synchronize_completion(
        status,
        payload.progress.unwrap_or(0),
        None,
        Utc::now().naive_utc(),
    );

    sqlx::query(
        r#"
        INSERT INTO tasks (goal_id, employee_id, title, status, progress, completed_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.goal_id)
    .bind(employee_id)
    .bind(&payload.title)
    .bind(status.as_ref())
    .bind(progress)
    .bind(completed_at)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if let Some(goal_id) = payload.goal_id {
        if let Err(e) = recalculate_goal(pool.get_ref(), goal_id).await {
            error!(error = %e, goal_id, "Goal rollup failed after task create");
        }
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Task created successfully"
    })))
}

/// Get Task by ID
#[utoipa::path(
    get,
    path = "/api/v1/task/{task_id}",
    params(
        ("task_id" = u64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task found", body = Task),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn get_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

    let task_id = path.into_inner();

    let task = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, goal_id, employee_id, title, status, progress, completed_at, created_at
        FROM tasks
        WHERE id = ?
        "#,
    )
    .bind(task_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, task_id, "Failed to fetch task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match task {
        Some(t) => {
            if auth.is_employee() && auth.profile_id != Some(t.employee_id) {
                return Err(actix_web::error::ErrorForbidden("Not your task"));
            }
            Ok(HttpResponse::Ok().json(t))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Task not found"
        }))),
    }
}

/// for getting tasks endpoint
#[utoipa::path(
    get,
    path = "/api/v1/task",
    params(TaskFilter),
    responses(
        (status = 200, description = "Paginated task list", body = TaskListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn task_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TaskFilter>,
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

    if let Some(goal_id) = query.goal_id {
        where_sql.push_str(" AND goal_id = ?");
        args.push(FilterValue::U64(goal_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND status = ?");
        args.push(FilterValue::Str(status));
    }

    let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count tasks");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let data_sql = format!(
        r#"
        SELECT id, goal_id, employee_id, title, status, progress, completed_at, created_at
        FROM tasks
        {}
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, Task>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let tasks = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch task list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(TaskListResponse {
        data: tasks,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Update Task (runs the completion synchronizer, then rolls up goals)
#[utoipa::path(
    put,
    path = "/api/v1/task/{task_id}",
    params(
        ("task_id" = u64, Path, description = "Task ID")
    ),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated"),
        (status = 400, description = "Invalid status or unknown goal"),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn update_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateTask>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

    let task_id = path.into_inner();

    let current = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, goal_id, employee_id, title, status, progress, completed_at, created_at
        FROM tasks
        WHERE id = ?
        "#,
    )
    .bind(task_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, task_id, "Failed to fetch task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let current = match current {
        Some(t) => t,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Task not found"
            })));
        }
    };

    if auth.is_employee() && auth.profile_id != Some(current.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your task"));
    }

    let status = match body.status.as_deref() {
        Some(raw) => match parse_status(raw) {
            Ok(s) => s,
            Err(resp) => return Ok(resp),
        },
        None => current
            .status
            .parse::<TaskStatus>()
            .unwrap_or(TaskStatus::Pending),
    };

    // Resolve the goal linkage: detach wins, then explicit move, then keep
    let new_goal_id = if body.detach_goal.unwrap_or(false) {
        None
    } else if let Some(goal_id) = body.goal_id {
        let exists = goal_exists(pool.get_ref(), goal_id).await.map_err(|e| {
            error!(error = %e, goal_id, "Failed to check goal");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        if !exists {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Goal not found"
            })));
        }
        Some(goal_id)
    } else {
        current.goal_id
    };

    let title = body.title.clone().unwrap_or(current.title);

    let (progress, completed_at) = synchronize_completion(
        status,
        body.progress.unwrap_or(current.progress),
        current.completed_at,
        Utc::now().naive_utc(),
    );

    sqlx::query(
        r#"
        UPDATE tasks
        SET goal_id = ?, title = ?, status = ?, progress = ?, completed_at = ?
        WHERE id = ?
        "#,
    )
    .bind(new_goal_id)
    .bind(&title)
    .bind(status.as_ref())
    .bind(progress)
    .bind(completed_at)
    .bind(task_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, task_id, "Failed to update task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Both sides of a goal move need a fresh rollup
    let mut touched = vec![current.goal_id, new_goal_id];
    touched.dedup();
    for goal_id in touched.into_iter().flatten() {
        if let Err(e) = recalculate_goal(pool.get_ref(), goal_id).await {
            error!(error = %e, goal_id, "Goal rollup failed after task update");
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Task updated successfully"
    })))
}

/// Delete Task
#[utoipa::path(
    delete,
    path = "/api/v1/task/{task_id}",
    params(
        ("task_id" = u64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn delete_task(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

    let task_id = path.into_inner();

    let task = sqlx::query_as::<_, (u64, Option<u64>)>(
        "SELECT employee_id, goal_id FROM tasks WHERE id = ?",
    )
    .bind(task_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, task_id, "Failed to fetch task");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (employee_id, goal_id) = match task {
        Some(t) => t,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Task not found"
            })));
        }
    };

    if auth.is_employee() && auth.profile_id != Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your task"));
    }

    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, task_id, "Failed to delete task");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if let Some(goal_id) = goal_id {
        if let Err(e) = recalculate_goal(pool.get_ref(), goal_id).await {
            error!(error = %e, goal_id, "Goal rollup failed after task delete");
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Task deleted successfully"
    })))
}
