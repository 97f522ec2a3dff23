use crate::auth::auth::AuthUser;
use crate::model::notification::Notification;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct NotificationQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// true returns unread only
    pub unread: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub data: Vec<Notification>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// List the caller's notifications
#[utoipa::path(
    get,
    path = "/api/v1/notification",
    params(NotificationQuery),
    responses(
        (status = 200, description = "Paginated notification list", body = NotificationListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn notification_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<NotificationQuery>,
) -> actix_web::Result<impl Responder> {
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    let unread_only = query.unread.unwrap_or(false);

    let where_sql = if unread_only {
        " WHERE user_id = ? AND is_read = 0"
    } else {
        " WHERE user_id = ?"
    };

    let count_sql = format!("SELECT COUNT(*) FROM notifications{}", where_sql);

    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(auth.user_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count notifications");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let data_sql = format!(
        r#"
        SELECT id, user_id, title, body, is_read, created_at
        FROM notifications
        {}
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let data = sqlx::query_as::<_, Notification>(&data_sql)
        .bind(auth.user_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch notifications");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(NotificationListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Mark a notification read
#[utoipa::path(
    put,
    path = "/api/v1/notification/{notification_id}/read",
    params(
        ("notification_id" = u64, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Marked read"),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn mark_read(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let notification_id = path.into_inner();

    let result = sqlx::query(
        "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?",
    )
    .bind(notification_id)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, notification_id, "Failed to mark notification read");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if result.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Notification not found"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Notification marked read"
    })))
}
