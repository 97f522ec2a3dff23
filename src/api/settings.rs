use crate::auth::auth::AuthUser;
use crate::model::work_settings::WorkSettings;
use crate::utils::settings_cache;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveTime;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateWorkSettings {
    #[schema(example = "09:30")]
    pub shift_start: Option<String>,
    #[schema(example = 30)]
    pub grace_minutes: Option<i32>,
    #[schema(example = "Fri,Sat")]
    pub weekly_off_days: Option<String>,
}

/// Get work settings (falls back to defaults when unset)
#[utoipa::path(
    get,
    path = "/api/v1/settings/work",
    responses(
        (status = 200, description = "Current work settings", body = WorkSettings),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_work_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_employee_or_admin()?;

    let settings = settings_cache::resolve(pool.get_ref()).await;
    Ok(HttpResponse::Ok().json(settings))
}

/// Update work settings (Admin)
#[utoipa::path(
    put,
    path = "/api/v1/settings/work",
    request_body = UpdateWorkSettings,
    responses(
        (status = 200, description = "Updated settings", body = WorkSettings),
        (status = 400, description = "Invalid shift_start or grace_minutes"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_work_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<UpdateWorkSettings>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    // Start from the current (or default) row and overlay the payload
    let current = settings_cache::resolve(pool.get_ref()).await;

    let shift_start = body.shift_start.clone().unwrap_or(current.shift_start);
    if NaiveTime::parse_from_str(&shift_start, "%H:%M").is_err() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "shift_start must be HH:mm"
        })));
    }

    let grace_minutes = body.grace_minutes.unwrap_or(current.grace_minutes);
    if grace_minutes < 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "grace_minutes must not be negative"
        })));
    }

    let weekly_off_days = body
        .weekly_off_days
        .clone()
        .unwrap_or(current.weekly_off_days);

    sqlx::query(
        r#"
        INSERT INTO work_settings (id, shift_start, grace_minutes, weekly_off_days)
        VALUES (1, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            shift_start = VALUES(shift_start),
            grace_minutes = VALUES(grace_minutes),
            weekly_off_days = VALUES(weekly_off_days)
        "#,
    )
    .bind(&shift_start)
    .bind(grace_minutes)
    .bind(&weekly_off_days)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to update work settings");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    settings_cache::invalidate().await;

    let settings = settings_cache::resolve(pool.get_ref()).await;
    Ok(HttpResponse::Ok().json(settings))
}
