use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Notification {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 5)]
    pub user_id: u64,

    #[schema(example = "Attendance approved")]
    pub title: String,

    #[schema(example = "Your attendance for 2026-01-05 was approved")]
    pub body: String,

    pub is_read: bool,

    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}
