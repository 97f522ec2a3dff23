use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Student {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "STU-001")]
    pub student_code: String,

    #[schema(example = "Jane")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "jane.doe@mail.com")]
    pub email: String,

    #[schema(example = "2026-Spring", nullable = true)]
    pub batch: Option<String>,

    #[schema(example = "active")]
    pub status: String,
}
