use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Task {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 10, nullable = true)]
    pub goal_id: Option<u64>,

    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = "Draft onboarding checklist")]
    pub title: String,

    #[schema(example = "in_progress")]
    pub status: String,

    #[schema(example = 50)]
    pub progress: i32,

    #[schema(example = "2026-01-10T17:30:00", value_type = String, format = "date-time", nullable = true)]
    pub completed_at: Option<NaiveDateTime>,

    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Keeps status, progress and completed_at mutually consistent on every
/// save: completed forces progress to 100 and stamps completed_at once
/// (re-saves keep the original stamp); leaving completed clears the stamp
/// and leaves progress as requested. Any status jump is allowed.
pub fn synchronize_completion(
    status: TaskStatus,
    requested_progress: i32,
    completed_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> (i32, Option<NaiveDateTime>) {
    match status {
        TaskStatus::Completed => (100, completed_at.or(Some(now))),
        _ => (requested_progress.clamp(0, 100), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn completing_forces_progress_and_stamps_time() {
        let (progress, completed_at) =
            synchronize_completion(TaskStatus::Completed, 40, None, ts(10, 17));
        assert_eq!(progress, 100);
        assert_eq!(completed_at, Some(ts(10, 17)));
    }

    #[test]
    fn resaving_completed_preserves_original_stamp() {
        let original = ts(8, 9);
        let (progress, completed_at) =
            synchronize_completion(TaskStatus::Completed, 100, Some(original), ts(10, 17));
        assert_eq!(progress, 100);
        assert_eq!(completed_at, Some(original));
    }

    #[test]
    fn direct_pending_to_completed_jump_is_allowed() {
        let (progress, completed_at) =
            synchronize_completion(TaskStatus::Completed, 0, None, ts(10, 17));
        assert_eq!(progress, 100);
        assert!(completed_at.is_some());
    }

    #[test]
    fn leaving_completed_clears_the_stamp() {
        let (progress, completed_at) =
            synchronize_completion(TaskStatus::InProgress, 100, Some(ts(8, 9)), ts(10, 17));
        // progress stays whatever the caller asked for
        assert_eq!(progress, 100);
        assert_eq!(completed_at, None);
    }

    #[test]
    fn pending_task_never_carries_a_stamp() {
        let (progress, completed_at) =
            synchronize_completion(TaskStatus::Pending, 30, None, ts(10, 17));
        assert_eq!(progress, 30);
        assert_eq!(completed_at, None);
    }

    #[test]
    fn progress_is_clamped_to_percent_range() {
        let (progress, _) = synchronize_completion(TaskStatus::InProgress, 140, None, ts(10, 17));
        assert_eq!(progress, 100);

        let (progress, _) = synchronize_completion(TaskStatus::InProgress, -10, None, ts(10, 17));
        assert_eq!(progress, 0);
    }
}
