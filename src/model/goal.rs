use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Goal {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = "Ship Q1 onboarding revamp")]
    pub title: String,

    #[schema(nullable = true)]
    pub description: Option<String>,

    #[schema(example = "2026-03-31", value_type = String, format = "date", nullable = true)]
    pub due_date: Option<NaiveDate>,

    #[schema(example = "in_progress")]
    pub status: String,

    #[schema(example = 75)]
    pub progress: i32,

    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct GoalRollup {
    pub progress: i32,
    pub status: GoalStatus,
}

/// Progress is the rounded mean of the tasks' percentages. With no tasks
/// left the goal resets to 0 and a completed goal demotes to in-progress.
/// Auto-transitions are one-directional: 100 promotes to completed, and a
/// not-started goal with any progress moves to in-progress. Recomputing
/// over unchanged inputs yields the same result.
pub fn rollup_progress(current: GoalStatus, task_progress: &[i32]) -> GoalRollup {
    if task_progress.is_empty() {
        let status = if current == GoalStatus::Completed {
            GoalStatus::InProgress
        } else {
            current
        };
        return GoalRollup { progress: 0, status };
    }

    let sum: i64 = task_progress.iter().map(|p| i64::from(*p)).sum();
    let progress = (sum as f64 / task_progress.len() as f64).round() as i32;

    let status = if progress >= 100 {
        GoalStatus::Completed
    } else if progress > 0 && current == GoalStatus::NotStarted {
        GoalStatus::InProgress
    } else {
        current
    };

    GoalRollup { progress, status }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_tasks_yield_zero_progress() {
        let rollup = rollup_progress(GoalStatus::InProgress, &[]);
        assert_eq!(rollup.progress, 0);
        assert_eq!(rollup.status, GoalStatus::InProgress);
    }

    #[test]
    fn completed_goal_demotes_when_last_task_is_detached() {
        let rollup = rollup_progress(GoalStatus::Completed, &[]);
        assert_eq!(rollup.progress, 0);
        assert_eq!(rollup.status, GoalStatus::InProgress);
    }

    #[test]
    fn progress_is_rounded_mean() {
        let rollup = rollup_progress(GoalStatus::InProgress, &[50, 100]);
        assert_eq!(rollup.progress, 75);

        let rollup = rollup_progress(GoalStatus::InProgress, &[33, 33, 34]);
        assert_eq!(rollup.progress, 33);
    }

    #[test]
    fn full_progress_promotes_to_completed() {
        let rollup = rollup_progress(GoalStatus::InProgress, &[100, 100]);
        assert_eq!(rollup.progress, 100);
        assert_eq!(rollup.status, GoalStatus::Completed);
    }

    #[test]
    fn any_progress_moves_not_started_to_in_progress() {
        let rollup = rollup_progress(GoalStatus::NotStarted, &[10, 0]);
        assert_eq!(rollup.progress, 5);
        assert_eq!(rollup.status, GoalStatus::InProgress);
    }

    #[test]
    fn all_zero_tasks_leave_not_started_alone() {
        let rollup = rollup_progress(GoalStatus::NotStarted, &[0, 0]);
        assert_eq!(rollup.progress, 0);
        assert_eq!(rollup.status, GoalStatus::NotStarted);
    }

    #[test]
    fn partial_progress_does_not_demote_completed() {
        // one-directional convenience: demoting only happens on an empty set
        let rollup = rollup_progress(GoalStatus::Completed, &[50]);
        assert_eq!(rollup.progress, 50);
        assert_eq!(rollup.status, GoalStatus::Completed);
    }

    #[test]
    fn rollup_is_idempotent() {
        let first = rollup_progress(GoalStatus::NotStarted, &[50, 100]);
        let second = rollup_progress(first.status, &[50, 100]);
        assert_eq!(first.progress, second.progress);
        assert_eq!(first.status, second.status);
    }
}
