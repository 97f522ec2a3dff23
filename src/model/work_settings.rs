use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_SHIFT_START: &str = "09:00";
pub const DEFAULT_GRACE_MINUTES: i32 = 60;
pub const DEFAULT_WEEKLY_OFF_DAYS: &str = "Sat,Sun";

/// Singleton configuration row (id = 1).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct WorkSettings {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "09:00")]
    pub shift_start: String,

    #[schema(example = 60)]
    pub grace_minutes: i32,

    #[schema(example = "Sat,Sun")]
    pub weekly_off_days: String,

    #[schema(example = "2026-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkSettings {
    /// In-code fallback when the singleton row has never been written.
    pub fn fallback() -> Self {
        WorkSettings {
            id: 1,
            shift_start: DEFAULT_SHIFT_START.to_string(),
            grace_minutes: DEFAULT_GRACE_MINUTES,
            weekly_off_days: DEFAULT_WEEKLY_OFF_DAYS.to_string(),
            updated_at: None,
        }
    }
}

/// Resolved shift configuration handed to the lateness calculator.
/// Routes build this from `WorkSettings` and pass it in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftPolicy {
    pub shift_start: NaiveTime,
    pub grace_minutes: i64,
}

impl Default for ShiftPolicy {
    fn default() -> Self {
        ShiftPolicy {
            shift_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            grace_minutes: DEFAULT_GRACE_MINUTES as i64,
        }
    }
}

impl ShiftPolicy {
    /// A malformed `shift_start` string falls back to the default policy
    /// rather than failing approval.
    pub fn from_settings(settings: &WorkSettings) -> Self {
        let shift_start = NaiveTime::parse_from_str(&settings.shift_start, "%H:%M")
            .unwrap_or_else(|_| ShiftPolicy::default().shift_start);
        ShiftPolicy {
            shift_start,
            grace_minutes: settings.grace_minutes.max(0) as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_configured_shift_start() {
        let mut settings = WorkSettings::fallback();
        settings.shift_start = "10:30".to_string();
        settings.grace_minutes = 15;

        let policy = ShiftPolicy::from_settings(&settings);
        assert_eq!(policy.shift_start, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
        assert_eq!(policy.grace_minutes, 15);
    }

    #[test]
    fn malformed_shift_start_falls_back_to_default() {
        let mut settings = WorkSettings::fallback();
        settings.shift_start = "not-a-time".to_string();

        let policy = ShiftPolicy::from_settings(&settings);
        assert_eq!(policy.shift_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn negative_grace_is_clamped_to_zero() {
        let mut settings = WorkSettings::fallback();
        settings.grace_minutes = -5;

        let policy = ShiftPolicy::from_settings(&settings);
        assert_eq!(policy.grace_minutes, 0);
    }
}
