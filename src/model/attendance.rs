use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::work_settings::ShiftPolicy;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceKind {
    Present,
    Wfh,
    Leave,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1001)]
    pub employee_id: u64,

    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "present")]
    pub kind: String,

    #[schema(example = "09:45:00", value_type = String, nullable = true)]
    pub check_in: Option<NaiveTime>,

    #[schema(example = "18:00:00", value_type = String, nullable = true)]
    pub check_out: Option<NaiveTime>,

    #[schema(example = "pending")]
    pub status: String,

    pub is_late: bool,
    pub is_half_day: bool,

    #[schema(example = 45)]
    pub late_minutes: i32,
}

/// Derived lateness fields written at approval time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LatenessVerdict {
    pub is_late: bool,
    pub is_half_day: bool,
    pub late_minutes: i64,
}

/// Shift start is the check-in's calendar date at the configured time;
/// within-grace arrivals are late but not half-day, beyond-grace arrivals
/// are both. Minutes are counted from shift start either way.
pub fn evaluate_lateness(check_in: NaiveDateTime, policy: &ShiftPolicy) -> LatenessVerdict {
    let shift_start = check_in.date().and_time(policy.shift_start);
    if check_in <= shift_start {
        return LatenessVerdict::default();
    }

    let threshold = shift_start + Duration::minutes(policy.grace_minutes);
    LatenessVerdict {
        is_late: true,
        is_half_day: check_in > threshold,
        late_minutes: (check_in - shift_start).num_minutes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn policy() -> ShiftPolicy {
        ShiftPolicy::default() // 09:00 shift start, 60 minute grace
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn on_time_check_in_has_no_flags() {
        let verdict = evaluate_lateness(at(8, 30), &policy());
        assert_eq!(verdict, LatenessVerdict::default());
    }

    #[test]
    fn check_in_exactly_at_shift_start_is_not_late() {
        let verdict = evaluate_lateness(at(9, 0), &policy());
        assert!(!verdict.is_late);
        assert!(!verdict.is_half_day);
        assert_eq!(verdict.late_minutes, 0);
    }

    #[test]
    fn check_in_within_grace_is_late_but_not_half_day() {
        let verdict = evaluate_lateness(at(9, 45), &policy());
        assert!(verdict.is_late);
        assert!(!verdict.is_half_day);
        assert_eq!(verdict.late_minutes, 45);
    }

    #[test]
    fn check_in_exactly_at_grace_threshold_is_not_half_day() {
        let verdict = evaluate_lateness(at(10, 0), &policy());
        assert!(verdict.is_late);
        assert!(!verdict.is_half_day);
        assert_eq!(verdict.late_minutes, 60);
    }

    #[test]
    fn check_in_beyond_grace_is_half_day() {
        let verdict = evaluate_lateness(at(10, 30), &policy());
        assert!(verdict.is_late);
        assert!(verdict.is_half_day);
        assert_eq!(verdict.late_minutes, 90);
    }

    #[test]
    fn minutes_count_from_shift_start_not_threshold() {
        let verdict = evaluate_lateness(at(11, 15), &policy());
        assert_eq!(verdict.late_minutes, 135);
    }

    #[test]
    fn custom_policy_is_respected() {
        let custom = ShiftPolicy {
            shift_start: chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            grace_minutes: 10,
        };
        let verdict = evaluate_lateness(at(8, 11), &custom);
        assert!(verdict.is_late);
        assert!(verdict.is_half_day);
        assert_eq!(verdict.late_minutes, 11);
    }
}
