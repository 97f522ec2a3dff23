use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum EnrollmentStatus {
    Ongoing,
    Completed,
    Dropped,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CourseEnrollment {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 2001)]
    pub student_id: u64,

    #[schema(example = 42)]
    pub course_id: u64,

    #[schema(example = "ongoing")]
    pub status: String,

    #[schema(example = "2026-01-05T10:00:00", value_type = String, format = "date-time")]
    pub enrolled_at: NaiveDateTime,
}

/// From a student's duplicate ongoing enrollments, the most recently
/// enrolled row survives; ties fall to the highest id (latest insert).
/// The rest get deactivated by the repair routine.
pub fn pick_duplicate_survivor(rows: &[(u64, NaiveDateTime)]) -> Option<u64> {
    rows.iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn most_recent_enrollment_survives() {
        let rows = vec![(1, ts(3)), (2, ts(9)), (3, ts(5))];
        assert_eq!(pick_duplicate_survivor(&rows), Some(2));
    }

    #[test]
    fn ties_fall_to_highest_id() {
        let rows = vec![(7, ts(4)), (9, ts(4)), (8, ts(4))];
        assert_eq!(pick_duplicate_survivor(&rows), Some(9));
    }

    #[test]
    fn empty_set_has_no_survivor() {
        assert_eq!(pick_duplicate_survivor(&[]), None);
    }
}
