use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Leave,
    HalfDay,
}

impl AttendanceStatus {
    pub fn parse(value: &str) -> Option<Self> {
        Self::from_str(value.trim()).ok()
    }

    /// Comma separated list used in validation messages
    pub fn allowed() -> String {
        Self::iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// (user, team, date). At most one record exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub user_id: u64,
    pub team_id: u64,
    pub date: NaiveDate,
}

impl NaturalKey {
    pub fn new(user_id: u64, team_id: u64, date: NaiveDate) -> Self {
        Self {
            user_id,
            team_id,
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "userId": 7,
    "teamId": 2,
    "date": "2026-01-05",
    "status": "present",
    "checkInTime": "09:00:00",
    "checkOutTime": "13:00:00",
    "workHours": 4.0,
    "notes": "Self check-in",
    "markedBy": 7,
    "ipAddress": "10.0.0.12",
    "location": "Self-service",
    "createdAt": "2026-01-05T09:00:00",
    "updatedAt": "2026-01-05T13:00:00"
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    pub team_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub check_in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:30:00")]
    pub check_out_time: Option<NaiveTime>,
    pub work_hours: Option<f64>,
    pub notes: Option<String>,
    pub marked_by: u64,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl AttendanceRecord {
    pub fn key(&self) -> NaturalKey {
        NaturalKey::new(self.user_id, self.team_id, self.date)
    }
}

/// Insert payload; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub user_id: u64,
    pub team_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    pub work_hours: Option<f64>,
    pub notes: Option<String>,
    pub marked_by: u64,
    pub ip_address: Option<String>,
    pub location: Option<String>,
}

impl NewAttendance {
    pub fn key(&self) -> NaturalKey {
        NaturalKey::new(self.user_id, self.team_id, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_snake_case_names() {
        assert_eq!(
            AttendanceStatus::parse("half_day"),
            Some(AttendanceStatus::HalfDay)
        );
        assert_eq!(
            AttendanceStatus::parse(" present "),
            Some(AttendanceStatus::Present)
        );
        assert_eq!(AttendanceStatus::parse("invalid-status"), None);
        assert_eq!(AttendanceStatus::parse("Present"), None);
    }

    #[test]
    fn status_serializes_like_the_stored_column() {
        assert_eq!(AttendanceStatus::HalfDay.to_string(), "half_day");
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::Late).unwrap(),
            "\"late\""
        );
        assert_eq!(
            AttendanceStatus::allowed(),
            "present, absent, late, leave, half_day"
        );
    }
}
