//! Persistence and directory seams of the attendance core.
//!
//! The MySQL implementations live in `crate::db`; tests run against the
//! in-memory ones in `attendance::memory`.

use super::error::StoreError;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, NaturalKey, NewAttendance},
    organization::Organization,
    team::TeamSummary,
    user::UserSummary,
};
use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrder {
    #[default]
    DateDesc,
    DateDescUserAsc,
    DateAsc,
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// A range only applies when both bounds are given
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        match (start, end) {
            (Some(start), Some(end)) => Some(Self { start, end }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceFilter {
    pub user_id: Option<u64>,
    pub team_id: Option<u64>,
    /// Restrict to these users; an empty list matches nothing
    pub user_ids: Option<Vec<u64>>,
    pub date_range: Option<DateRange>,
    pub status: Option<AttendanceStatus>,
    pub order: RecordOrder,
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_by_key(&self, key: &NaturalKey) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Must fail with [`StoreError::Conflict`] when a record with the same
    /// natural key already exists.
    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    /// Persists every mutable column of `record`, keyed by its id.
    async fn update(&self, record: &AttendanceRecord) -> Result<AttendanceRecord, StoreError>;

    async fn query(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError>;
}

/// Organization, team and membership lookups owned by the admin side
#[async_trait]
pub trait Directory: Send + Sync {
    async fn is_active_member(&self, team_id: u64, user_id: u64) -> Result<bool, StoreError>;

    async fn find_team(&self, team_id: u64) -> Result<Option<TeamSummary>, StoreError>;

    async fn find_user(&self, user_id: u64) -> Result<Option<UserSummary>, StoreError>;

    async fn find_organization(&self, org_id: u64) -> Result<Option<Organization>, StoreError>;

    async fn team_member_ids(&self, team_id: u64) -> Result<Vec<u64>, StoreError>;

    /// Members of any team of the organization
    async fn organization_member_ids(&self, org_id: u64) -> Result<Vec<u64>, StoreError>;

    async fn user_names(&self, user_ids: &[u64]) -> Result<Vec<UserSummary>, StoreError>;
}
