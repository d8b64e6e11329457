//! In-memory store and directory backing the service and HTTP tests.

use super::error::StoreError;
use super::store::{AttendanceFilter, AttendanceStore, Directory, RecordOrder};
use crate::model::{
    attendance::{AttendanceRecord, NaturalKey, NewAttendance},
    organization::Organization,
    team::TeamSummary,
    user::UserSummary,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

impl AttendanceFilter {
    fn matches(&self, record: &AttendanceRecord) -> bool {
        self.user_id.is_none_or(|id| record.user_id == id)
            && self.team_id.is_none_or(|id| record.team_id == id)
            && self
                .user_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&record.user_id))
            && self
                .date_range
                .is_none_or(|r| r.start <= record.date && record.date <= r.end)
            && self.status.is_none_or(|s| record.status == s)
    }
}

fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

#[derive(Default)]
struct State {
    next_id: u64,
    records: BTreeMap<u64, AttendanceRecord>,
    by_key: HashMap<NaturalKey, u64>,
}

/// Uniqueness of the natural key is checked under the same lock as the
/// insert, like a unique index would.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    failing_users: Mutex<HashSet<u64>>,
    inserts: Mutex<u32>,
    /// Key to plant right before the next insert, simulating a racing writer
    race: Mutex<Option<NewAttendance>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write touching `user_id` fails with [`StoreError::Unavailable`]
    pub fn fail_writes_for(&self, user_id: u64) {
        self.failing_users.lock().unwrap().insert(user_id);
    }

    /// The next insert loses a race against `record`
    pub fn race_next_insert_with(&self, record: NewAttendance) {
        *self.race.lock().unwrap() = Some(record);
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn insert_attempts(&self) -> u32 {
        *self.inserts.lock().unwrap()
    }

    pub fn all(&self) -> Vec<AttendanceRecord> {
        self.state.lock().unwrap().records.values().cloned().collect()
    }

    fn check_writable(&self, user_id: u64) -> Result<(), StoreError> {
        if self.failing_users.lock().unwrap().contains(&user_id) {
            return Err(StoreError::Unavailable(format!(
                "write rejected for user {user_id}"
            )));
        }
        Ok(())
    }

    fn put(state: &mut State, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let key = record.key();
        if state.by_key.contains_key(&key) {
            return Err(StoreError::Conflict {
                user_id: key.user_id,
                team_id: key.team_id,
                date: key.date,
            });
        }
        state.next_id += 1;
        let stored = AttendanceRecord {
            id: state.next_id,
            user_id: record.user_id,
            team_id: record.team_id,
            date: record.date,
            status: record.status,
            check_in_time: record.check_in_time,
            check_out_time: record.check_out_time,
            work_hours: record.work_hours,
            notes: record.notes,
            marked_by: record.marked_by,
            ip_address: record.ip_address,
            location: record.location,
            created_at: stamp(),
            updated_at: stamp(),
        };
        state.by_key.insert(key, stored.id);
        state.records.insert(stored.id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_by_key(&self, key: &NaturalKey) -> Result<Option<AttendanceRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .by_key
            .get(key)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self.state.lock().unwrap().records.get(&id).cloned())
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        self.check_writable(record.user_id)?;
        *self.inserts.lock().unwrap() += 1;

        let mut state = self.state.lock().unwrap();
        if let Some(winner) = self.race.lock().unwrap().take() {
            Self::put(&mut state, winner)?;
        }
        Self::put(&mut state, record)
    }

    async fn update(&self, record: &AttendanceRecord) -> Result<AttendanceRecord, StoreError> {
        self.check_writable(record.user_id)?;

        let mut state = self.state.lock().unwrap();
        let stored = state
            .records
            .get_mut(&record.id)
            .ok_or(StoreError::Missing(record.id))?;
        *stored = record.clone();
        Ok(stored.clone())
    }

    async fn query(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut records: Vec<_> = state
            .records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        match filter.order {
            RecordOrder::DateDesc => records.sort_by(|a, b| b.date.cmp(&a.date)),
            RecordOrder::DateDescUserAsc => records.sort_by(|a, b| {
                b.date.cmp(&a.date).then(a.user_id.cmp(&b.user_id))
            }),
            RecordOrder::DateAsc => records.sort_by(|a, b| a.date.cmp(&b.date)),
        }
        Ok(records)
    }
}

#[derive(Default)]
pub struct MemoryDirectory {
    teams: HashMap<u64, (TeamSummary, u64)>,
    users: HashMap<u64, UserSummary>,
    organizations: HashMap<u64, Organization>,
    /// (team, user) -> active
    memberships: HashMap<(u64, u64), bool>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_organization(mut self, id: u64, name: &str) -> Self {
        self.organizations.insert(
            id,
            Organization {
                id,
                name: name.to_string(),
                description: None,
                address: None,
                phone: None,
                email: None,
                website: None,
                status: "active".to_string(),
            },
        );
        self
    }

    pub fn with_team(mut self, id: u64, name: &str, organization_id: u64) -> Self {
        let team = TeamSummary {
            id,
            name: name.to_string(),
            color: Some("#3B82F6".to_string()),
        };
        self.teams.insert(id, (team, organization_id));
        self
    }

    pub fn with_user(mut self, id: u64, name: &str) -> Self {
        let email = format!("{}@attendance.com", name.to_lowercase().replace(' ', "."));
        self.users.insert(
            id,
            UserSummary {
                id,
                name: name.to_string(),
                email,
            },
        );
        self
    }

    pub fn with_member(mut self, team_id: u64, user_id: u64) -> Self {
        self.memberships.insert((team_id, user_id), true);
        self
    }

    pub fn with_inactive_member(mut self, team_id: u64, user_id: u64) -> Self {
        self.memberships.insert((team_id, user_id), false);
        self
    }

    fn member_ids(&self, teams: impl Fn(u64) -> bool) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .memberships
            .keys()
            .filter(|(team_id, _)| teams(*team_id))
            .map(|(_, user_id)| *user_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn is_active_member(&self, team_id: u64, user_id: u64) -> Result<bool, StoreError> {
        Ok(self
            .memberships
            .get(&(team_id, user_id))
            .copied()
            .unwrap_or(false))
    }

    async fn find_team(&self, team_id: u64) -> Result<Option<TeamSummary>, StoreError> {
        Ok(self.teams.get(&team_id).map(|(team, _)| team.clone()))
    }

    async fn find_user(&self, user_id: u64) -> Result<Option<UserSummary>, StoreError> {
        Ok(self.users.get(&user_id).cloned())
    }

    async fn find_organization(&self, org_id: u64) -> Result<Option<Organization>, StoreError> {
        Ok(self.organizations.get(&org_id).cloned())
    }

    async fn team_member_ids(&self, team_id: u64) -> Result<Vec<u64>, StoreError> {
        Ok(self.member_ids(|t| t == team_id))
    }

    async fn organization_member_ids(&self, org_id: u64) -> Result<Vec<u64>, StoreError> {
        Ok(self.member_ids(|t| {
            self.teams
                .get(&t)
                .is_some_and(|(_, organization_id)| *organization_id == org_id)
        }))
    }

    async fn user_names(&self, user_ids: &[u64]) -> Result<Vec<UserSummary>, StoreError> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.users.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use chrono::Datelike;

    fn new_record(user_id: u64, day: u32) -> NewAttendance {
        NewAttendance {
            user_id,
            team_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            status: AttendanceStatus::Present,
            check_in_time: None,
            check_out_time: None,
            work_hours: None,
            notes: None,
            marked_by: user_id,
            ip_address: None,
            location: None,
        }
    }

    #[actix_web::test]
    async fn insert_rejects_duplicate_natural_key() {
        let store = MemoryStore::new();
        store.insert(new_record(1, 5)).await.unwrap();

        let err = store.insert(new_record(1, 5)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { user_id: 1, team_id: 1, .. }));
        assert_eq!(store.len(), 1);
    }

    #[actix_web::test]
    async fn query_filters_and_orders() {
        let store = MemoryStore::new();
        store.insert(new_record(2, 5)).await.unwrap();
        store.insert(new_record(1, 5)).await.unwrap();
        store.insert(new_record(1, 7)).await.unwrap();

        let filter = AttendanceFilter {
            order: RecordOrder::DateDescUserAsc,
            ..Default::default()
        };
        let all = store.query(&filter).await.unwrap();
        let order: Vec<_> = all.iter().map(|r| (r.date.day(), r.user_id)).collect();
        assert_eq!(order, vec![(7, 1), (5, 1), (5, 2)]);

        let only_none = AttendanceFilter {
            user_ids: Some(vec![]),
            ..Default::default()
        };
        assert!(store.query(&only_none).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn organization_members_span_its_teams() {
        let directory = MemoryDirectory::new()
            .with_organization(1, "Sample Organization")
            .with_team(10, "Development Team", 1)
            .with_team(11, "Marketing Team", 1)
            .with_team(20, "Elsewhere", 2)
            .with_member(10, 1)
            .with_member(11, 2)
            .with_member(11, 1)
            .with_member(20, 3);

        assert_eq!(directory.organization_member_ids(1).await.unwrap(), vec![1, 2]);
        assert_eq!(directory.team_member_ids(20).await.unwrap(), vec![3]);
    }
}
