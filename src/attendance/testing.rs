//! Shared fixture: one organization with two teams, a third team in a
//! second organization, four users, and a clock pinned to 2026-01-05 09:00.

use super::clock::FixedClock;
use super::memory::{MemoryDirectory, MemoryStore};
use super::service::AttendanceService;
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;
pub const CAROL: u64 = 3;
pub const DAVE: u64 = 4;
pub const MANAGER: u64 = 9;

pub const DEV_TEAM: u64 = 1;
pub const MARKETING_TEAM: u64 = 2;
pub const OTHER_ORG_TEAM: u64 = 3;

pub const ORG: u64 = 1;
pub const OTHER_ORG: u64 = 2;

pub struct Harness {
    pub service: AttendanceService,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
}

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

pub fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

pub fn time(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap()
}

pub fn directory() -> MemoryDirectory {
    MemoryDirectory::new()
        .with_organization(ORG, "Sample Organization")
        .with_organization(OTHER_ORG, "Other Organization")
        .with_team(DEV_TEAM, "Development Team", ORG)
        .with_team(MARKETING_TEAM, "Marketing Team", ORG)
        .with_team(OTHER_ORG_TEAM, "Remote Team", OTHER_ORG)
        .with_user(ALICE, "Alice")
        .with_user(BOB, "Bob")
        .with_user(CAROL, "Carol")
        .with_user(DAVE, "Dave")
        .with_user(MANAGER, "Morgan")
        .with_member(DEV_TEAM, ALICE)
        .with_member(DEV_TEAM, BOB)
        .with_member(MARKETING_TEAM, CAROL)
        .with_inactive_member(DEV_TEAM, DAVE)
        .with_member(OTHER_ORG_TEAM, DAVE)
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(day(), 9, 0, 0));
    let service = AttendanceService::new(store.clone(), Arc::new(directory()), clock.clone());
    Harness {
        service,
        store,
        clock,
    }
}
