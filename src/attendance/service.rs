use super::{
    clock::Clock,
    error::{AttendanceError, StoreError},
    hours,
    patch::AttendancePatch,
    store::{AttendanceStore, Directory},
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NaturalKey, NewAttendance};
use chrono::{NaiveDate, NaiveTime};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

pub const SELF_CHECK_IN_NOTE: &str = "Self check-in";
pub const SELF_CHECK_OUT_NOTE: &str = "Self check-out";
pub const SELF_SERVICE_LOCATION: &str = "Self-service";
pub const DEFAULT_MARK_LOCATION: &str = "Office";

pub const NOT_A_MEMBER: &str = "You are not a member of this team";
pub const NO_RECORD_TODAY: &str = "No check-in record found for today. Please check-in first.";
pub const NO_CHECK_IN_TIME: &str = "No check-in time recorded. Please check-in first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display)]
#[serde(rename_all = "kebab-case")]
pub enum SelfAction {
    #[display(fmt = "check-in")]
    CheckIn,
    #[display(fmt = "check-out")]
    CheckOut,
}

impl SelfAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "check-in" => Some(SelfAction::CheckIn),
            "check-out" => Some(SelfAction::CheckOut),
            _ => None,
        }
    }
}

/// A user checking themselves in or out of one of their teams
#[derive(Debug, Clone, Default)]
pub struct SelfService {
    pub team_id: u64,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SelfServiceOutcome {
    pub record: AttendanceRecord,
    pub action: SelfAction,
    pub time: NaiveTime,
    pub work_hours: Option<f64>,
}

/// Administrative mark of one user's day
#[derive(Debug, Clone)]
pub struct MarkAttendance {
    pub user_id: u64,
    pub team_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    pub work_hours: Option<f64>,
    pub notes: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
    /// Peer address of the HTTP request, preferred over `ip_address` on create
    pub request_ip: Option<String>,
}

pub struct AttendanceService {
    pub(super) store: Arc<dyn AttendanceStore>,
    pub(super) directory: Arc<dyn Directory>,
    pub(super) clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        directory: Arc<dyn Directory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    pub async fn self_service(
        &self,
        user_id: u64,
        action: SelfAction,
        request: SelfService,
    ) -> Result<SelfServiceOutcome, AttendanceError> {
        match action {
            SelfAction::CheckIn => self.check_in(user_id, request).await,
            SelfAction::CheckOut => self.check_out(user_id, request).await,
        }
    }

    /// Starts (or restarts) today's record as `present`. A repeated check-in
    /// only moves the check-in time.
    pub async fn check_in(
        &self,
        user_id: u64,
        request: SelfService,
    ) -> Result<SelfServiceOutcome, AttendanceError> {
        let SelfService {
            team_id,
            notes,
            location,
            ip_address,
        } = request;

        self.ensure_member(team_id, user_id).await?;

        let (date, time) = self.clock.moment();
        let key = NaturalKey::new(user_id, team_id, date);

        let create = NewAttendance {
            user_id,
            team_id,
            date,
            status: AttendanceStatus::Present,
            check_in_time: Some(time),
            check_out_time: None,
            work_hours: None,
            notes: or_default(notes.clone(), None, SELF_CHECK_IN_NOTE),
            marked_by: user_id,
            ip_address: ip_address.clone(),
            location: or_default(location.clone(), None, SELF_SERVICE_LOCATION),
        };

        let record = self
            .upsert(&key, create, move |existing| {
                // check_out_time and work_hours from an earlier check-out stay as recorded
                existing.status = AttendanceStatus::Present;
                existing.check_in_time = Some(time);
                existing.notes = or_default(notes, existing.notes.take(), SELF_CHECK_IN_NOTE);
                existing.ip_address = ip_address.or(existing.ip_address.take());
                existing.location =
                    or_default(location, existing.location.take(), SELF_SERVICE_LOCATION);
            })
            .await?;

        info!(user_id, team_id, %date, %time, record_id = record.id, "Checked in");

        Ok(SelfServiceOutcome {
            record,
            action: SelfAction::CheckIn,
            time,
            work_hours: None,
        })
    }

    /// Closes today's record, deriving work hours and status from the
    /// stored check-in time.
    pub async fn check_out(
        &self,
        user_id: u64,
        request: SelfService,
    ) -> Result<SelfServiceOutcome, AttendanceError> {
        let SelfService {
            team_id,
            notes,
            location,
            ip_address,
        } = request;

        self.ensure_member(team_id, user_id).await?;

        let (date, time) = self.clock.moment();
        let key = NaturalKey::new(user_id, team_id, date);

        let mut record = self
            .store
            .find_by_key(&key)
            .await?
            .ok_or_else(|| AttendanceError::InvalidState(NO_RECORD_TODAY.to_string()))?;

        let check_in = record
            .check_in_time
            .ok_or_else(|| AttendanceError::InvalidState(NO_CHECK_IN_TIME.to_string()))?;

        let work_hours = hours::work_hours(check_in, time);
        if work_hours < 0.0 {
            warn!(user_id, team_id, %check_in, check_out = %time, "Check-out precedes check-in");
        }

        record.check_out_time = Some(time);
        record.work_hours = Some(work_hours);
        record.status = hours::status_for_hours(work_hours);
        record.notes = or_default(notes, record.notes.take(), SELF_CHECK_OUT_NOTE);
        record.ip_address = ip_address.or(record.ip_address.take());
        record.location = or_default(location, record.location.take(), SELF_SERVICE_LOCATION);

        let record = self.store.update(&record).await?;

        info!(
            user_id,
            team_id,
            %date,
            %time,
            work_hours,
            status = %record.status,
            "Checked out"
        );

        Ok(SelfServiceOutcome {
            record,
            action: SelfAction::CheckOut,
            time,
            work_hours: Some(work_hours),
        })
    }

    /// Manager override: sets the status and whichever other fields were
    /// supplied, with no state-machine checks.
    pub async fn mark(
        &self,
        acting_user_id: u64,
        request: MarkAttendance,
    ) -> Result<AttendanceRecord, AttendanceError> {
        self.ensure_exists(request.user_id, request.team_id).await?;
        let key = NaturalKey::new(request.user_id, request.team_id, request.date);

        let create = NewAttendance {
            user_id: request.user_id,
            team_id: request.team_id,
            date: request.date,
            status: request.status,
            check_in_time: request.check_in_time,
            check_out_time: request.check_out_time,
            work_hours: request.work_hours,
            notes: request.notes.clone(),
            marked_by: acting_user_id,
            ip_address: request.request_ip.clone().or(request.ip_address.clone()),
            location: or_default(request.location.clone(), None, DEFAULT_MARK_LOCATION),
        };

        let patch = AttendancePatch {
            status: Some(request.status),
            check_in_time: request.check_in_time,
            check_out_time: request.check_out_time,
            work_hours: request.work_hours,
            notes: request.notes,
            ip_address: request.ip_address,
            location: request.location,
        };

        let record = self
            .upsert(&key, create, move |existing| patch.apply(existing))
            .await?;

        info!(
            marked_by = acting_user_id,
            user_id = key.user_id,
            team_id = key.team_id,
            date = %key.date,
            status = %record.status,
            "Attendance marked"
        );

        Ok(record)
    }

    /// Sparse update of a record by id. The reason only goes to the audit log.
    pub async fn update(
        &self,
        acting_user_id: u64,
        id: u64,
        patch: AttendancePatch,
        reason: Option<String>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let mut record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AttendanceError::not_found("Attendance record not found"))?;

        if patch.is_empty() {
            debug!(record_id = id, "Empty patch, nothing to update");
            return Ok(record);
        }

        patch.apply(&mut record);
        let record = self.store.update(&record).await?;

        info!(
            record_id = id,
            updated_by = acting_user_id,
            reason = reason.as_deref().unwrap_or("No reason provided"),
            "Attendance record updated"
        );

        Ok(record)
    }

    async fn ensure_exists(&self, user_id: u64, team_id: u64) -> Result<(), AttendanceError> {
        if self.directory.find_user(user_id).await?.is_none() {
            return Err(AttendanceError::not_found("User not found"));
        }
        if self.directory.find_team(team_id).await?.is_none() {
            return Err(AttendanceError::not_found("Team not found"));
        }
        Ok(())
    }

    async fn ensure_member(&self, team_id: u64, user_id: u64) -> Result<(), AttendanceError> {
        if self.directory.is_active_member(team_id, user_id).await? {
            Ok(())
        } else {
            Err(AttendanceError::Forbidden(NOT_A_MEMBER.to_string()))
        }
    }

    /// Find-or-create by natural key. When the insert loses a race to a
    /// concurrent writer the unique key rejects it, and the winner's row is
    /// updated instead.
    pub(super) async fn upsert<F>(
        &self,
        key: &NaturalKey,
        create: NewAttendance,
        amend: F,
    ) -> Result<AttendanceRecord, StoreError>
    where
        F: FnOnce(&mut AttendanceRecord) + Send,
    {
        if let Some(mut existing) = self.store.find_by_key(key).await? {
            amend(&mut existing);
            return self.store.update(&existing).await;
        }

        match self.store.insert(create).await {
            Err(StoreError::Conflict {
                user_id,
                team_id,
                date,
            }) => {
                debug!(user_id, team_id, %date, "Insert conflicted, retrying as update");
                let mut existing =
                    self.store
                        .find_by_key(key)
                        .await?
                        .ok_or(StoreError::Conflict {
                            user_id,
                            team_id,
                            date,
                        })?;
                amend(&mut existing);
                self.store.update(&existing).await
            }
            other => other,
        }
    }
}

/// `incoming`, else `existing`, else the fallback text
fn or_default(incoming: Option<String>, existing: Option<String>, fallback: &str) -> Option<String> {
    Some(
        incoming
            .or(existing)
            .unwrap_or_else(|| fallback.to_string()),
    )
}
