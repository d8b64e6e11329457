use super::{
    error::AttendanceError,
    service::{AttendanceService, MarkAttendance},
};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;

/// One line of a bulk request, decoded from its raw JSON on its own
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkEntry {
    pub user_id: Option<u64>,
    pub status: Option<String>,
    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub check_in_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "17:00:00")]
    pub check_out_time: Option<NaiveTime>,
    pub work_hours: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkMarkRequest {
    pub team_id: u64,
    #[schema(value_type = String, example = "2026-01-05")]
    pub date: NaiveDate,
    /// Kept as raw JSON so a malformed entry only fails itself
    #[serde(alias = "attendanceData")]
    #[schema(value_type = Vec<BulkEntry>)]
    pub entries: Vec<Value>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkError {
    pub user_id: Option<u64>,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BulkSummary {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkOutcome {
    pub results: Vec<AttendanceRecord>,
    pub errors: Vec<BulkError>,
    pub summary: BulkSummary,
}

impl AttendanceService {
    /// Marks every entry for one team and date. Entries run in request
    /// order and each one commits on its own; a failing entry is reported
    /// in `errors` and never stops the batch.
    pub async fn mark_bulk(
        &self,
        acting_user_id: u64,
        request_ip: Option<String>,
        request: BulkMarkRequest,
    ) -> BulkOutcome {
        let BulkMarkRequest {
            team_id,
            date,
            entries,
            ip_address,
            location,
        } = request;

        let total = entries.len();
        let mut results = Vec::with_capacity(total);
        let mut errors = Vec::new();

        for raw in entries {
            let user_id = raw.get("userId").and_then(Value::as_u64);
            let marked = match validate(raw) {
                Ok((user_id, status, entry)) => {
                    let mark = MarkAttendance {
                        user_id,
                        team_id,
                        date,
                        status,
                        check_in_time: entry.check_in_time,
                        check_out_time: entry.check_out_time,
                        work_hours: entry.work_hours,
                        notes: entry.notes,
                        ip_address: ip_address.clone(),
                        location: location.clone(),
                        request_ip: request_ip.clone(),
                    };
                    self.mark(acting_user_id, mark).await
                }
                Err(e) => Err(e),
            };

            match marked {
                Ok(record) => results.push(record),
                Err(e) => {
                    warn!(?user_id, team_id, %date, error = %e, "Bulk entry failed");
                    errors.push(BulkError {
                        user_id,
                        error: entry_message(&e),
                    });
                }
            }
        }

        let summary = BulkSummary {
            successful: results.len(),
            failed: errors.len(),
            total,
        };

        info!(
            marked_by = acting_user_id,
            team_id,
            %date,
            successful = summary.successful,
            failed = summary.failed,
            "Bulk attendance marked"
        );

        BulkOutcome {
            results,
            errors,
            summary,
        }
    }
}

fn validate(raw: Value) -> Result<(u64, AttendanceStatus, BulkEntry), AttendanceError> {
    let entry: BulkEntry = serde_json::from_value(raw)
        .map_err(|e| AttendanceError::validation(format!("Invalid entry: {e}")))?;

    let user_id = entry
        .user_id
        .ok_or_else(|| AttendanceError::validation("userId is required"))?;

    let status = match entry.status.as_deref() {
        None => return Err(AttendanceError::validation("status is required")),
        Some(raw) => AttendanceStatus::parse(raw).ok_or_else(|| {
            AttendanceError::validation(format!(
                "Invalid status '{raw}'. Allowed values: {}",
                AttendanceStatus::allowed()
            ))
        })?,
    };

    Ok((user_id, status, entry))
}

fn entry_message(error: &AttendanceError) -> String {
    match error {
        AttendanceError::Persistence(_) => "Failed to save attendance record".to_string(),
        other => other.to_string(),
    }
}
