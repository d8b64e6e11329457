use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use chrono::NaiveTime;

/// Sparse update of an attendance record.
///
/// A `Some` field overwrites the stored value, `None` keeps it. Zero hours
/// and empty notes are values like any other and do overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendancePatch {
    pub status: Option<AttendanceStatus>,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
    pub work_hours: Option<f64>,
    pub notes: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<String>,
}

impl AttendancePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, record: &mut AttendanceRecord) {
        merge(&mut record.status, self.status);
        merge_opt(&mut record.check_in_time, self.check_in_time);
        merge_opt(&mut record.check_out_time, self.check_out_time);
        merge_opt(&mut record.work_hours, self.work_hours);
        merge_opt(&mut record.notes, self.notes);
        merge_opt(&mut record.ip_address, self.ip_address);
        merge_opt(&mut record.location, self.location);
    }
}

fn merge<T>(slot: &mut T, incoming: Option<T>) {
    if let Some(value) = incoming {
        *slot = value;
    }
}

fn merge_opt<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}
