//! Attendance core: the self-service check-in/check-out state machine,
//! administrative and bulk marking, work-hour derivation and reporting.

pub mod bulk;
pub mod clock;
pub mod error;
pub mod hours;
pub mod patch;
pub mod report;
pub mod service;
pub mod store;

#[cfg(test)]
pub mod memory;
#[cfg(test)]
pub mod testing;

pub use clock::{Clock, SystemClock};
pub use error::{AttendanceError, StoreError};
pub use service::AttendanceService;
pub use store::{AttendanceStore, Directory};
