//! chronological consistency of GTFS `stop_times.txt` records: detecting overlapping
//! and negative-dwell stop visits, and repairing trips by hour-wrapping.
pub mod dataset_ops;
mod invalid_trip_policy;
pub mod reference_ops;
pub mod repair_ops;
mod service_time;
mod stop_time_error;
mod stop_visit;
pub mod trip_ops;
pub mod validation_ops;
pub mod validation_report;

pub use invalid_trip_policy::InvalidTripPolicy;
pub use service_time::ServiceTime;
pub use stop_time_error::StopTimeError;
pub use stop_visit::{RejectedRecord, RejectionKind, StopTimesSchema, StopVisit};
