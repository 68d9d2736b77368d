use serde::{Deserialize, Serialize};

use crate::stop_times::stop_time_error::StopTimeError;

/// a single row of `stop_times.txt`: one scheduled visit of a trip to a stop.
///
/// times are held as they were written in the source file. the engines parse
/// them on demand so that a malformed value can be handled per the engine's
/// own recovery rules.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StopVisit {
    /// GTFS trip identifier, shared by every visit of the trip
    pub trip_id: String,
    /// GTFS stop identifier
    pub stop_id: String,
    /// position of this visit within the trip. unique per trip, not necessarily contiguous.
    pub stop_sequence: u32,
    pub arrival_time: String,
    pub departure_time: String,
    /// line in the source file where this record was found (the header is line 1).
    pub line_number: u64,
    /// values of all non-required columns in header order, carried through unmodified
    pub passthrough: Vec<String>,
}

impl StopVisit {
    /// a copy of this visit with replaced arrival and departure times.
    pub fn with_times(&self, arrival_time: String, departure_time: String) -> StopVisit {
        StopVisit {
            arrival_time,
            departure_time,
            ..self.clone()
        }
    }
}

/// why a record was kept from reaching the engines.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// the record's field count does not match the header
    FieldCount,
    /// stop_sequence is not a non-negative integer
    StopSequence,
}

/// a source record that could not be turned into a [`StopVisit`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub line_number: u64,
    pub kind: RejectionKind,
    pub message: String,
}

/// the column layout of a `stop_times.txt` header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimesSchema {
    pub headers: Vec<String>,
    trip_id: usize,
    arrival_time: usize,
    departure_time: usize,
    stop_id: usize,
    stop_sequence: usize,
}

/// a column of `stop_times.txt` that the engines read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequiredColumn {
    TripId,
    ArrivalTime,
    DepartureTime,
    StopId,
    StopSequence,
}

impl StopTimesSchema {
    pub const TRIP_ID: &str = "trip_id";
    pub const ARRIVAL_TIME: &str = "arrival_time";
    pub const DEPARTURE_TIME: &str = "departure_time";
    pub const STOP_ID: &str = "stop_id";
    pub const STOP_SEQUENCE: &str = "stop_sequence";

    /// locates the required columns by name. the filepath is only used for error reporting.
    pub fn new(headers: Vec<String>, filepath: &str) -> Result<StopTimesSchema, StopTimeError> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
                .ok_or_else(|| StopTimeError::MissingColumn {
                    filepath: filepath.to_string(),
                    column: column.to_string(),
                })
        };
        Ok(StopTimesSchema {
            trip_id: find(Self::TRIP_ID)?,
            arrival_time: find(Self::ARRIVAL_TIME)?,
            departure_time: find(Self::DEPARTURE_TIME)?,
            stop_id: find(Self::STOP_ID)?,
            stop_sequence: find(Self::STOP_SEQUENCE)?,
            headers,
        })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// builds a [`StopVisit`] from the fields of a record with the same arity as the header.
    ///
    /// # Result
    /// the visit, or the reason the record cannot be used.
    pub fn to_visit(&self, fields: &[&str], line_number: u64) -> Result<StopVisit, RejectedRecord> {
        if fields.len() != self.len() {
            return Err(RejectedRecord {
                line_number,
                kind: RejectionKind::FieldCount,
                message: format!("expected {} fields, found {}", self.len(), fields.len()),
            });
        }
        let raw_sequence = fields[self.stop_sequence].trim();
        let stop_sequence = raw_sequence
            .parse::<u32>()
            .map_err(|e| RejectedRecord {
                line_number,
                kind: RejectionKind::StopSequence,
                message: format!("stop_sequence '{raw_sequence}' is not a valid integer: {e}"),
            })?;
        let passthrough = fields
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.required_at(*idx).is_none())
            .map(|(_, value)| value.to_string())
            .collect();
        Ok(StopVisit {
            trip_id: fields[self.trip_id].to_string(),
            stop_id: fields[self.stop_id].to_string(),
            stop_sequence,
            arrival_time: fields[self.arrival_time].to_string(),
            departure_time: fields[self.departure_time].to_string(),
            line_number,
            passthrough,
        })
    }

    /// lays out a visit's fields in header order.
    pub fn to_fields(&self, visit: &StopVisit) -> Vec<String> {
        let mut passthrough = visit.passthrough.iter();
        (0..self.len())
            .map(|idx| match self.required_at(idx) {
                Some(RequiredColumn::TripId) => visit.trip_id.clone(),
                Some(RequiredColumn::ArrivalTime) => visit.arrival_time.clone(),
                Some(RequiredColumn::DepartureTime) => visit.departure_time.clone(),
                Some(RequiredColumn::StopId) => visit.stop_id.clone(),
                Some(RequiredColumn::StopSequence) => visit.stop_sequence.to_string(),
                None => passthrough.next().cloned().unwrap_or_default(),
            })
            .collect()
    }

    fn required_at(&self, idx: usize) -> Option<RequiredColumn> {
        match idx {
            _ if idx == self.trip_id => Some(RequiredColumn::TripId),
            _ if idx == self.arrival_time => Some(RequiredColumn::ArrivalTime),
            _ if idx == self.departure_time => Some(RequiredColumn::DepartureTime),
            _ if idx == self.stop_id => Some(RequiredColumn::StopId),
            _ if idx == self.stop_sequence => Some(RequiredColumn::StopSequence),
            _ => None,
        }
    }
}
