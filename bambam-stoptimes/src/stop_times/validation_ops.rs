use std::collections::BTreeSet;

use serde::Serialize;

use crate::stop_times::{trip_ops, ServiceTime, StopVisit};

/// a stop visit with parsed times, as seen by the time checks.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedVisit {
    pub stop_sequence: u32,
    pub arrival: ServiceTime,
    pub departure: ServiceTime,
    pub line_number: u64,
}

/// a record skipped by validation because one of its times could not be parsed.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MalformedTimeRecord {
    pub trip_id: String,
    pub stop_sequence: u32,
    pub line_number: u64,
    pub arrival_time: String,
    pub departure_time: String,
    pub error: String,
}

/// a pair of consecutive visits where the vehicle departs the first stop after
/// arriving at the second.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub line_number: u64,
    pub next_line_number: u64,
    pub stop_sequence: u32,
    pub next_stop_sequence: u32,
    pub departure: ServiceTime,
    pub next_arrival: ServiceTime,
}

/// parses the times of one trip's visits and returns them ordered by stop_sequence.
///
/// visits with a malformed arrival or departure are left out of the result and
/// reported separately; the rest of the trip is still checked.
pub fn parse_trip(
    trip_id: &str,
    visits: &[&StopVisit],
) -> (Vec<TimedVisit>, Vec<MalformedTimeRecord>) {
    let mut timed = Vec::with_capacity(visits.len());
    let mut malformed = vec![];
    for visit in visits.iter() {
        let parsed = ServiceTime::parse(&visit.arrival_time).and_then(|arrival| {
            ServiceTime::parse(&visit.departure_time).map(|departure| (arrival, departure))
        });
        match parsed {
            Ok((arrival, departure)) => timed.push(TimedVisit {
                stop_sequence: visit.stop_sequence,
                arrival,
                departure,
                line_number: visit.line_number,
            }),
            Err(e) => {
                log::warn!(
                    "Error in trip_id: {trip_id}, stop_sequence: {}, line_number: {}, arrival_time: {}, departure_time: {}: {e}",
                    visit.stop_sequence,
                    visit.line_number,
                    visit.arrival_time,
                    visit.departure_time
                );
                malformed.push(MalformedTimeRecord {
                    trip_id: trip_id.to_string(),
                    stop_sequence: visit.stop_sequence,
                    line_number: visit.line_number,
                    arrival_time: visit.arrival_time.clone(),
                    departure_time: visit.departure_time.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    trip_ops::sort_by_sequence(&mut timed, |v| v.stop_sequence);
    (timed, malformed)
}

/// finds every overlap between visits with adjacent stop_sequence values.
///
/// only pairs whose sequence numbers differ by exactly one are compared, so a gap
/// in the numbering hides any overlap across it. a departure equal to the next
/// arrival is not an overlap.
///
/// `visits` must be sorted by stop_sequence.
pub fn find_overlap_pairs(visits: &[TimedVisit]) -> Vec<Overlap> {
    visits
        .windows(2)
        .filter_map(|pair| {
            let (current, next) = (&pair[0], &pair[1]);
            let adjacent = current.stop_sequence.checked_add(1) == Some(next.stop_sequence);
            if adjacent && current.departure > next.arrival {
                Some(Overlap {
                    line_number: current.line_number,
                    next_line_number: next.line_number,
                    stop_sequence: current.stop_sequence,
                    next_stop_sequence: next.stop_sequence,
                    departure: current.departure,
                    next_arrival: next.arrival,
                })
            } else {
                None
            }
        })
        .collect()
}

/// the line numbers of all visits involved in an overlap, each reported once.
pub fn find_overlaps(visits: &[TimedVisit]) -> BTreeSet<u64> {
    find_overlap_pairs(visits)
        .into_iter()
        .flat_map(|o| [o.line_number, o.next_line_number])
        .collect()
}

/// the line numbers of all visits that depart before they arrive.
pub fn find_negative_dwell(visits: &[TimedVisit]) -> BTreeSet<u64> {
    visits
        .iter()
        .filter(|v| v.arrival > v.departure)
        .map(|v| v.line_number)
        .collect()
}
