use std::collections::{BTreeSet, HashSet};
use std::fmt::Display;

use itertools::Itertools;
use kdam::tqdm;
use serde::Serialize;

use crate::stop_times::{
    dataset_ops::StopTimesDataset,
    reference_ops::{self, OrphanedReference},
    trip_ops,
    validation_ops::{self, MalformedTimeRecord, Overlap},
    RejectedRecord,
};

/// time-check findings for a single trip.
#[derive(Serialize, Debug, Clone, Default)]
pub struct TripFindings {
    pub trip_id: String,
    /// line numbers of visits involved in an overlap
    pub overlap_lines: BTreeSet<u64>,
    pub overlaps: Vec<Overlap>,
    /// line numbers of visits that depart before they arrive
    pub negative_dwell_lines: BTreeSet<u64>,
}

impl TripFindings {
    pub fn is_valid(&self) -> bool {
        self.overlap_lines.is_empty() && self.negative_dwell_lines.is_empty()
    }
}

/// dataset-level counts over all checks.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub total_trips: usize,
    /// trips with neither an overlap nor a negative dwell
    pub valid_trips: usize,
    pub trips_with_overlap: usize,
    pub trips_with_negative_dwell: usize,
    pub orphaned_trip_references: usize,
    pub orphaned_stop_references: usize,
    /// records with malformed times, left out of the time checks
    pub skipped_records: usize,
    /// records rejected by the structural pass
    pub rejected_records: usize,
    pub structurally_valid: bool,
    /// true if no trip reference set was available
    pub trip_check_skipped: bool,
    /// true if no stop reference set was available
    pub stop_check_skipped: bool,
}

impl Display for ValidationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let orphan_line = |count: usize, skipped: bool| {
            if skipped {
                String::from("skipped (no reference data)")
            } else {
                count.to_string()
            }
        };
        writeln!(f, "Summary:")?;
        writeln!(f, "  Total trips: {}", self.total_trips)?;
        writeln!(f, "  Valid trips: {}", self.valid_trips)?;
        writeln!(f, "  Trips with overlap: {}", self.trips_with_overlap)?;
        writeln!(
            f,
            "  Trips with departure before arrival: {}",
            self.trips_with_negative_dwell
        )?;
        writeln!(
            f,
            "  Orphaned trip references: {}",
            orphan_line(self.orphaned_trip_references, self.trip_check_skipped)
        )?;
        writeln!(
            f,
            "  Orphaned stop references: {}",
            orphan_line(self.orphaned_stop_references, self.stop_check_skipped)
        )?;
        writeln!(f, "  Records skipped (malformed time): {}", self.skipped_records)?;
        writeln!(f, "  Records rejected (malformed record): {}", self.rejected_records)?;
        write!(f, "  Structurally valid: {}", self.structurally_valid)
    }
}

/// everything found by one validation pass over a dataset.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ValidationReport {
    /// findings for each trip, in sorted trip_id order
    pub trips: Vec<TripFindings>,
    pub orphaned_trips: Vec<OrphanedReference>,
    pub orphaned_stops: Vec<OrphanedReference>,
    pub malformed: Vec<MalformedTimeRecord>,
    pub rejected: Vec<RejectedRecord>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// one human-readable line per violation found, in trip order.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines = vec![];
        for trip in self.trips.iter() {
            for o in trip.overlaps.iter() {
                lines.push(format!(
                    "  Overlap at lines {} and {}: stop_sequence {}->{}, departure={}, next_arrival={}",
                    o.line_number,
                    o.next_line_number,
                    o.stop_sequence,
                    o.next_stop_sequence,
                    o.departure,
                    o.next_arrival
                ));
            }
            if !trip.overlap_lines.is_empty() {
                lines.push(format!(
                    "OVERLAP DETECTED in trip_id: {} at line(s): {}",
                    trip.trip_id,
                    trip.overlap_lines.iter().join(", ")
                ));
            }
            if !trip.negative_dwell_lines.is_empty() {
                lines.push(format!(
                    "DEPARTURE BEFORE ARRIVAL in trip_id: {} at line(s): {}",
                    trip.trip_id,
                    trip.negative_dwell_lines.iter().join(", ")
                ));
            }
        }
        for orphan in self.orphaned_trips.iter().chain(self.orphaned_stops.iter()) {
            lines.push(format!(
                "ORPHANED {} '{}' at line {}",
                orphan.kind, orphan.id, orphan.line_number
            ));
        }
        lines
    }
}

/// runs every check over a dataset: the per-trip time checks, the referential checks
/// against whichever reference sets are available, and the structural gate.
pub fn validate_dataset(
    dataset: &StopTimesDataset,
    trip_ids: Option<&HashSet<String>>,
    stop_ids: Option<&HashSet<String>>,
) -> ValidationReport {
    let trips = trip_ops::group_by_trip(&dataset.visits);
    let n_trips = trips.len();
    let mut report = ValidationReport::default();
    let trip_iter = tqdm!(trips.into_iter(), total = n_trips, desc = "validating trips");
    for (trip_id, visits) in trip_iter {
        let (timed, malformed) = validation_ops::parse_trip(trip_id, &visits);
        let overlaps = validation_ops::find_overlap_pairs(&timed);
        let findings = TripFindings {
            trip_id: trip_id.to_string(),
            overlap_lines: validation_ops::find_overlaps(&timed),
            overlaps,
            negative_dwell_lines: validation_ops::find_negative_dwell(&timed),
        };
        report.malformed.extend(malformed);
        report.trips.push(findings);
    }

    let orphaned_trips = reference_ops::find_orphaned_trips(&dataset.visits, trip_ids);
    let orphaned_stops = reference_ops::find_orphaned_stops(&dataset.visits, stop_ids);

    report.summary = ValidationSummary {
        total_trips: n_trips,
        valid_trips: report.trips.iter().filter(|t| t.is_valid()).count(),
        trips_with_overlap: report
            .trips
            .iter()
            .filter(|t| !t.overlap_lines.is_empty())
            .count(),
        trips_with_negative_dwell: report
            .trips
            .iter()
            .filter(|t| !t.negative_dwell_lines.is_empty())
            .count(),
        orphaned_trip_references: orphaned_trips.as_ref().map(Vec::len).unwrap_or_default(),
        orphaned_stop_references: orphaned_stops.as_ref().map(Vec::len).unwrap_or_default(),
        skipped_records: report.malformed.len(),
        rejected_records: dataset.rejected.len(),
        structurally_valid: dataset.is_structurally_valid(),
        trip_check_skipped: orphaned_trips.is_none(),
        stop_check_skipped: orphaned_stops.is_none(),
    };
    report.orphaned_trips = orphaned_trips.unwrap_or_default();
    report.orphaned_stops = orphaned_stops.unwrap_or_default();
    report.rejected = dataset.rejected.clone();
    report
}
