use std::collections::HashSet;
use std::fmt::Display;

use serde::Serialize;

use crate::stop_times::StopVisit;

/// the foreign key a [`OrphanedReference`] failed to resolve.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Trip,
    Stop,
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::Trip => write!(f, "trip_id"),
            ReferenceKind::Stop => write!(f, "stop_id"),
        }
    }
}

/// a visit whose trip_id or stop_id has no entry in its reference dataset.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OrphanedReference {
    pub kind: ReferenceKind,
    pub id: String,
    pub line_number: u64,
}

/// checks each visit's trip_id against the identifiers in trips.txt.
///
/// # Result
/// None if there is no reference set to check against, otherwise one finding per
/// visit with an unknown trip_id, in input order.
pub fn find_orphaned_trips(
    visits: &[StopVisit],
    trip_ids: Option<&HashSet<String>>,
) -> Option<Vec<OrphanedReference>> {
    find_orphans(visits, trip_ids, ReferenceKind::Trip, |v| &v.trip_id)
}

/// checks each visit's stop_id against the identifiers in stops.txt.
///
/// # Result
/// None if there is no reference set to check against, otherwise one finding per
/// visit with an unknown stop_id, in input order.
pub fn find_orphaned_stops(
    visits: &[StopVisit],
    stop_ids: Option<&HashSet<String>>,
) -> Option<Vec<OrphanedReference>> {
    find_orphans(visits, stop_ids, ReferenceKind::Stop, |v| &v.stop_id)
}

fn find_orphans<F>(
    visits: &[StopVisit],
    reference: Option<&HashSet<String>>,
    kind: ReferenceKind,
    key: F,
) -> Option<Vec<OrphanedReference>>
where
    F: Fn(&StopVisit) -> &String,
{
    let ids = reference.filter(|ids| !ids.is_empty())?;
    let orphans = visits
        .iter()
        .filter(|v| !ids.contains(key(v)))
        .map(|v| OrphanedReference {
            kind,
            id: key(v).clone(),
            line_number: v.line_number,
        })
        .collect();
    Some(orphans)
}
