use std::collections::BTreeMap;

use crate::stop_times::StopVisit;

/// partitions visits by trip identifier. iterating the result visits trips in sorted
/// trip_id order, which keeps diagnostics and output reproducible between runs.
/// within a trip, visits keep their input order.
pub fn group_by_trip(visits: &[StopVisit]) -> BTreeMap<&str, Vec<&StopVisit>> {
    let mut trips: BTreeMap<&str, Vec<&StopVisit>> = BTreeMap::new();
    for visit in visits.iter() {
        trips.entry(visit.trip_id.as_str()).or_default().push(visit);
    }
    trips
}

/// orders a trip's visits by ascending stop_sequence. the sort is stable, so duplicate
/// sequence values keep their relative input order.
pub fn sort_by_sequence<T, F>(visits: &mut [T], stop_sequence: F)
where
    F: Fn(&T) -> u32,
{
    visits.sort_by_key(|v| stop_sequence(v));
}

#[cfg(test)]
mod test {
    use super::{group_by_trip, sort_by_sequence};
    use crate::stop_times::StopVisit;

    fn visit(trip_id: &str, stop_sequence: u32, line_number: u64) -> StopVisit {
        StopVisit {
            trip_id: trip_id.to_string(),
            stop_id: format!("stop_{stop_sequence}"),
            stop_sequence,
            arrival_time: String::from("08:00:00"),
            departure_time: String::from("08:00:00"),
            line_number,
            passthrough: vec![],
        }
    }

    #[test]
    fn test_group_by_trip_sorted_keys() {
        let visits = vec![
            visit("b", 1, 2),
            visit("a", 2, 3),
            visit("b", 2, 4),
            visit("a", 1, 5),
        ];
        let trips = group_by_trip(&visits);
        let keys = trips.keys().copied().collect::<Vec<_>>();
        assert_eq!(keys, vec!["a", "b"]);
        let a_lines = trips["a"].iter().map(|v| v.line_number).collect::<Vec<_>>();
        assert_eq!(a_lines, vec![3, 5]);
    }

    #[test]
    fn test_group_by_trip_empty() {
        assert!(group_by_trip(&[]).is_empty());
    }

    #[test]
    fn test_sort_by_sequence_is_stable_on_ties() {
        let mut visits = vec![visit("a", 3, 2), visit("a", 1, 3), visit("a", 3, 4), visit("a", 2, 5)];
        sort_by_sequence(&mut visits, |v| v.stop_sequence);
        let lines = visits.iter().map(|v| v.line_number).collect::<Vec<_>>();
        assert_eq!(lines, vec![3, 5, 2, 4]);
    }
}
