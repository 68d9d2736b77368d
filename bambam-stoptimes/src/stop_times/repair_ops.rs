use kdam::tqdm;
use serde::Serialize;

use crate::stop_times::{
    stop_time_error::StopTimeError, trip_ops, InvalidTripPolicy, ServiceTime, StopVisit,
};

/// a trip's visits after repair, in stop_sequence order.
pub struct RepairedTrip {
    pub trip_id: String,
    pub visits: Vec<StopVisit>,
    /// true if any arrival or departure value differs from its original
    pub changed: bool,
}

/// the result of repairing every trip in a dataset.
#[derive(Serialize, Debug, Clone, Default)]
pub struct RepairOutcome {
    /// all visits, ordered by trip_id and then stop_sequence
    #[serde(skip)]
    pub visits: Vec<StopVisit>,
    pub trips: usize,
    pub trips_repaired: usize,
    /// trips with unparseable times that were written out unmodified
    pub trips_kept: usize,
}

/// repairs the times of a single trip so that they are monotonic.
///
/// visits may be supplied in any order; the result has the same length and is
/// sorted by stop_sequence.
pub fn repair(visits: &[StopVisit]) -> Result<Vec<StopVisit>, StopTimeError> {
    let refs = visits.iter().collect::<Vec<_>>();
    repair_trip(&refs).map(|trip| trip.visits)
}

/// repairs a trip by hour-wrapping. each visit's arrival is pushed forward in whole
/// hours until it is no earlier than the previous departure, its departure is clamped
/// up to its arrival, and the departure is then hour-wrapped past the previous
/// departure. minute and second components of wrapped times are never altered.
///
/// a malformed time anywhere in the trip fails the whole trip.
pub fn repair_trip(visits: &[&StopVisit]) -> Result<RepairedTrip, StopTimeError> {
    let mut ordered = visits.to_vec();
    trip_ops::sort_by_sequence(&mut ordered, |v| v.stop_sequence);
    let trip_id = ordered
        .first()
        .map(|v| v.trip_id.clone())
        .unwrap_or_default();

    let mut last_departure = ServiceTime::default();
    let mut changed = false;
    let mut repaired = Vec::with_capacity(ordered.len());
    for visit in ordered {
        let fail = |source: StopTimeError| StopTimeError::InvalidTrip {
            trip_id: visit.trip_id.clone(),
            line_number: visit.line_number,
            source: Box::new(source),
        };
        let original_arrival = ServiceTime::parse(&visit.arrival_time).map_err(fail)?;
        let original_departure = ServiceTime::parse(&visit.departure_time).map_err(fail)?;

        let arrival = wrap_until(original_arrival, last_departure)
            .ok_or_else(|| fail(overflow(visit)))?;
        let departure = if original_departure < arrival {
            arrival
        } else {
            original_departure
        };
        let departure =
            wrap_until(departure, last_departure).ok_or_else(|| fail(overflow(visit)))?;

        if arrival != original_arrival || departure != original_departure {
            changed = true;
        }
        repaired.push(visit.with_times(arrival.to_string(), departure.to_string()));
        last_departure = departure;
    }

    Ok(RepairedTrip {
        trip_id,
        visits: repaired,
        changed,
    })
}

/// repairs every trip in the dataset, in sorted trip_id order.
pub fn repair_dataset(
    visits: &[StopVisit],
    policy: &InvalidTripPolicy,
) -> Result<RepairOutcome, StopTimeError> {
    let trips = trip_ops::group_by_trip(visits);
    let n_trips = trips.len();
    let mut outcome = RepairOutcome {
        visits: Vec::with_capacity(visits.len()),
        trips: n_trips,
        ..Default::default()
    };
    let trip_iter = tqdm!(trips.into_iter(), total = n_trips, desc = "repairing trips");
    for (trip_id, trip_visits) in trip_iter {
        match (repair_trip(&trip_visits), policy) {
            (Ok(trip), _) => {
                if trip.changed {
                    log::debug!("trip {trip_id} ({} stops) [FIXED]", trip.visits.len());
                    outcome.trips_repaired += 1;
                } else {
                    log::debug!("trip {trip_id} ({} stops) [OK]", trip.visits.len());
                }
                outcome.visits.extend(trip.visits);
            }
            (Err(e), InvalidTripPolicy::Fail) => return Err(e),
            (Err(e), InvalidTripPolicy::KeepOriginal) => {
                log::warn!("{e}; keeping original times for trip {trip_id}");
                let mut original = trip_visits.into_iter().cloned().collect::<Vec<_>>();
                trip_ops::sort_by_sequence(&mut original, |v| v.stop_sequence);
                outcome.visits.extend(original);
                outcome.trips_kept += 1;
            }
        }
    }
    Ok(outcome)
}

/// adds whole hours to `time` until it is no earlier than `watermark`.
fn wrap_until(time: ServiceTime, watermark: ServiceTime) -> Option<ServiceTime> {
    let mut time = time;
    while time < watermark {
        time = time.checked_add_hour()?;
    }
    Some(time)
}

fn overflow(visit: &StopVisit) -> StopTimeError {
    StopTimeError::malformed_time(
        &visit.arrival_time,
        "hour-wrap repair exceeds the representable time range",
    )
}

#[cfg(test)]
mod tests {
    use super::{repair, repair_dataset, repair_trip};
    use crate::stop_times::{validation_ops, InvalidTripPolicy, ServiceTime, StopVisit};
    use proptest::prelude::*;

    fn visit(trip_id: &str, stop_sequence: u32, arrival: &str, departure: &str) -> StopVisit {
        StopVisit {
            trip_id: trip_id.to_string(),
            stop_id: format!("{trip_id}_stop_{stop_sequence}"),
            stop_sequence,
            arrival_time: arrival.to_string(),
            departure_time: departure.to_string(),
            line_number: stop_sequence as u64 + 1,
            passthrough: vec![String::from("0"), String::from("1")],
        }
    }

    fn times(visits: &[StopVisit]) -> Vec<(&str, &str)> {
        visits
            .iter()
            .map(|v| (v.arrival_time.as_str(), v.departure_time.as_str()))
            .collect()
    }

    #[test]
    fn test_wrong_hour_is_wrapped_forward() {
        let visits = vec![
            visit("t1", 1, "08:00", "08:05"),
            visit("t1", 2, "07:50", "08:10"),
        ];
        let result = repair(&visits).expect("repair should succeed");
        assert_eq!(
            times(&result),
            vec![("08:00:00", "08:05:00"), ("08:50:00", "08:50:00")]
        );
    }

    #[test]
    fn test_single_visit_unchanged() {
        let visits = vec![visit("t1", 1, "23:15:30", "23:20:00")];
        let trip = repair_trip(&visits.iter().collect::<Vec<_>>()).unwrap();
        assert!(!trip.changed);
        assert_eq!(times(&trip.visits), vec![("23:15:30", "23:20:00")]);
    }

    #[test]
    fn test_negative_dwell_clamped_to_arrival() {
        let visits = vec![visit("t1", 1, "09:30", "09:15")];
        let result = repair(&visits).unwrap();
        assert_eq!(times(&result), vec![("09:30:00", "09:30:00")]);
    }

    #[test]
    fn test_sequence_gap_still_ordered() {
        let visits = vec![
            visit("t1", 3, "08:02", "08:03"),
            visit("t1", 1, "08:00", "08:10"),
        ];
        let result = repair(&visits).unwrap();
        assert_eq!(result[0].stop_sequence, 1);
        assert_eq!(result[1].stop_sequence, 3);
        assert_eq!(
            times(&result),
            vec![("08:00:00", "08:10:00"), ("09:02:00", "09:02:00")]
        );
    }

    #[test]
    fn test_wraps_more_than_one_hour() {
        let visits = vec![
            visit("t1", 1, "10:40", "10:45"),
            visit("t1", 2, "07:50:20", "07:55:20"),
        ];
        let result = repair(&visits).unwrap();
        assert_eq!(result[1].arrival_time, "10:50:20");
        assert_eq!(result[1].departure_time, "10:50:20");
    }

    #[test]
    fn test_consistent_trip_not_changed() {
        let visits = vec![
            visit("t1", 1, "08:00:00", "08:00:00"),
            visit("t1", 2, "08:00:00", "08:01:00"),
            visit("t1", 3, "24:10:00", "24:10:00"),
        ];
        let trip = repair_trip(&visits.iter().collect::<Vec<_>>()).unwrap();
        assert!(!trip.changed);
    }

    #[test]
    fn test_passthrough_fields_preserved() {
        let visits = vec![
            visit("t1", 1, "08:00", "08:05"),
            visit("t1", 2, "07:50", "08:10"),
        ];
        let result = repair(&visits).unwrap();
        for (original, repaired) in visits.iter().zip(result.iter()) {
            assert_eq!(original.trip_id, repaired.trip_id);
            assert_eq!(original.stop_id, repaired.stop_id);
            assert_eq!(original.line_number, repaired.line_number);
            assert_eq!(original.passthrough, repaired.passthrough);
        }
    }

    #[test]
    fn test_malformed_time_fails_trip() {
        let visits = vec![
            visit("t1", 1, "08:00", "08:05"),
            visit("t1", 2, "8h50", "08:55"),
        ];
        let error = repair(&visits).expect_err("malformed time should fail the trip");
        let msg = error.to_string();
        assert!(msg.contains("t1"), "{msg}");
        assert!(msg.contains("8h50"), "{msg}");
    }

    #[test]
    fn test_empty_trip() {
        assert!(repair(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_repair_dataset_orders_and_counts() {
        let visits = vec![
            visit("b", 2, "07:50", "08:10"),
            visit("a", 1, "06:00", "06:00"),
            visit("b", 1, "08:00", "08:05"),
            visit("a", 2, "06:10", "06:11"),
        ];
        let outcome = repair_dataset(&visits, &InvalidTripPolicy::Fail).unwrap();
        assert_eq!(outcome.trips, 2);
        assert_eq!(outcome.trips_repaired, 1);
        assert_eq!(outcome.trips_kept, 0);
        let keys = outcome
            .visits
            .iter()
            .map(|v| (v.trip_id.as_str(), v.stop_sequence))
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![("a", 1), ("a", 2), ("b", 1), ("b", 2)]);
    }

    #[test]
    fn test_repair_dataset_invalid_trip_policy() {
        let visits = vec![
            visit("a", 1, "06:00", "06:00"),
            visit("bad", 2, "??", "08:10"),
            visit("bad", 1, "08:00", "08:05"),
        ];
        assert!(repair_dataset(&visits, &InvalidTripPolicy::Fail).is_err());

        let outcome = repair_dataset(&visits, &InvalidTripPolicy::KeepOriginal).unwrap();
        assert_eq!(outcome.trips, 2);
        assert_eq!(outcome.trips_kept, 1);
        let bad = outcome
            .visits
            .iter()
            .filter(|v| v.trip_id == "bad")
            .map(|v| (v.stop_sequence, v.arrival_time.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(bad, vec![(1, "08:00"), (2, "??")]);
    }

    /// generates a trip with unique, possibly gapped, stop_sequence values in shuffled order
    /// and arbitrary (often inconsistent) times.
    fn arb_trip() -> impl Strategy<Value = Vec<StopVisit>> {
        prop::collection::btree_set(0u32..200, 1..12)
            .prop_flat_map(|sequences| {
                let n = sequences.len();
                (
                    Just(sequences.into_iter().collect::<Vec<_>>()),
                    prop::collection::vec((0u32..30 * 3600, 0u32..30 * 3600), n),
                )
            })
            .prop_map(|(sequences, times)| {
                let mut visits = sequences
                    .into_iter()
                    .zip(times)
                    .map(|(seq, (a, d))| {
                        visit(
                            "t",
                            seq,
                            &ServiceTime::from_seconds(a).to_string(),
                            &ServiceTime::from_seconds(d).to_string(),
                        )
                    })
                    .collect::<Vec<_>>();
                visits.reverse();
                visits
            })
    }

    fn parsed(value: &str) -> ServiceTime {
        ServiceTime::parse(value).expect("repaired times should parse")
    }

    proptest! {
        #[test]
        fn prop_repaired_trip_is_monotonic(visits in arb_trip()) {
            let result = repair(&visits).unwrap();
            for v in result.iter() {
                prop_assert!(parsed(&v.arrival_time) <= parsed(&v.departure_time));
            }
            for pair in result.windows(2) {
                prop_assert!(parsed(&pair[0].departure_time) <= parsed(&pair[1].arrival_time));
            }
        }

        #[test]
        fn prop_arrival_only_moves_by_whole_hours(visits in arb_trip()) {
            let result = repair(&visits).unwrap();
            for repaired in result.iter() {
                let original = visits
                    .iter()
                    .find(|v| v.stop_sequence == repaired.stop_sequence)
                    .unwrap();
                let before = parsed(&original.arrival_time);
                let after = parsed(&repaired.arrival_time);
                prop_assert!(after >= before);
                prop_assert_eq!(after.sub_hour_seconds(), before.sub_hour_seconds());
            }
        }

        #[test]
        fn prop_repair_is_idempotent(visits in arb_trip()) {
            let once = repair(&visits).unwrap();
            let twice = repair(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_repair_preserves_visits(visits in arb_trip()) {
            let result = repair(&visits).unwrap();
            prop_assert_eq!(result.len(), visits.len());
            let mut expected = visits
                .iter()
                .map(|v| (v.stop_sequence, v.stop_id.clone(), v.line_number))
                .collect::<Vec<_>>();
            expected.sort();
            let actual = result
                .iter()
                .map(|v| (v.stop_sequence, v.stop_id.clone(), v.line_number))
                .collect::<Vec<_>>();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn prop_validation_clean_after_repair(visits in arb_trip()) {
            let result = repair(&visits).unwrap();
            let refs = result.iter().collect::<Vec<_>>();
            let (timed, malformed) = validation_ops::parse_trip("t", &refs);
            prop_assert!(malformed.is_empty());
            prop_assert!(validation_ops::find_overlaps(&timed).is_empty());
            prop_assert!(validation_ops::find_negative_dwell(&timed).is_empty());
        }
    }
}
