use chrono::NaiveDateTime;
use serde::Serialize;

use crate::allocation::availability::is_available;
use crate::allocation::model::{BookingPolicy, Sitting, TimeRange};
use crate::types::BookingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub sitting_id: i64,
    pub start: NaiveDateTime,
    pub available: bool,
}

/// `requested ± policy.search_window`
pub fn search_window(requested: NaiveDateTime, policy: &BookingPolicy) -> TimeRange {
    TimeRange {
        start: requested - policy.search_window,
        end: requested + policy.search_window,
    }
}

/// Candidate start times around `requested`, one every `policy.slot_step`,
/// each flagged with whether `guests` would fit for a `policy.probe` long stay.
///
/// Closed sittings and sittings outside the search window are skipped, so the
/// caller may pass a wider list than strictly needed.
pub fn generate_slots(
    requested: NaiveDateTime,
    guests: i32,
    sittings: &[Sitting],
    policy: &BookingPolicy,
) -> Result<Vec<TimeSlot>, BookingError> {
    if guests <= 0 {
        return Err(BookingError::Validation("Party size must be at least 1".into()));
    }
    if policy.slot_step <= chrono::Duration::zero() {
        return Err(BookingError::Validation("Slot step must be positive".into()));
    }

    let window = search_window(requested, policy);
    let in_range: Vec<&Sitting> = sittings
        .iter()
        .filter(|s| !s.closed && s.window().overlaps(&window))
        .collect();

    if in_range.is_empty() {
        return Err(BookingError::NoSittingsAvailable);
    }

    let mut slots = vec![];
    for sitting in in_range {
        let mut current = sitting.start.max(window.start);

        while current < sitting.end && current < window.end {
            let probe = TimeRange::starting_at(current, policy.probe);
            slots.push(TimeSlot {
                sitting_id: sitting.id,
                start: current,
                available: is_available(sitting, &probe, guests),
            });
            current += policy.slot_step;
        }
    }

    if slots.is_empty() {
        return Err(BookingError::NoSlotsAvailable);
    }

    slots.sort_by_key(|slot| slot.start);

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::allocation::model::fixtures::*;

    fn legacy_policy() -> BookingPolicy {
        BookingPolicy::new(120, 15, 60, Some(15)).unwrap()
    }

    #[test]
    fn slots_cover_one_hour_either_side_in_quarter_hours() {
        let dinner = sitting(1, at(17, 0), at(22, 0), 40);

        let slots = generate_slots(at(19, 0), 2, &[dinner], &BookingPolicy::default()).unwrap();

        let starts: Vec<_> = slots.iter().map(|s| s.start).collect();
        assert_eq!(starts.first(), Some(&at(18, 0)));
        assert_eq!(starts.last(), Some(&at(19, 45)));
        assert_eq!(starts.len(), 8);
        assert!(starts.windows(2).all(|w| w[1] - w[0] == Duration::minutes(15)));
        assert!(slots.iter().all(|s| s.available));
    }

    #[test]
    fn grid_is_clipped_to_the_sitting() {
        let lunch = sitting(1, at(12, 0), at(16, 0), 40);

        let slots = generate_slots(at(12, 15), 2, &[lunch], &BookingPolicy::default()).unwrap();

        assert_eq!(slots.first().map(|s| s.start), Some(at(12, 0)));
        assert_eq!(slots.last().map(|s| s.start), Some(at(13, 0)));
    }

    #[test]
    fn no_sitting_near_the_request() {
        let dinner = sitting(1, at(17, 0), at(22, 0), 40);

        let result = generate_slots(at(12, 30), 2, &[dinner], &BookingPolicy::default());

        assert!(matches!(result, Err(BookingError::NoSittingsAvailable)));
    }

    #[test]
    fn closed_sittings_are_skipped() {
        let mut lunch = sitting(1, at(12, 0), at(16, 0), 40);
        lunch.closed = true;

        let result = generate_slots(at(12, 30), 2, &[lunch], &BookingPolicy::default());

        assert!(matches!(result, Err(BookingError::NoSittingsAvailable)));
    }

    #[test]
    fn slots_from_several_sittings_come_out_in_order() {
        let lunch = sitting(1, at(12, 0), at(16, 0), 40);
        let dinner = sitting(2, at(16, 0), at(22, 0), 40);

        let slots = generate_slots(at(16, 0), 2, &[dinner, lunch], &BookingPolicy::default()).unwrap();

        assert!(slots.windows(2).all(|w| w[0].start <= w[1].start));
        assert_eq!(slots.first().map(|s| s.sitting_id), Some(1));
        assert_eq!(slots.last().map(|s| s.sitting_id), Some(2));
        assert!(slots.iter().all(|s| s.start >= at(15, 0) && s.start < at(17, 0)));
    }

    #[test]
    fn full_probe_window_marks_slots_before_a_large_booking() {
        let mut dinner = sitting(1, at(17, 0), at(22, 0), 40);
        dinner.reservations.push(reservation(7, 1, at(18, 0), 120, 38));

        let slots = generate_slots(at(17, 0), 3, &[dinner], &BookingPolicy::default()).unwrap();

        // 17:00 + 2h runs into the 18:00 booking.
        assert!(slots.iter().all(|s| !s.available));
    }

    #[test]
    fn legacy_probe_only_looks_a_quarter_hour_ahead() {
        let mut dinner = sitting(1, at(17, 0), at(22, 0), 40);
        dinner.reservations.push(reservation(7, 1, at(18, 0), 120, 38));

        let slots = generate_slots(at(17, 0), 3, &[dinner], &legacy_policy()).unwrap();
        let availability: Vec<_> = slots.iter().map(|s| (s.start, s.available)).collect();

        assert_eq!(
            availability,
            vec![
                (at(17, 0), true),
                (at(17, 15), true),
                (at(17, 30), true),
                (at(17, 45), true),
            ]
        );
    }

    #[test]
    fn zero_guests_is_rejected() {
        let dinner = sitting(1, at(17, 0), at(22, 0), 40);

        assert!(matches!(
            generate_slots(at(19, 0), 0, &[dinner], &BookingPolicy::default()),
            Err(BookingError::Validation(_))
        ));
    }
}
