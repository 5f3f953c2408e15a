use rand::seq::IndexedRandom;
use rand::Rng;

use crate::allocation::model::{RestaurantTable, TimeRange};
use crate::types::BookingError;

/// True when none of the table's reservations, other than `exclude`, overlaps `range`.
pub fn is_table_free(table: &RestaurantTable, range: &TimeRange, exclude: Option<i64>) -> bool {
    table
        .reservations
        .iter()
        .filter(|r| Some(r.id) != exclude)
        .all(|r| r.end() <= range.start || r.start >= range.end)
}

pub fn available_tables<'a>(
    tables: &'a [RestaurantTable],
    range: &TimeRange,
    exclude: Option<i64>,
) -> Vec<&'a RestaurantTable> {
    tables.iter().filter(|t| is_table_free(t, range, exclude)).collect()
}

/// Uniform pick among free tables.
pub fn pick_random<'a, R: Rng + ?Sized>(
    candidates: &[&'a RestaurantTable],
    rng: &mut R,
) -> Option<&'a RestaurantTable> {
    candidates.choose(rng).copied()
}

/// Resolves staff-chosen table ids against the full table set.
///
/// Every id must name a known table and no id may repeat.
pub fn validate_selection<'a>(
    tables: &'a [RestaurantTable],
    selected_ids: &[i64],
) -> Result<Vec<&'a RestaurantTable>, BookingError> {
    let chosen: Vec<&RestaurantTable> = tables.iter().filter(|t| selected_ids.contains(&t.id)).collect();

    if chosen.is_empty() || chosen.len() != selected_ids.len() {
        return Err(BookingError::InvalidTableSelection(
            "One or more selected tables are invalid".into(),
        ));
    }

    Ok(chosen)
}

/// [`validate_selection`] plus the overlap rule: each chosen table must be free
/// for `range`, ignoring links to `exclude`.
pub fn validate_free_selection<'a>(
    tables: &'a [RestaurantTable],
    selected_ids: &[i64],
    range: &TimeRange,
    exclude: Option<i64>,
) -> Result<Vec<&'a RestaurantTable>, BookingError> {
    let chosen = validate_selection(tables, selected_ids)?;

    if let Some(taken) = chosen.iter().find(|t| !is_table_free(t, range, exclude)) {
        return Err(BookingError::InvalidTableSelection(format!(
            "Table {} is already booked for the selected time",
            taken.label
        )));
    }

    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::allocation::model::fixtures::*;

    fn floor() -> Vec<RestaurantTable> {
        vec![
            table(1, "T1", vec![reservation(100, 1, at(18, 0), 120, 4)]),
            table(2, "T2", vec![]),
            table(3, "T3", vec![reservation(101, 1, at(21, 0), 120, 2)]),
        ]
    }

    fn labels(tables: &[&RestaurantTable]) -> Vec<String> {
        tables.iter().map(|t| t.label.clone()).collect()
    }

    #[test]
    fn overlapping_booking_hides_the_table() {
        let tables = floor();
        let range = TimeRange::new(at(18, 30), at(20, 30)).unwrap();

        assert_eq!(labels(&available_tables(&tables, &range, None)), vec!["T2", "T3"]);
    }

    #[test]
    fn booking_that_ends_at_the_start_does_not_block() {
        let tables = floor();
        let range = TimeRange::new(at(20, 0), at(22, 0)).unwrap();

        assert_eq!(labels(&available_tables(&tables, &range, None)), vec!["T1", "T2"]);
    }

    #[test]
    fn edited_reservation_keeps_its_own_table() {
        let tables = floor();
        let range = TimeRange::new(at(18, 30), at(20, 30)).unwrap();

        assert_eq!(labels(&available_tables(&tables, &range, Some(100))), vec!["T1", "T2", "T3"]);
        assert_eq!(labels(&available_tables(&tables, &range, Some(101))), vec!["T2", "T3"]);
    }

    #[test]
    fn random_pick_stays_among_candidates() {
        let tables = floor();
        let range = TimeRange::new(at(18, 30), at(20, 30)).unwrap();
        let free = available_tables(&tables, &range, None);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let picked = pick_random(&free, &mut rng).unwrap();
            assert!(picked.label == "T2" || picked.label == "T3");
        }
        assert!(pick_random(&[], &mut rng).is_none());
    }

    #[test]
    fn selection_must_name_known_tables() {
        let tables = floor();

        assert_eq!(labels(&validate_selection(&tables, &[2, 3]).unwrap()), vec!["T2", "T3"]);
        assert!(matches!(
            validate_selection(&tables, &[2, 99]),
            Err(BookingError::InvalidTableSelection(_))
        ));
        assert!(validate_selection(&tables, &[]).is_err());
        assert!(validate_selection(&tables, &[2, 2]).is_err());
    }

    #[test]
    fn selection_of_a_busy_table_is_rejected() {
        let tables = floor();
        let range = TimeRange::new(at(19, 0), at(21, 0)).unwrap();

        let err = validate_free_selection(&tables, &[1, 2], &range, None).unwrap_err();
        assert_eq!(err.to_string(), "Invalid table selection: Table T1 is already booked for the selected time");
        assert!(validate_free_selection(&tables, &[1, 2], &range, Some(100)).is_ok());
    }
}
