use tracing::debug;

use crate::allocation::model::{Reservation, Sitting, TimeRange};
use crate::types::BookingError;

/// Sum of guests whose reservations overlap `range`, skipping `exclude` (the
/// reservation being edited, if any).
pub fn overlapping_pax<'a>(
    reservations: impl IntoIterator<Item = &'a Reservation>,
    range: &TimeRange,
    exclude: Option<i64>,
) -> i64 {
    reservations
        .into_iter()
        .filter(|r| Some(r.id) != exclude)
        .filter(|r| r.range().overlaps(range))
        .map(|r| i64::from(r.pax))
        .sum()
}

/// Whether `guests` more people fit in the sitting during `range`.
///
/// A closed sitting never has room.
pub fn is_available(sitting: &Sitting, range: &TimeRange, guests: i32) -> bool {
    if sitting.closed {
        return false;
    }

    let reserved = overlapping_pax(&sitting.reservations, range, None);
    let available = reserved + i64::from(guests) <= i64::from(sitting.capacity);

    debug!(
        sitting_id = sitting.id,
        start = %range.start,
        end = %range.end,
        reserved,
        guests,
        available,
        "Sitting availability checked"
    );

    available
}

/// Authoritative capacity check run before a reservation is written.
pub fn check_capacity(
    sitting: &Sitting,
    range: &TimeRange,
    guests: i32,
    exclude: Option<i64>,
) -> Result<(), BookingError> {
    if guests <= 0 {
        return Err(BookingError::Validation("Party size must be at least 1".into()));
    }

    if sitting.closed {
        return Err(BookingError::SittingClosed(sitting.id));
    }

    let available = i64::from(sitting.capacity) - overlapping_pax(&sitting.reservations, range, exclude);
    if available < i64::from(guests) {
        return Err(BookingError::CapacityExceeded {
            capacity: sitting.capacity,
            available: i32::try_from(available.max(0)).unwrap_or(i32::MAX),
        });
    }

    Ok(())
}

/// First sitting of the same restaurant whose window overlaps `window`.
pub fn find_overlapping_sitting<'a>(
    existing: &'a [Sitting],
    restaurant_id: i64,
    window: &TimeRange,
) -> Option<&'a Sitting> {
    existing
        .iter()
        .filter(|s| s.restaurant_id == restaurant_id)
        .find(|s| s.window().overlaps(window))
}
