use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::allocation::model::Reservation;
use crate::types::BookingError;

/// Stages of a booked reservation. Discriminants are the persisted status ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    Pending = 1,
    Confirmed = 2,
    Seated = 3,
    Finished = 4,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 4] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::Seated,
        ReservationStatus::Finished,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Display name stored in `reservation_statuses`.
    pub fn name(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "Pending",
            ReservationStatus::Confirmed => "Approved",
            ReservationStatus::Seated => "Seated",
            ReservationStatus::Finished => "Finished",
        }
    }
}

/// Moves `reservation` one stage forward and returns the new status.
///
/// Seating and finishing are refused before the reservation's start. Finishing
/// rewrites the duration to the whole minutes elapsed since start, so `end()`
/// lands on `now` truncated to the minute.
pub fn advance(reservation: &mut Reservation, now: NaiveDateTime) -> Result<ReservationStatus, BookingError> {
    let next = match reservation.status() {
        Some(ReservationStatus::Pending) => ReservationStatus::Confirmed,
        Some(ReservationStatus::Confirmed) => {
            ensure_started(reservation, now)?;
            ReservationStatus::Seated
        }
        Some(ReservationStatus::Seated) => {
            ensure_started(reservation, now)?;
            reservation.duration_minutes = (now - reservation.start).num_minutes() as i32;
            ReservationStatus::Finished
        }
        Some(ReservationStatus::Finished) | None => {
            return Err(BookingError::InvalidTransition(reservation.status_id))
        }
    };

    reservation.status_id = next.id();

    Ok(next)
}

fn ensure_started(reservation: &Reservation, now: NaiveDateTime) -> Result<(), BookingError> {
    if reservation.start > now {
        return Err(BookingError::TooEarly { start: reservation.start });
    }

    Ok(())
}
