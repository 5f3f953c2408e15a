use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::allocation::lifecycle::ReservationStatus;
use crate::types::BookingError;

pub const DEFAULT_DURATION_MINUTES: i64 = 120;
pub const SLOT_STEP_MINUTES: i64 = 15;
pub const SEARCH_WINDOW_MINUTES: i64 = 60;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, BookingError> {
        if start >= end {
            return Err(BookingError::Validation(format!(
                "Start {start} must be before end {end}"
            )));
        }

        Ok(TimeRange { start, end })
    }

    pub fn starting_at(start: NaiveDateTime, length: Duration) -> Self {
        TimeRange { start, end: start + length }
    }

    /// Touching ranges (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SittingType {
    Breakfast,
    Lunch,
    Dinner,
    SpecialEvent,
}

impl Display for SittingType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SittingType::Breakfast => "Breakfast",
            SittingType::Lunch => "Lunch",
            SittingType::Dinner => "Dinner",
            SittingType::SpecialEvent => "SpecialEvent",
        };
        f.pad(name)
    }
}

impl FromStr for SittingType {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Breakfast" => Ok(SittingType::Breakfast),
            "Lunch" => Ok(SittingType::Lunch),
            "Dinner" => Ok(SittingType::Dinner),
            "SpecialEvent" => Ok(SittingType::SpecialEvent),
            other => Err(BookingError::Validation(format!("Unknown sitting type '{other}'"))),
        }
    }
}

/// A service period with a guest cap. `reservations` must be loaded by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Sitting {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub capacity: i32,
    pub closed: bool,
    pub sitting_type: SittingType,
    pub reservations: Vec<Reservation>,
}

impl Sitting {
    pub fn window(&self) -> TimeRange {
        TimeRange { start: self.start, end: self.end }
    }

    pub fn has_ended(&self, now: NaiveDateTime) -> bool {
        self.end < now
    }

    /// Closed by staff, or its end has already passed.
    pub fn is_closed_at(&self, now: NaiveDateTime) -> bool {
        self.closed || self.has_ended(now)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub sitting_id: i64,
    pub person_id: i64,
    pub status_id: i32,
    pub start: NaiveDateTime,
    pub duration_minutes: i32,
    pub pax: i32,
    pub notes: Option<String>,
    pub table_ids: Vec<i64>,
}

impl Reservation {
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn range(&self) -> TimeRange {
        TimeRange { start: self.start, end: self.end() }
    }

    pub fn status(&self) -> Option<ReservationStatus> {
        ReservationStatus::from_id(self.status_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RestaurantTable {
    pub id: i64,
    pub area_id: i64,
    pub label: String,
    pub reservations: Vec<Reservation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: i64,
    pub user_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Guest details as typed into a booking form; resolved to a [`Person`] by email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Timing knobs shared by the slot grid and the booking check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    pub duration: Duration,
    pub slot_step: Duration,
    pub search_window: Duration,
    pub probe: Duration,
}

impl BookingPolicy {
    pub fn new(
        duration_minutes: i64,
        slot_step_minutes: i64,
        search_window_minutes: i64,
        probe_minutes: Option<i64>,
    ) -> Result<Self, BookingError> {
        for (name, minutes) in [
            ("duration", duration_minutes),
            ("slot step", slot_step_minutes),
            ("search window", search_window_minutes),
            ("probe", probe_minutes.unwrap_or(duration_minutes)),
        ] {
            if minutes <= 0 {
                return Err(BookingError::Validation(format!(
                    "Booking {name} must be positive, got {minutes} minutes"
                )));
            }
        }

        Ok(BookingPolicy {
            duration: Duration::minutes(duration_minutes),
            slot_step: Duration::minutes(slot_step_minutes),
            search_window: Duration::minutes(search_window_minutes),
            probe: Duration::minutes(probe_minutes.unwrap_or(duration_minutes)),
        })
    }

    pub fn duration_minutes(&self) -> i32 {
        self.duration.num_minutes() as i32
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        BookingPolicy {
            duration: Duration::minutes(DEFAULT_DURATION_MINUTES),
            slot_step: Duration::minutes(SLOT_STEP_MINUTES),
            search_window: Duration::minutes(SEARCH_WINDOW_MINUTES),
            probe: Duration::minutes(DEFAULT_DURATION_MINUTES),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 20)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .expect("valid fixture time")
    }

    pub fn reservation(id: i64, sitting_id: i64, start: NaiveDateTime, minutes: i32, pax: i32) -> Reservation {
        Reservation {
            id,
            sitting_id,
            person_id: 1,
            status_id: ReservationStatus::Pending.id(),
            start,
            duration_minutes: minutes,
            pax,
            notes: None,
            table_ids: vec![],
        }
    }

    pub fn sitting(id: i64, start: NaiveDateTime, end: NaiveDateTime, capacity: i32) -> Sitting {
        Sitting {
            id,
            restaurant_id: 1,
            name: format!("Sitting {id}"),
            start,
            end,
            capacity,
            closed: false,
            sitting_type: SittingType::Dinner,
            reservations: vec![],
        }
    }

    pub fn table(id: i64, label: &str, reservations: Vec<Reservation>) -> RestaurantTable {
        RestaurantTable { id, area_id: 1, label: label.to_owned(), reservations }
    }
}
