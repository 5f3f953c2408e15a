//! Booking operations. Each function expects to run inside one database
//! transaction opened by the caller; none of them retries.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::allocation::availability::check_capacity;
use crate::allocation::lifecycle::{advance, ReservationStatus};
use crate::allocation::model::{BookingPolicy, Person, PersonDetails, Reservation, RestaurantTable, Sitting, TimeRange};
use crate::allocation::slots::{generate_slots, search_window, TimeSlot};
use crate::allocation::tables::{available_tables, pick_random, validate_free_selection};
use crate::services::gateway::Gateway;
use crate::types::BookingError;

#[derive(Debug, Clone, Deserialize)]
pub struct SlotSearch {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub guests: i32,
    pub restaurant_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub sitting_id: i64,
    pub start: NaiveDateTime,
    pub guests: i32,
    pub notes: Option<String>,
    pub person: PersonDetails,
    /// Staff pick tables explicitly; guests get one assigned at random.
    pub table_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditRequest {
    pub sitting_id: i64,
    pub start: NaiveDateTime,
    pub guests: i32,
    pub notes: Option<String>,
    pub person: PersonDetails,
    /// Empty clears every table link.
    #[serde(default)]
    pub table_ids: Vec<i64>,
}

pub fn compute_available_slots<G: Gateway + ?Sized>(
    gateway: &mut G,
    search: &SlotSearch,
    policy: &BookingPolicy,
    now: NaiveDateTime,
) -> Result<Vec<TimeSlot>, BookingError> {
    let requested = search.date.and_time(search.time);
    let window = search_window(requested, policy);
    let mut sittings = gateway.list_sittings_overlapping(&window, search.restaurant_id)?;

    for sitting in sittings.iter_mut() {
        sitting.closed = sitting.is_closed_at(now);
    }

    generate_slots(requested, search.guests, &sittings, policy)
}

/// Tables with nothing booked over `[start, start + duration)`, ignoring
/// links to `exclude`.
pub fn free_tables<G: Gateway + ?Sized>(
    gateway: &mut G,
    restaurant_id: Option<i64>,
    start: NaiveDateTime,
    exclude: Option<i64>,
    policy: &BookingPolicy,
) -> Result<Vec<RestaurantTable>, BookingError> {
    let range = TimeRange::starting_at(start, policy.duration);
    let tables = gateway.list_tables(restaurant_id)?;

    Ok(available_tables(&tables, &range, exclude).into_iter().cloned().collect())
}

pub fn allocate_tables_and_book<G: Gateway + ?Sized, R: Rng + ?Sized>(
    gateway: &mut G,
    request: &BookingRequest,
    policy: &BookingPolicy,
    now: NaiveDateTime,
    rng: &mut R,
) -> Result<Reservation, BookingError> {
    validate_person(&request.person)?;

    let sitting = load_sitting(gateway, request.sitting_id, now)?;
    let range = booking_range(&sitting, request.start, policy.duration)?;

    if let Err(err) = check_capacity(&sitting, &range, request.guests, None) {
        warn!(sitting_id = sitting.id, guests = request.guests, %err, "Booking refused");
        return Err(err);
    }

    let tables = gateway.list_tables(Some(sitting.restaurant_id))?;
    let table_ids: Vec<i64> = match &request.table_ids {
        Some(ids) => validate_free_selection(&tables, ids, &range, None)?
            .iter()
            .map(|t| t.id)
            .collect(),
        None => {
            let free = available_tables(&tables, &range, None);
            let assigned = pick_random(&free, rng).ok_or(BookingError::NoTablesAvailable)?;
            vec![assigned.id]
        }
    };

    let person = resolve_person(gateway, &request.person)?;

    let booked = gateway.insert_reservation(&Reservation {
        id: 0,
        sitting_id: sitting.id,
        person_id: person.id,
        status_id: ReservationStatus::Pending.id(),
        start: request.start,
        duration_minutes: policy.duration_minutes(),
        pax: request.guests,
        notes: request.notes.clone(),
        table_ids,
    })?;

    info!(
        reservation_id = booked.id,
        sitting_id = sitting.id,
        pax = booked.pax,
        tables = ?booked.table_ids,
        "Booked reservation"
    );

    Ok(booked)
}

pub fn edit_reservation<G: Gateway + ?Sized>(
    gateway: &mut G,
    reservation_id: i64,
    request: &EditRequest,
    policy: &BookingPolicy,
    now: NaiveDateTime,
) -> Result<Reservation, BookingError> {
    let original = gateway
        .find_reservation(reservation_id)?
        .ok_or(BookingError::NotFound("Reservation", reservation_id))?;

    validate_person(&request.person)?;

    // A finished visit keeps the length it actually took.
    let duration_minutes = match original.status() {
        Some(ReservationStatus::Finished) => original.duration_minutes,
        _ => policy.duration_minutes(),
    };

    let sitting = load_sitting(gateway, request.sitting_id, now)?;
    let range = booking_range(&sitting, request.start, Duration::minutes(i64::from(duration_minutes)))?;
    check_capacity(&sitting, &range, request.guests, Some(reservation_id))?;

    let table_ids = if request.table_ids.is_empty() {
        vec![]
    } else {
        let tables = gateway.list_tables(Some(sitting.restaurant_id))?;
        validate_free_selection(&tables, &request.table_ids, &range, Some(reservation_id))?
            .iter()
            .map(|t| t.id)
            .collect()
    };

    let person = resolve_person(gateway, &request.person)?;

    let updated = Reservation {
        id: reservation_id,
        sitting_id: sitting.id,
        person_id: person.id,
        status_id: original.status_id,
        start: request.start,
        duration_minutes,
        pax: request.guests,
        notes: request.notes.clone(),
        table_ids,
    };
    gateway.update_reservation(&updated)?;

    info!(reservation_id, "Reservation updated");

    Ok(updated)
}

pub fn transition_reservation_status<G: Gateway + ?Sized>(
    gateway: &mut G,
    reservation_id: i64,
    now: NaiveDateTime,
) -> Result<Reservation, BookingError> {
    let mut reservation = gateway
        .find_reservation(reservation_id)?
        .ok_or(BookingError::NotFound("Reservation", reservation_id))?;

    let status = advance(&mut reservation, now)?;
    gateway.update_reservation(&reservation)?;

    info!(reservation_id, status = status.name(), "Reservation status updated");

    Ok(reservation)
}

pub fn delete_reservation<G: Gateway + ?Sized>(gateway: &mut G, reservation_id: i64) -> Result<(), BookingError> {
    if !gateway.delete_reservation(reservation_id)? {
        return Err(BookingError::NotFound("Reservation", reservation_id));
    }

    info!(reservation_id, "Reservation deleted");

    Ok(())
}

fn load_sitting<G: Gateway + ?Sized>(
    gateway: &mut G,
    sitting_id: i64,
    now: NaiveDateTime,
) -> Result<Sitting, BookingError> {
    let sitting = gateway
        .find_sitting(sitting_id)?
        .ok_or(BookingError::NotFound("Sitting", sitting_id))?;

    if sitting.is_closed_at(now) {
        return Err(BookingError::SittingClosed(sitting_id));
    }

    Ok(sitting)
}

fn booking_range(sitting: &Sitting, start: NaiveDateTime, length: Duration) -> Result<TimeRange, BookingError> {
    if !sitting.window().contains(start) {
        return Err(BookingError::Validation(format!(
            "Start {start} is outside sitting '{}' ({} - {})",
            sitting.name, sitting.start, sitting.end
        )));
    }

    Ok(TimeRange::starting_at(start, length))
}

fn validate_person(details: &PersonDetails) -> Result<(), BookingError> {
    if details.email.trim().is_empty() {
        return Err(BookingError::Validation("Person details are required".into()));
    }

    Ok(())
}

fn resolve_person<G: Gateway + ?Sized>(gateway: &mut G, details: &PersonDetails) -> Result<Person, BookingError> {
    match gateway.find_person_by_email(&details.email)? {
        Some(person) => Ok(person),
        None => gateway.create_person(details),
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;

    /// Gateway over plain vectors; reservations are attached on read the way
    /// the Postgres gateway does it.
    #[derive(Default)]
    pub struct MemoryGateway {
        pub sittings: Vec<Sitting>,
        pub tables: Vec<RestaurantTable>,
        pub persons: Vec<Person>,
        pub reservations: Vec<Reservation>,
        pub fail_inserts: bool,
    }

    impl MemoryGateway {
        fn attach(&self, mut sitting: Sitting) -> Sitting {
            sitting.reservations = self
                .reservations
                .iter()
                .filter(|r| r.sitting_id == sitting.id)
                .cloned()
                .collect();
            sitting
        }
    }

    impl Gateway for MemoryGateway {
        fn list_sittings_overlapping(
            &mut self,
            window: &TimeRange,
            restaurant_id: Option<i64>,
        ) -> Result<Vec<Sitting>, BookingError> {
            Ok(self
                .sittings
                .iter()
                .filter(|s| !s.closed && s.window().overlaps(window))
                .filter(|s| restaurant_id.map_or(true, |r| s.restaurant_id == r))
                .map(|s| self.attach(s.clone()))
                .collect())
        }

        fn find_sitting(&mut self, id: i64) -> Result<Option<Sitting>, BookingError> {
            Ok(self.sittings.iter().find(|s| s.id == id).map(|s| self.attach(s.clone())))
        }

        fn list_tables(&mut self, _restaurant_id: Option<i64>) -> Result<Vec<RestaurantTable>, BookingError> {
            Ok(self
                .tables
                .iter()
                .map(|t| RestaurantTable {
                    reservations: self
                        .reservations
                        .iter()
                        .filter(|r| r.table_ids.contains(&t.id))
                        .cloned()
                        .collect(),
                    ..t.clone()
                })
                .collect())
        }

        fn find_person_by_email(&mut self, email: &str) -> Result<Option<Person>, BookingError> {
            Ok(self.persons.iter().find(|p| p.email.eq_ignore_ascii_case(email.trim())).cloned())
        }

        fn create_person(&mut self, details: &PersonDetails) -> Result<Person, BookingError> {
            let person = Person {
                id: self.persons.len() as i64 + 1,
                user_id: None,
                name: details.name.clone(),
                phone: details.phone.clone(),
                email: details.email.trim().to_owned(),
            };
            self.persons.push(person.clone());
            Ok(person)
        }

        fn find_reservation(&mut self, id: i64) -> Result<Option<Reservation>, BookingError> {
            Ok(self.reservations.iter().find(|r| r.id == id).cloned())
        }

        fn insert_reservation(&mut self, draft: &Reservation) -> Result<Reservation, BookingError> {
            if self.fail_inserts {
                return Err(BookingError::Conflict);
            }

            let next_id = self.reservations.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            let stored = Reservation { id: next_id, ..draft.clone() };
            self.reservations.push(stored.clone());
            Ok(stored)
        }

        fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), BookingError> {
            let slot = self
                .reservations
                .iter_mut()
                .find(|r| r.id == reservation.id)
                .ok_or(BookingError::NotFound("Reservation", reservation.id))?;
            *slot = reservation.clone();
            Ok(())
        }

        fn delete_reservation(&mut self, id: i64) -> Result<bool, BookingError> {
            let before = self.reservations.len();
            self.reservations.retain(|r| r.id != id);
            Ok(self.reservations.len() < before)
        }
    }
}
