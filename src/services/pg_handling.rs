use actix::Handler;
use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{error, info, warn};

use crate::allocation::availability::find_overlapping_sitting;
use crate::allocation::model::{Reservation, RestaurantTable, Sitting, TimeRange};
use crate::allocation::slots::TimeSlot;
use crate::services::booking;
use crate::services::db_models::ReservationDetails;
use crate::services::db_utils::{establish_connection, PgActor, PgPool};
use crate::services::gateway::{Gateway, PgGateway};
use crate::services::messages::{
    AdvanceReservationStatus, BookReservation, CloseSitting, CreateSitting, DeleteReservation,
    DeleteSitting, EditReservation, FetchFreeTables, FetchGuestReservations, FetchReservation,
    FetchReservationsForDay, FetchSittingsForDay, FetchTables, SearchSlots,
};
use crate::types::BookingError;

/// Runs `op` in a SERIALIZABLE transaction. A concurrent booking that read the
/// same sitting or tables makes one of the two commits fail with `Conflict`.
fn in_booking_transaction<T, F>(pool: &PgPool, action: &str, op: F) -> Result<T, BookingError>
where
    F: FnOnce(&mut PgGateway<'_>) -> Result<T, BookingError>,
{
    let mut conn = establish_connection(pool)?;

    let result = conn
        .build_transaction()
        .serializable()
        .run(|trx_conn| op(&mut PgGateway::new(trx_conn)));

    log_failure(action, &result);
    result
}

fn read_only<T, F>(pool: &PgPool, action: &str, op: F) -> Result<T, BookingError>
where
    F: FnOnce(&mut PgGateway<'_>) -> Result<T, BookingError>,
{
    let mut conn = establish_connection(pool)?;

    let result = conn
        .build_transaction()
        .repeatable_read()
        .read_only()
        .run(|trx_conn| op(&mut PgGateway::new(trx_conn)));

    log_failure(action, &result);
    result
}

fn log_failure<T>(action: &str, result: &Result<T, BookingError>) {
    match result {
        Err(err @ BookingError::Database(_)) => error!(action, %err, "Persistence failure"),
        Err(err) => warn!(action, kind = err.kind(), %err, "Request rejected"),
        Ok(_) => {}
    }
}

fn day_range(day: NaiveDate) -> TimeRange {
    TimeRange::starting_at(day.and_time(NaiveTime::MIN), Duration::days(1))
}

impl Handler<SearchSlots> for PgActor {
    type Result = Result<Vec<TimeSlot>, BookingError>;

    fn handle(&mut self, msg: SearchSlots, _ctx: &mut Self::Context) -> Self::Result {
        let policy = self.1;

        read_only(&self.0, "search slots", |gateway| {
            booking::compute_available_slots(gateway, &msg.search, &policy, msg.now)
        })
    }
}

impl Handler<BookReservation> for PgActor {
    type Result = Result<Reservation, BookingError>;

    fn handle(&mut self, msg: BookReservation, _ctx: &mut Self::Context) -> Self::Result {
        let policy = self.1;

        in_booking_transaction(&self.0, "book reservation", |gateway| {
            booking::allocate_tables_and_book(gateway, &msg.request, &policy, msg.now, &mut rand::rng())
        })
    }
}

impl Handler<EditReservation> for PgActor {
    type Result = Result<Reservation, BookingError>;

    fn handle(&mut self, msg: EditReservation, _ctx: &mut Self::Context) -> Self::Result {
        let policy = self.1;

        in_booking_transaction(&self.0, "edit reservation", |gateway| {
            booking::edit_reservation(gateway, msg.reservation_id, &msg.request, &policy, msg.now)
        })
    }
}

impl Handler<AdvanceReservationStatus> for PgActor {
    type Result = Result<Reservation, BookingError>;

    fn handle(&mut self, msg: AdvanceReservationStatus, _ctx: &mut Self::Context) -> Self::Result {
        in_booking_transaction(&self.0, "advance reservation status", |gateway| {
            booking::transition_reservation_status(gateway, msg.reservation_id, msg.now)
        })
    }
}

impl Handler<DeleteReservation> for PgActor {
    type Result = Result<(), BookingError>;

    fn handle(&mut self, msg: DeleteReservation, _ctx: &mut Self::Context) -> Self::Result {
        in_booking_transaction(&self.0, "delete reservation", |gateway| {
            booking::delete_reservation(gateway, msg.0)
        })
    }
}

impl Handler<FetchReservation> for PgActor {
    type Result = Result<ReservationDetails, BookingError>;

    fn handle(&mut self, msg: FetchReservation, _ctx: &mut Self::Context) -> Self::Result {
        read_only(&self.0, "fetch reservation", |gateway| {
            gateway
                .reservation_details(msg.0)?
                .ok_or(BookingError::NotFound("Reservation", msg.0))
        })
    }
}

impl Handler<FetchReservationsForDay> for PgActor {
    type Result = Result<Vec<ReservationDetails>, BookingError>;

    fn handle(&mut self, msg: FetchReservationsForDay, _ctx: &mut Self::Context) -> Self::Result {
        read_only(&self.0, "fetch reservations for day", |gateway| {
            gateway.reservations_starting_within(&day_range(msg.0))
        })
    }
}

impl Handler<FetchGuestReservations> for PgActor {
    type Result = Result<Vec<ReservationDetails>, BookingError>;

    fn handle(&mut self, msg: FetchGuestReservations, _ctx: &mut Self::Context) -> Self::Result {
        read_only(&self.0, "fetch guest reservations", |gateway| {
            gateway.reservations_for_email(&msg.0)
        })
    }
}

impl Handler<FetchSittingsForDay> for PgActor {
    type Result = Result<Vec<Sitting>, BookingError>;

    fn handle(&mut self, msg: FetchSittingsForDay, _ctx: &mut Self::Context) -> Self::Result {
        in_booking_transaction(&self.0, "fetch sittings for day", |gateway| {
            let mut sittings = gateway.sittings_starting_within(&day_range(msg.day))?;

            let elapsed: Vec<i64> = sittings
                .iter()
                .filter(|s| !s.closed && s.has_ended(msg.now))
                .map(|s| s.id)
                .collect();

            if !elapsed.is_empty() {
                gateway.close_sittings(&elapsed)?;
                for sitting in sittings.iter_mut().filter(|s| elapsed.contains(&s.id)) {
                    sitting.closed = true;
                }
                info!(closed = ?elapsed, "Closed elapsed sittings");
            }

            Ok(sittings)
        })
    }
}

impl Handler<CreateSitting> for PgActor {
    type Result = Result<Sitting, BookingError>;

    fn handle(&mut self, msg: CreateSitting, _ctx: &mut Self::Context) -> Self::Result {
        let new_sitting = msg.0;

        in_booking_transaction(&self.0, "create sitting", |gateway| {
            let window = TimeRange::new(new_sitting.start_at, new_sitting.end_at)?;
            if new_sitting.capacity < 0 {
                return Err(BookingError::Validation("Capacity cannot be negative".into()));
            }

            let existing = gateway.sittings_of_restaurant_overlapping(&window, new_sitting.restaurant_id)?;
            if find_overlapping_sitting(&existing, new_sitting.restaurant_id, &window).is_some() {
                return Err(BookingError::SittingOverlap);
            }

            let created = gateway.insert_sitting(&new_sitting)?;
            info!(sitting_id = created.id, name = %created.name, "Sitting created");

            Ok(created)
        })
    }
}

impl Handler<CloseSitting> for PgActor {
    type Result = Result<(), BookingError>;

    fn handle(&mut self, msg: CloseSitting, _ctx: &mut Self::Context) -> Self::Result {
        in_booking_transaction(&self.0, "close sitting", |gateway| {
            match gateway.close_sittings(&[msg.0])? {
                0 => Err(BookingError::NotFound("Sitting", msg.0)),
                _ => Ok(()),
            }
        })
    }
}

impl Handler<DeleteSitting> for PgActor {
    type Result = Result<(), BookingError>;

    fn handle(&mut self, msg: DeleteSitting, _ctx: &mut Self::Context) -> Self::Result {
        in_booking_transaction(&self.0, "delete sitting", |gateway| gateway.delete_sitting(msg.0))
    }
}

impl Handler<FetchTables> for PgActor {
    type Result = Result<Vec<RestaurantTable>, BookingError>;

    fn handle(&mut self, msg: FetchTables, _ctx: &mut Self::Context) -> Self::Result {
        read_only(&self.0, "fetch tables", |gateway| gateway.list_tables(msg.0))
    }
}

impl Handler<FetchFreeTables> for PgActor {
    type Result = Result<Vec<RestaurantTable>, BookingError>;

    fn handle(&mut self, msg: FetchFreeTables, _ctx: &mut Self::Context) -> Self::Result {
        let policy = self.1;

        read_only(&self.0, "fetch free tables", |gateway| {
            booking::free_tables(gateway, msg.restaurant_id, msg.start, msg.exclude, &policy)
        })
    }
}
