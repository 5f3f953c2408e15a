use actix::Message;
use chrono::{NaiveDate, NaiveDateTime};

use crate::allocation::model::{Reservation, RestaurantTable, Sitting};
use crate::allocation::slots::TimeSlot;
use crate::services::booking::{BookingRequest, EditRequest, SlotSearch};
use crate::services::db_models::ReservationDetails;
use crate::services::insertable::NewSitting;
use crate::types::BookingError;

#[derive(Message)]
#[rtype(result = "Result<Vec<TimeSlot>, BookingError>")]
pub struct SearchSlots {
    pub search: SlotSearch,
    pub now: NaiveDateTime,
}

#[derive(Message)]
#[rtype(result = "Result<Reservation, BookingError>")]
pub struct BookReservation {
    pub request: BookingRequest,
    pub now: NaiveDateTime,
}

#[derive(Message)]
#[rtype(result = "Result<Reservation, BookingError>")]
pub struct EditReservation {
    pub reservation_id: i64,
    pub request: EditRequest,
    pub now: NaiveDateTime,
}

#[derive(Message)]
#[rtype(result = "Result<Reservation, BookingError>")]
pub struct AdvanceReservationStatus {
    pub reservation_id: i64,
    pub now: NaiveDateTime,
}

#[derive(Message)]
#[rtype(result = "Result<(), BookingError>")]
pub struct DeleteReservation(pub i64);

#[derive(Message)]
#[rtype(result = "Result<ReservationDetails, BookingError>")]
pub struct FetchReservation(pub i64);

#[derive(Message)]
#[rtype(result = "Result<Vec<ReservationDetails>, BookingError>")]
pub struct FetchReservationsForDay(pub NaiveDate);

#[derive(Message)]
#[rtype(result = "Result<Vec<ReservationDetails>, BookingError>")]
pub struct FetchGuestReservations(pub String);

#[derive(Message)]
#[rtype(result = "Result<Vec<Sitting>, BookingError>")]
pub struct FetchSittingsForDay {
    pub day: NaiveDate,
    pub now: NaiveDateTime,
}

#[derive(Message)]
#[rtype(result = "Result<Sitting, BookingError>")]
pub struct CreateSitting(pub NewSitting);

#[derive(Message)]
#[rtype(result = "Result<(), BookingError>")]
pub struct CloseSitting(pub i64);

#[derive(Message)]
#[rtype(result = "Result<(), BookingError>")]
pub struct DeleteSitting(pub i64);

#[derive(Message)]
#[rtype(result = "Result<Vec<RestaurantTable>, BookingError>")]
pub struct FetchTables(pub Option<i64>);

#[derive(Message)]
#[rtype(result = "Result<Vec<RestaurantTable>, BookingError>")]
pub struct FetchFreeTables {
    pub restaurant_id: Option<i64>,
    pub start: NaiveDateTime,
    pub exclude: Option<i64>,
}
