use chrono::NaiveDateTime;
use diesel::{Queryable, Selectable};
use serde::Serialize;

use crate::allocation::model::{Person, Reservation, RestaurantTable, Sitting};
use crate::schema::{persons, reservations, restaurant_tables, sittings};
use crate::types::BookingError;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = sittings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SittingRow {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub capacity: i32,
    pub closed: bool,
    pub sitting_type: String,
}

impl SittingRow {
    pub fn into_sitting(self, reservations: Vec<Reservation>) -> Result<Sitting, BookingError> {
        Ok(Sitting {
            id: self.id,
            restaurant_id: self.restaurant_id,
            name: self.name,
            start: self.start_at,
            end: self.end_at,
            capacity: self.capacity,
            closed: self.closed,
            sitting_type: self.sitting_type.parse()?,
            reservations,
        })
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = reservations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReservationRow {
    pub id: i64,
    pub sitting_id: i64,
    pub person_id: i64,
    pub status_id: i32,
    pub start_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub pax: i32,
    pub notes: Option<String>,
}

impl ReservationRow {
    pub fn into_reservation(self, table_ids: Vec<i64>) -> Reservation {
        Reservation {
            id: self.id,
            sitting_id: self.sitting_id,
            person_id: self.person_id,
            status_id: self.status_id,
            start: self.start_at,
            duration_minutes: self.duration_minutes,
            pax: self.pax,
            notes: self.notes,
            table_ids,
        }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = restaurant_tables)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TableRow {
    pub id: i64,
    pub area_id: i64,
    pub label: String,
}

impl TableRow {
    pub fn into_table(self, reservations: Vec<Reservation>) -> RestaurantTable {
        RestaurantTable { id: self.id, area_id: self.area_id, label: self.label, reservations }
    }
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = persons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PersonRow {
    pub id: i64,
    pub user_id: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Person { id: row.id, user_id: row.user_id, name: row.name, phone: row.phone, email: row.email }
    }
}

/// Staff-facing reservation listing: the reservation plus who booked it and where.
#[derive(Debug, Serialize)]
pub struct ReservationDetails {
    pub reservation: Reservation,
    pub end: NaiveDateTime,
    pub status: &'static str,
    pub person: Person,
    pub sitting_name: String,
    pub table_labels: Vec<String>,
}
