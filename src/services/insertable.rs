use chrono::NaiveDateTime;
use diesel::{AsChangeset, Insertable};
use serde::Serialize;

use crate::schema::persons;
use crate::schema::reservation_statuses;
use crate::schema::reservation_tables;
use crate::schema::reservations;
use crate::schema::roles;
use crate::schema::sittings;

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = persons)]
pub struct NewPerson {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = reservations)]
pub struct NewReservation {
    pub sitting_id: i64,
    pub person_id: i64,
    pub status_id: i32,
    pub start_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub pax: i32,
    pub notes: Option<String>,
}

#[derive(AsChangeset, Clone)]
#[diesel(table_name = reservations)]
#[diesel(treat_none_as_null = true)]
pub struct ReservationChanges {
    pub sitting_id: i64,
    pub person_id: i64,
    pub status_id: i32,
    pub start_at: NaiveDateTime,
    pub duration_minutes: i32,
    pub pax: i32,
    pub notes: Option<String>,
}

#[derive(Insertable, Clone, Copy)]
#[diesel(table_name = reservation_tables)]
pub struct ReservationTableLink {
    pub reservation_id: i64,
    pub table_id: i64,
}

#[derive(Insertable, Serialize, Clone)]
#[diesel(table_name = sittings)]
pub struct NewSitting {
    pub restaurant_id: i64,
    pub name: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub capacity: i32,
    pub closed: bool,
    pub sitting_type: String,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = reservation_statuses)]
pub struct StatusSeed {
    pub id: i32,
    pub name: String,
}

#[derive(Insertable, Clone)]
#[diesel(table_name = roles)]
pub struct NewRole {
    pub name: String,
}
