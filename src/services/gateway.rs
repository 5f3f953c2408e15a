use std::collections::HashMap;

use diesel::sql_types::Text;
use diesel::{
    define_sql_function, BoolExpressionMethods, ExpressionMethods, OptionalExtension, PgConnection,
    QueryDsl, RunQueryDsl, SelectableHelper,
};

use crate::allocation::lifecycle::ReservationStatus;
use crate::allocation::model::{Person, PersonDetails, Reservation, RestaurantTable, Sitting, TimeRange};
use crate::services::db_models::{PersonRow, ReservationDetails, ReservationRow, SittingRow, TableRow};
use crate::services::insertable::{
    NewPerson, NewReservation, NewSitting, ReservationChanges, ReservationTableLink,
};
use crate::types::BookingError;

define_sql_function!(fn lower(x: Text) -> Text);

/// Form an email is compared in, matching `LOWER(email)` on a trimmed value.
fn email_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Reads and writes the booking operations need. Sittings and tables come back
/// with their reservations already attached.
pub trait Gateway {
    fn list_sittings_overlapping(
        &mut self,
        window: &TimeRange,
        restaurant_id: Option<i64>,
    ) -> Result<Vec<Sitting>, BookingError>;

    fn find_sitting(&mut self, id: i64) -> Result<Option<Sitting>, BookingError>;

    fn list_tables(&mut self, restaurant_id: Option<i64>) -> Result<Vec<RestaurantTable>, BookingError>;

    /// Case-insensitive.
    fn find_person_by_email(&mut self, email: &str) -> Result<Option<Person>, BookingError>;

    fn create_person(&mut self, details: &PersonDetails) -> Result<Person, BookingError>;

    fn find_reservation(&mut self, id: i64) -> Result<Option<Reservation>, BookingError>;

    /// Inserts `draft` (its `id` is ignored) together with its table links.
    fn insert_reservation(&mut self, draft: &Reservation) -> Result<Reservation, BookingError>;

    /// Overwrites the stored reservation and replaces its table links.
    fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), BookingError>;

    fn delete_reservation(&mut self, id: i64) -> Result<bool, BookingError>;
}

pub struct PgGateway<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgGateway<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        PgGateway { conn }
    }

    fn table_links(&mut self, reservation_ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>, BookingError> {
        use crate::schema::reservation_tables::dsl::{reservation_id, reservation_tables, table_id};

        let links = reservation_tables
            .filter(reservation_id.eq_any(reservation_ids))
            .select((reservation_id, table_id))
            .order(table_id)
            .load::<(i64, i64)>(self.conn)?;

        let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
        for (res_id, tbl_id) in links {
            grouped.entry(res_id).or_default().push(tbl_id);
        }

        Ok(grouped)
    }

    fn attach_tables(&mut self, rows: Vec<ReservationRow>) -> Result<Vec<Reservation>, BookingError> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut links = self.table_links(&ids)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let tables = links.remove(&row.id).unwrap_or_default();
                row.into_reservation(tables)
            })
            .collect())
    }

    fn reservations_by_sitting(&mut self, sitting_ids: &[i64]) -> Result<HashMap<i64, Vec<Reservation>>, BookingError> {
        use crate::schema::reservations::dsl::{reservations, sitting_id, start_at};

        let rows: Vec<ReservationRow> = reservations
            .filter(sitting_id.eq_any(sitting_ids))
            .order(start_at)
            .select(ReservationRow::as_select())
            .load(self.conn)?;

        let mut grouped: HashMap<i64, Vec<Reservation>> = HashMap::new();
        for reservation in self.attach_tables(rows)? {
            grouped.entry(reservation.sitting_id).or_default().push(reservation);
        }

        Ok(grouped)
    }

    fn with_reservations(&mut self, rows: Vec<SittingRow>) -> Result<Vec<Sitting>, BookingError> {
        let ids: Vec<i64> = rows.iter().map(|s| s.id).collect();
        let mut grouped = self.reservations_by_sitting(&ids)?;

        rows.into_iter()
            .map(|row| {
                let booked = grouped.remove(&row.id).unwrap_or_default();
                row.into_sitting(booked)
            })
            .collect()
    }

    fn replace_table_links(&mut self, res_id: i64, table_ids: &[i64]) -> Result<(), BookingError> {
        use crate::schema::reservation_tables::dsl::{reservation_id, reservation_tables};

        diesel::delete(reservation_tables.filter(reservation_id.eq(res_id))).execute(self.conn)?;

        let links: Vec<ReservationTableLink> = table_ids
            .iter()
            .map(|&table_id| ReservationTableLink { reservation_id: res_id, table_id })
            .collect();

        if !links.is_empty() {
            diesel::insert_into(reservation_tables).values(&links).execute(self.conn)?;
        }

        Ok(())
    }

    pub fn sittings_starting_within(&mut self, range: &TimeRange) -> Result<Vec<Sitting>, BookingError> {
        use crate::schema::sittings::dsl::{sittings, start_at};

        let rows: Vec<SittingRow> = sittings
            .filter(start_at.ge(range.start).and(start_at.lt(range.end)))
            .order(start_at)
            .select(SittingRow::as_select())
            .load(self.conn)?;

        self.with_reservations(rows)
    }

    pub fn close_sittings(&mut self, ids: &[i64]) -> Result<usize, BookingError> {
        use crate::schema::sittings::dsl::{closed, id, sittings};

        Ok(diesel::update(sittings.filter(id.eq_any(ids)))
            .set(closed.eq(true))
            .execute(self.conn)?)
    }

    pub fn sittings_of_restaurant_overlapping(
        &mut self,
        window: &TimeRange,
        restaurant: i64,
    ) -> Result<Vec<Sitting>, BookingError> {
        use crate::schema::sittings::dsl::{end_at, restaurant_id, sittings, start_at};

        let rows: Vec<SittingRow> = sittings
            .filter(restaurant_id.eq(restaurant))
            .filter(start_at.lt(window.end).and(end_at.gt(window.start)))
            .select(SittingRow::as_select())
            .load(self.conn)?;

        rows.into_iter().map(|row| row.into_sitting(vec![])).collect()
    }

    pub fn insert_sitting(&mut self, new_sitting: &NewSitting) -> Result<Sitting, BookingError> {
        use crate::schema::sittings::dsl::sittings;

        let row: SittingRow = diesel::insert_into(sittings)
            .values(new_sitting)
            .returning(SittingRow::as_returning())
            .get_result(self.conn)?;

        row.into_sitting(vec![])
    }

    pub fn delete_sitting(&mut self, sitting: i64) -> Result<(), BookingError> {
        use crate::schema::reservations::dsl::{reservations, sitting_id};
        use crate::schema::sittings::dsl::sittings;

        let booked = reservations.filter(sitting_id.eq(sitting)).count().get_result::<i64>(self.conn)?;
        if booked > 0 {
            return Err(BookingError::SittingInUse(sitting));
        }

        match diesel::delete(sittings.find(sitting)).execute(self.conn)? {
            0 => Err(BookingError::NotFound("Sitting", sitting)),
            _ => Ok(()),
        }
    }

    pub fn reservations_starting_within(&mut self, range: &TimeRange) -> Result<Vec<ReservationDetails>, BookingError> {
        use crate::schema::reservations::dsl::{reservations, start_at};

        let rows: Vec<ReservationRow> = reservations
            .filter(start_at.ge(range.start).and(start_at.lt(range.end)))
            .order(start_at)
            .select(ReservationRow::as_select())
            .load(self.conn)?;

        self.details(rows)
    }

    pub fn reservations_for_email(&mut self, guest_email: &str) -> Result<Vec<ReservationDetails>, BookingError> {
        use crate::schema::persons::dsl::{email, persons};
        use crate::schema::reservations::dsl::{reservations, start_at};

        let rows: Vec<ReservationRow> = reservations
            .inner_join(persons)
            .filter(lower(email).eq(email_key(guest_email)))
            .order(start_at.desc())
            .select(ReservationRow::as_select())
            .load(self.conn)?;

        self.details(rows)
    }

    pub fn reservation_details(&mut self, res_id: i64) -> Result<Option<ReservationDetails>, BookingError> {
        use crate::schema::reservations::dsl::reservations;

        let rows: Vec<ReservationRow> = reservations
            .find(res_id)
            .select(ReservationRow::as_select())
            .load(self.conn)?;

        Ok(self.details(rows)?.pop())
    }

    fn details(&mut self, rows: Vec<ReservationRow>) -> Result<Vec<ReservationDetails>, BookingError> {
        use crate::schema::persons::dsl::{id as person_pk, persons};
        use crate::schema::restaurant_tables::dsl::{id as table_pk, label, restaurant_tables};
        use crate::schema::sittings::dsl::{id as sitting_pk, name, sittings};

        let booked = self.attach_tables(rows)?;

        let person_ids: Vec<i64> = booked.iter().map(|r| r.person_id).collect();
        let sitting_ids: Vec<i64> = booked.iter().map(|r| r.sitting_id).collect();
        let table_ids: Vec<i64> = booked.iter().flat_map(|r| r.table_ids.iter().copied()).collect();

        let guests: HashMap<i64, Person> = persons
            .filter(person_pk.eq_any(&person_ids))
            .select(PersonRow::as_select())
            .load::<PersonRow>(self.conn)?
            .into_iter()
            .map(|row| (row.id, Person::from(row)))
            .collect();

        let sitting_names: HashMap<i64, String> = sittings
            .filter(sitting_pk.eq_any(&sitting_ids))
            .select((sitting_pk, name))
            .load::<(i64, String)>(self.conn)?
            .into_iter()
            .collect();

        let table_labels: HashMap<i64, String> = restaurant_tables
            .filter(table_pk.eq_any(&table_ids))
            .select((table_pk, label))
            .load::<(i64, String)>(self.conn)?
            .into_iter()
            .collect();

        booked
            .into_iter()
            .map(|reservation| {
                let person = guests
                    .get(&reservation.person_id)
                    .cloned()
                    .ok_or(BookingError::NotFound("Person", reservation.person_id))?;
                let status = reservation.status().map_or("Unknown", ReservationStatus::name);

                Ok::<_, BookingError>(ReservationDetails {
                    end: reservation.end(),
                    status,
                    person,
                    sitting_name: sitting_names.get(&reservation.sitting_id).cloned().unwrap_or_default(),
                    table_labels: reservation
                        .table_ids
                        .iter()
                        .filter_map(|t| table_labels.get(t).cloned())
                        .collect(),
                    reservation,
                })
            })
            .collect()
    }
}

impl Gateway for PgGateway<'_> {
    fn list_sittings_overlapping(
        &mut self,
        window: &TimeRange,
        restaurant: Option<i64>,
    ) -> Result<Vec<Sitting>, BookingError> {
        use crate::schema::sittings::dsl::{closed, end_at, restaurant_id, sittings, start_at};

        let mut query = sittings
            .filter(start_at.lt(window.end).and(end_at.gt(window.start)))
            .filter(closed.eq(false))
            .order(start_at)
            .select(SittingRow::as_select())
            .into_boxed();

        if let Some(restaurant) = restaurant {
            query = query.filter(restaurant_id.eq(restaurant));
        }

        let rows: Vec<SittingRow> = query.load(self.conn)?;

        self.with_reservations(rows)
    }

    fn find_sitting(&mut self, sitting: i64) -> Result<Option<Sitting>, BookingError> {
        use crate::schema::sittings::dsl::sittings;

        let row: Option<SittingRow> = sittings
            .find(sitting)
            .select(SittingRow::as_select())
            .first(self.conn)
            .optional()?;

        match row {
            Some(row) => Ok(self.with_reservations(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn list_tables(&mut self, restaurant: Option<i64>) -> Result<Vec<RestaurantTable>, BookingError> {
        use crate::schema::reservation_tables::dsl::{reservation_id, reservation_tables, table_id};
        use crate::schema::reservations::dsl::{id as reservation_pk, reservations};
        use crate::schema::restaurant_areas::dsl::{restaurant_areas, restaurant_id};
        use crate::schema::restaurant_tables::dsl::{id as table_pk, restaurant_tables};

        let mut query = restaurant_tables
            .inner_join(restaurant_areas)
            .order(table_pk)
            .select(TableRow::as_select())
            .into_boxed();

        if let Some(restaurant) = restaurant {
            query = query.filter(restaurant_id.eq(restaurant));
        }

        let rows: Vec<TableRow> = query.load(self.conn)?;
        let ids: Vec<i64> = rows.iter().map(|t| t.id).collect();

        let links = reservation_tables
            .filter(table_id.eq_any(&ids))
            .select((table_id, reservation_id))
            .load::<(i64, i64)>(self.conn)?;
        let linked_ids: Vec<i64> = links.iter().map(|(_, r)| *r).collect();

        let linked_rows: Vec<ReservationRow> = reservations
            .filter(reservation_pk.eq_any(&linked_ids))
            .select(ReservationRow::as_select())
            .load(self.conn)?;
        let by_id: HashMap<i64, Reservation> = self
            .attach_tables(linked_rows)?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut per_table: HashMap<i64, Vec<Reservation>> = HashMap::new();
        for (tbl, res) in links {
            if let Some(reservation) = by_id.get(&res) {
                per_table.entry(tbl).or_default().push(reservation.clone());
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let booked = per_table.remove(&row.id).unwrap_or_default();
                row.into_table(booked)
            })
            .collect())
    }

    fn find_person_by_email(&mut self, guest_email: &str) -> Result<Option<Person>, BookingError> {
        use crate::schema::persons::dsl::{email, persons};

        let row: Option<PersonRow> = persons
            .filter(lower(email).eq(email_key(guest_email)))
            .select(PersonRow::as_select())
            .first(self.conn)
            .optional()?;

        Ok(row.map(Person::from))
    }

    fn create_person(&mut self, details: &PersonDetails) -> Result<Person, BookingError> {
        use crate::schema::persons::dsl::persons;

        let row: PersonRow = diesel::insert_into(persons)
            .values(NewPerson {
                name: details.name.clone(),
                phone: details.phone.clone(),
                email: details.email.trim().to_owned(),
            })
            .returning(PersonRow::as_returning())
            .get_result(self.conn)?;

        Ok(row.into())
    }

    fn find_reservation(&mut self, res_id: i64) -> Result<Option<Reservation>, BookingError> {
        use crate::schema::reservations::dsl::reservations;

        let row: Option<ReservationRow> = reservations
            .find(res_id)
            .select(ReservationRow::as_select())
            .first(self.conn)
            .optional()?;

        match row {
            Some(row) => Ok(self.attach_tables(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn insert_reservation(&mut self, draft: &Reservation) -> Result<Reservation, BookingError> {
        use crate::schema::reservations::dsl::reservations;

        let row: ReservationRow = diesel::insert_into(reservations)
            .values(NewReservation {
                sitting_id: draft.sitting_id,
                person_id: draft.person_id,
                status_id: draft.status_id,
                start_at: draft.start,
                duration_minutes: draft.duration_minutes,
                pax: draft.pax,
                notes: draft.notes.clone(),
            })
            .returning(ReservationRow::as_returning())
            .get_result(self.conn)?;

        self.replace_table_links(row.id, &draft.table_ids)?;

        Ok(row.into_reservation(draft.table_ids.clone()))
    }

    fn update_reservation(&mut self, reservation: &Reservation) -> Result<(), BookingError> {
        use crate::schema::reservations::dsl::reservations;

        let updated = diesel::update(reservations.find(reservation.id))
            .set(ReservationChanges {
                sitting_id: reservation.sitting_id,
                person_id: reservation.person_id,
                status_id: reservation.status_id,
                start_at: reservation.start,
                duration_minutes: reservation.duration_minutes,
                pax: reservation.pax,
                notes: reservation.notes.clone(),
            })
            .execute(self.conn)?;

        if updated == 0 {
            return Err(BookingError::NotFound("Reservation", reservation.id));
        }

        self.replace_table_links(reservation.id, &reservation.table_ids)
    }

    fn delete_reservation(&mut self, res_id: i64) -> Result<bool, BookingError> {
        use crate::schema::reservations::dsl::reservations;

        let deleted = diesel::delete(reservations.find(res_id)).execute(self.conn)?;

        Ok(deleted > 0)
    }
}
