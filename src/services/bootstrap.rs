use diesel::{PgConnection, RunQueryDsl};
use tracing::info;

use crate::allocation::lifecycle::ReservationStatus;
use crate::services::insertable::{NewRole, StatusSeed};
use crate::types::BookingError;

pub const ROLES: [&str; 4] = ["Member", "Admin", "Staff", "Manager"];

/// Inserts reservation statuses and roles that are missing. Safe to run on
/// every start.
pub fn ensure_reference_data(conn: &mut PgConnection) -> Result<(), BookingError> {
    use crate::schema::reservation_statuses::dsl::reservation_statuses;
    use crate::schema::roles::dsl::roles;

    let statuses: Vec<StatusSeed> = ReservationStatus::ALL
        .iter()
        .map(|s| StatusSeed { id: s.id(), name: s.name().to_owned() })
        .collect();
    let new_roles: Vec<NewRole> = ROLES.iter().map(|name| NewRole { name: (*name).to_owned() }).collect();

    conn.build_transaction().run(|trx_conn| {
        let added_statuses = diesel::insert_into(reservation_statuses)
            .values(&statuses)
            .on_conflict_do_nothing()
            .execute(trx_conn)?;

        let added_roles = diesel::insert_into(roles)
            .values(&new_roles)
            .on_conflict_do_nothing()
            .execute(trx_conn)?;

        info!(added_statuses, added_roles, "Reference data ensured");

        Ok(())
    })
}
