use actix::{Actor, Addr, SyncContext};
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error};
use diesel::PgConnection;

use crate::allocation::model::BookingPolicy;
use crate::types::PoolInitializationError;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub struct PgActor(pub PgPool, pub BookingPolicy);

pub struct AppState {
    pub pg_db: Addr<PgActor>,
}

impl Actor for PgActor {
    type Context = SyncContext<Self>;
}

pub fn get_db_pool(db_url: &str, max_size: u32) -> Result<PgPool, PoolInitializationError> {
    let manager: ConnectionManager<PgConnection> = ConnectionManager::<PgConnection>::new(db_url);
    match Pool::builder().max_size(max_size).build(manager) {
        Ok(val) => Ok(val),
        Err(err) => Err(PoolInitializationError(err.to_string()))
    }
}

pub fn establish_connection(pool: &PgPool) -> Result<PooledConnection<ConnectionManager<PgConnection>>, Error> {
    match pool.get() {
        Ok(val) => Ok(val),
        Err(_) => Err(connection_err()),
    }
}

fn connection_err() -> Error {
    Error::DatabaseError(
        DatabaseErrorKind::ClosedConnection,
        Box::new("Failed to establish connection".to_owned()),
    )
}
