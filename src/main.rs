use actix::{Addr, SyncArbiter};
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use tracing::info;

use settings::Settings;
use services::bootstrap::ensure_reference_data;
use services::db_utils::{establish_connection, get_db_pool, AppState, PgActor};

mod allocation;
mod logger;
mod schema;
mod services;
mod settings;
mod types;

fn init_pg_db(settings: &Settings) -> Addr<PgActor> {
    if settings.database.url.is_empty() {
        panic!("PG_DATABASE_URL or APP__DATABASE__URL must be set");
    }

    let policy = settings.booking_policy().expect("Booking settings are invalid");
    let pool = get_db_pool(&settings.database.url, settings.database.pool_size)
        .expect("Unable to build database pool");

    let mut conn = establish_connection(&pool).expect("Unable to reach the database");
    ensure_reference_data(&mut conn).expect("Unable to seed reference data");

    info!(pool_size = settings.database.pool_size, ?policy, "Database ready");

    SyncArbiter::start(settings.database.pool_size as usize, move || PgActor(pool.clone(), policy))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    let settings = Settings::load().expect("Unable to load settings");
    logger::init_logger(&settings.log.level);

    let pg_db = init_pg_db(&settings);
    let address = settings.bind_address();
    info!(host = %address.0, port = address.1, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
            .app_data(Data::new(AppState { pg_db: pg_db.clone() }))
            .service(services::home_page)
            .service(
                web::scope("/reservations")
                    .service(services::reservations_route::search_slots)
                    .service(services::reservations_route::book)
                    .service(services::reservations_route::reservations_for_day)
                    .service(services::reservations_route::guest_reservations)
                    .service(services::reservations_route::advance_status)
                    .service(services::reservations_route::edit)
                    .service(services::reservations_route::delete_reservation)
                    .service(services::reservations_route::reservation_details)
            )
            .service(
                web::scope("/sittings")
                    .service(services::sittings_route::sittings_for_day)
                    .service(services::sittings_route::create_sitting)
                    .service(services::sittings_route::close_sitting)
                    .service(services::sittings_route::delete_sitting)
            )
            .service(
                web::scope("/tables")
                    .service(services::tables_route::fetch_tables)
                    .service(services::tables_route::fetch_free_tables)
            )
            .service(
                web::scope("/test")
                    .service(services::test_route::healthcheck)
            )
    })
        .bind(address)?
        .run()
        .await
}
