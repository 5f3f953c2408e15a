use actix_web::{get, HttpResponse, Responder};

pub mod booking;
pub mod bootstrap;
pub mod db_models;
pub mod db_utils;
pub mod gateway;
pub mod messages;
pub mod insertable;
pub mod pg_handling;

#[get("/")]
pub async fn home_page() -> impl Responder {
    HttpResponse::Ok().body("Bean Scene reservations service")
}

// sub-route "/reservations"
pub mod reservations_route {
    use actix_web::{delete, get, post, put, HttpResponse, Responder, ResponseError};
    use actix_web::web::{Data, Json, Path};
    use chrono::{Local, NaiveDate};

    use crate::services::booking::{BookingRequest, EditRequest, SlotSearch};
    use crate::services::db_utils::AppState;
    use crate::services::messages::{
        AdvanceReservationStatus, BookReservation, DeleteReservation, EditReservation, FetchGuestReservations,
        FetchReservation, FetchReservationsForDay, SearchSlots,
    };

    #[post("/search")]
    pub async fn search_slots(state: Data<AppState>, body: Json<SlotSearch>) -> impl Responder {
        let now = Local::now().naive_local();

        match state.pg_db.send(SearchSlots { search: body.into_inner(), now }).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[post("/book")]
    pub async fn book(state: Data<AppState>, body: Json<BookingRequest>) -> impl Responder {
        let now = Local::now().naive_local();

        match state.pg_db.send(BookReservation { request: body.into_inner(), now }).await {
            Ok(Ok(resp)) => HttpResponse::Created().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[put("/{reservation_id}")]
    pub async fn edit(state: Data<AppState>, path: Path<i64>, body: Json<EditRequest>) -> impl Responder {
        let reservation_id = path.into_inner();
        let now = Local::now().naive_local();

        match state.pg_db.send(EditReservation { reservation_id, request: body.into_inner(), now }).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[post("/{reservation_id}/advance")]
    pub async fn advance_status(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        let reservation_id = path.into_inner();
        let now = Local::now().naive_local();

        match state.pg_db.send(AdvanceReservationStatus { reservation_id, now }).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[delete("/{reservation_id}")]
    pub async fn delete_reservation(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        let reservation_id = path.into_inner();

        match state.pg_db.send(DeleteReservation(reservation_id)).await {
            Ok(Ok(_)) => HttpResponse::NoContent().finish(),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[get("/day/{date}")]
    pub async fn reservations_for_day(state: Data<AppState>, path: Path<NaiveDate>) -> impl Responder {
        match state.pg_db.send(FetchReservationsForDay(path.into_inner())).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[get("/guest/{email}")]
    pub async fn guest_reservations(state: Data<AppState>, path: Path<String>) -> impl Responder {
        match state.pg_db.send(FetchGuestReservations(path.into_inner())).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[get("/{reservation_id}")]
    pub async fn reservation_details(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        match state.pg_db.send(FetchReservation(path.into_inner())).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }
}

// sub-route "/sittings"
pub mod sittings_route {
    use actix_web::{delete, get, post, HttpResponse, Responder, ResponseError};
    use actix_web::web::{Data, Json, Path};
    use chrono::{Local, NaiveDate, NaiveDateTime};
    use serde::Deserialize;

    use crate::allocation::model::SittingType;
    use crate::services::db_utils::AppState;
    use crate::services::insertable::NewSitting;
    use crate::services::messages::{CloseSitting, CreateSitting, DeleteSitting, FetchSittingsForDay};

    #[get("/day/{date}")]
    pub async fn sittings_for_day(state: Data<AppState>, path: Path<NaiveDate>) -> impl Responder {
        let day = path.into_inner();
        let now = Local::now().naive_local();

        match state.pg_db.send(FetchSittingsForDay { day, now }).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[derive(Deserialize)]
    pub struct CreateSittingBody {
        pub restaurant_id: i64,
        pub name: String,
        pub start: NaiveDateTime,
        pub end: NaiveDateTime,
        pub capacity: i32,
        pub sitting_type: SittingType,
    }

    impl From<CreateSittingBody> for NewSitting {
        fn from(body: CreateSittingBody) -> Self {
            NewSitting {
                restaurant_id: body.restaurant_id,
                name: body.name,
                start_at: body.start,
                end_at: body.end,
                capacity: body.capacity,
                closed: false,
                sitting_type: body.sitting_type.to_string(),
            }
        }
    }

    #[post("/create")]
    pub async fn create_sitting(state: Data<AppState>, body: Json<CreateSittingBody>) -> impl Responder {
        match state.pg_db.send(CreateSitting(body.into_inner().into())).await {
            Ok(Ok(resp)) => HttpResponse::Created().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[post("/{sitting_id}/close")]
    pub async fn close_sitting(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        let sitting_id = path.into_inner();

        match state.pg_db.send(CloseSitting(sitting_id)).await {
            Ok(Ok(_)) => HttpResponse::Ok().json(format!("Sitting with id {sitting_id} is closed")),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[delete("/{sitting_id}")]
    pub async fn delete_sitting(state: Data<AppState>, path: Path<i64>) -> impl Responder {
        match state.pg_db.send(DeleteSitting(path.into_inner())).await {
            Ok(Ok(_)) => HttpResponse::NoContent().finish(),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }
}

// sub-route "/tables"
pub mod tables_route {
    use actix_web::{get, HttpResponse, Responder, ResponseError};
    use actix_web::web::{Data, Query};
    use chrono::NaiveDateTime;
    use serde::Deserialize;

    use crate::services::db_utils::AppState;
    use crate::services::messages::{FetchFreeTables, FetchTables};

    #[derive(Deserialize)]
    pub struct RestaurantFilter {
        pub restaurant_id: Option<i64>,
    }

    #[get("/all")]
    pub async fn fetch_tables(state: Data<AppState>, query: Query<RestaurantFilter>) -> impl Responder {
        match state.pg_db.send(FetchTables(query.restaurant_id)).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }

    #[derive(Deserialize)]
    pub struct FreeTablesQuery {
        pub start: NaiveDateTime,
        pub exclude: Option<i64>,
        pub restaurant_id: Option<i64>,
    }

    #[get("/available")]
    pub async fn fetch_free_tables(state: Data<AppState>, query: Query<FreeTablesQuery>) -> impl Responder {
        let query = query.into_inner();

        match state.pg_db.send(FetchFreeTables {
            restaurant_id: query.restaurant_id,
            start: query.start,
            exclude: query.exclude,
        }).await {
            Ok(Ok(resp)) => HttpResponse::Ok().json(resp),
            Ok(Err(err)) => err.error_response(),
            Err(err) => HttpResponse::InternalServerError().json(format!("Unable to perform action: {err}"))
        }
    }
}

// sub-route "/test"
pub mod test_route {
    use actix_web::{get, HttpResponse, Responder};

    #[get("/healthcheck")]
    pub async fn healthcheck() -> impl Responder {
        HttpResponse::Ok().body("I'm alive!")
    }
}
