use std::fmt::{Debug, Display, Formatter};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::NaiveDateTime;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;

#[derive(Debug)]
pub struct PoolInitializationError(pub String);

impl Display for PoolInitializationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl std::error::Error for PoolInitializationError {}

/// Every failure the booking core and its persistence layer can report.
///
/// None of these are retried: the caller decides how to surface them.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("No sittings available within the specified range")]
    NoSittingsAvailable,

    #[error("No time slots available within the specified range")]
    NoSlotsAvailable,

    #[error("No tables available for the selected time")]
    NoTablesAvailable,

    #[error("Invalid table selection: {0}")]
    InvalidTableSelection(String),

    #[error("The maximum capacity for this sitting is {capacity}. Only {available} spots are available")]
    CapacityExceeded { capacity: i32, available: i32 },

    #[error("Reservation starts at {start}, status cannot advance before then")]
    TooEarly { start: NaiveDateTime },

    #[error("Invalid reservation status transition from status {0}")]
    InvalidTransition(i32),

    #[error("Booking conflicts with a concurrent change, please search again")]
    Conflict,

    #[error("{0} with id {1} not found")]
    NotFound(&'static str, i64),

    #[error("Sitting {0} is closed")]
    SittingClosed(i64),

    #[error("Sitting {0} still has reservations")]
    SittingInUse(i64),

    #[error("The selected time overlaps with an existing sitting in the restaurant")]
    SittingOverlap,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(DieselError),
}

impl BookingError {
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::NoSittingsAvailable => "no_sittings_available",
            BookingError::NoSlotsAvailable => "no_slots_available",
            BookingError::NoTablesAvailable => "no_tables_available",
            BookingError::InvalidTableSelection(_) => "invalid_table_selection",
            BookingError::CapacityExceeded { .. } => "capacity_exceeded",
            BookingError::TooEarly { .. } => "too_early",
            BookingError::InvalidTransition(_) => "invalid_transition",
            BookingError::Conflict => "conflict",
            BookingError::NotFound(..) => "not_found",
            BookingError::SittingClosed(_) => "sitting_closed",
            BookingError::SittingInUse(_) => "sitting_in_use",
            BookingError::SittingOverlap => "sitting_overlap",
            BookingError::Validation(_) => "validation",
            BookingError::Database(_) => "database",
        }
    }
}

// Serialization failures only come out of SERIALIZABLE transactions, where they
// mean another booking committed first.
impl From<DieselError> for BookingError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                BookingError::Conflict
            }
            other => BookingError::Database(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ResponseError for BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::NotFound(..) => StatusCode::NOT_FOUND,
            BookingError::Conflict
            | BookingError::CapacityExceeded { .. }
            | BookingError::NoTablesAvailable
            | BookingError::SittingInUse(_)
            | BookingError::SittingOverlap
            | BookingError::InvalidTransition(_)
            | BookingError::TooEarly { .. } => StatusCode::CONFLICT,
            BookingError::NoSittingsAvailable
            | BookingError::NoSlotsAvailable
            | BookingError::InvalidTableSelection(_)
            | BookingError::SittingClosed(_)
            | BookingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Database internals stay in the log.
        let message = match self {
            BookingError::Database(_) => "Unable to perform action".to_owned(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody { error: self.kind(), message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_failure_becomes_conflict() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::SerializationFailure,
            Box::new("could not serialize access".to_owned()),
        );

        assert!(matches!(BookingError::from(err), BookingError::Conflict));
    }

    #[test]
    fn other_database_errors_stay_internal() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("Failed to establish connection".to_owned()),
        );
        let booking_err = BookingError::from(err);

        assert_eq!(booking_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(booking_err.kind(), "database");
    }

    #[test]
    fn bare_diesel_not_found_is_internal() {
        let booking_err = BookingError::from(DieselError::NotFound);

        assert!(matches!(booking_err, BookingError::Database(DieselError::NotFound)));
        assert_eq!(booking_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(BookingError::NotFound("Sitting", 4).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(BookingError::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            BookingError::CapacityExceeded { capacity: 40, available: 2 }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            BookingError::InvalidTableSelection("unknown table".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn capacity_message_names_remaining_spots() {
        let err = BookingError::CapacityExceeded { capacity: 40, available: 2 };

        assert_eq!(
            err.to_string(),
            "The maximum capacity for this sitting is 40. Only 2 spots are available"
        );
    }

    #[actix_web::test]
    async fn database_details_stay_out_of_the_body() {
        let err = BookingError::from(DieselError::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new("relation \"sittings\" does not exist".to_owned()),
        ));

        let body = actix_web::body::to_bytes(err.error_response().into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "database");
        assert_eq!(json["message"], "Unable to perform action");
    }
}
