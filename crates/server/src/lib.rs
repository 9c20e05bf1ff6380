use api_types::ErrorBody;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};

pub use server::{ServerState, router, run_with_listener};

mod bookings;
mod expenses;
mod finance;
mod fleet;
mod packages;
mod reports;
mod server;

pub mod types {
    pub mod booking {
        pub use api_types::booking::{
            BookingCancelled, BookingList, BookingListResponse, BookingNew, BookingUpdate,
            BookingView, FinancialsView, PaymentStatus, PaymentStatusUpdate,
        };
    }

    pub mod fleet {
        pub use api_types::fleet::{AvailabilityUpdate, DriverNew, VehicleNew};
        pub use engine::{Driver, Vehicle};
    }

    pub mod catalog {
        pub use api_types::expense::{ExpenseList, ExpenseNew};
        pub use engine::{Expense, ServicePackage};
    }

    pub mod stats {
        pub use api_types::stats::{DashboardQuery, ReportQuery};
        pub use engine::{DashboardStats, ReportSummary};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Store => "store",
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, kind, error) = match self {
            ServerError::Engine(err) => {
                let kind = err.kind();
                (
                    status_for_kind(kind),
                    kind_label(kind),
                    message_for_engine_error(err),
                )
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, "validation", err),
        };

        (
            status,
            Json(ErrorBody {
                kind: kind.to_string(),
                error,
            }),
        )
            .into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DbErr;

    use super::*;

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflicts_map_to_409() {
        for err in [
            EngineError::ExistingKey("x".to_string()),
            EngineError::Unavailable("x".to_string()),
            EngineError::InUse("x".to_string()),
        ] {
            assert_eq!(ServerError::from(err).into_response().status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn store_errors_map_to_500() {
        let err = EngineError::Database(DbErr::Custom("disk full".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
