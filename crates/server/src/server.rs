use axum::{
    Router,
    routing::{get, post, put},
};

use std::sync::Arc;

use crate::{bookings, expenses, finance, fleet, packages, reports};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };
    Router::new()
        .route("/bookings", post(bookings::create).get(bookings::list))
        .route(
            "/bookings/{id}",
            get(bookings::get)
                .patch(bookings::update)
                .delete(bookings::cancel),
        )
        .route(
            "/bookings/{id}/payment-status",
            put(bookings::set_payment_status),
        )
        .route("/bookings/{id}/financials", get(bookings::financials))
        .route("/financials/compute", post(finance::compute))
        .route("/financials/validate", post(finance::validate))
        .route("/pricing/validate", post(finance::validate_tier))
        .route("/vehicles", get(fleet::list_vehicles).post(fleet::vehicle_new))
        .route(
            "/vehicles/{id}/availability",
            put(fleet::set_vehicle_availability),
        )
        .route("/vehicles/{id}", axum::routing::delete(fleet::delete_vehicle))
        .route("/drivers", get(fleet::list_drivers).post(fleet::driver_new))
        .route(
            "/drivers/{id}/availability",
            put(fleet::set_driver_availability),
        )
        .route("/drivers/{id}", axum::routing::delete(fleet::delete_driver))
        .route("/packages", get(packages::list).post(packages::create))
        .route(
            "/packages/{id}",
            get(packages::get)
                .put(packages::update)
                .delete(packages::delete),
        )
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route("/expenses/{id}", axum::routing::delete(expenses::delete))
        .route("/stats/dashboard", get(reports::dashboard))
        .route("/reports/summary", get(reports::summary))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}
