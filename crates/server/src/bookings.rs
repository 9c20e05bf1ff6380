//! Bookings API endpoints

use api_types::booking::{
    BookingCancelled, BookingList, BookingListResponse, BookingNew, BookingUpdate, BookingView,
    FinancialsView, PaymentStatus as ApiStatus, PaymentStatusUpdate,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, FixedOffset, Utc};
use engine::{Booking, BookingListFilter, FinancialSummary, Money, NewBookingCmd, UpdateBookingCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

const DEFAULT_PAGE_SIZE: u64 = 50;

fn map_status(status: engine::PaymentStatus) -> ApiStatus {
    match status {
        engine::PaymentStatus::Unpaid => ApiStatus::Unpaid,
        engine::PaymentStatus::DownPayment => ApiStatus::DownPayment,
        engine::PaymentStatus::Paid => ApiStatus::Paid,
    }
}

fn engine_status(status: ApiStatus) -> engine::PaymentStatus {
    match status {
        ApiStatus::Unpaid => engine::PaymentStatus::Unpaid,
        ApiStatus::DownPayment => engine::PaymentStatus::DownPayment,
        ApiStatus::Paid => engine::PaymentStatus::Paid,
    }
}

fn to_utc(dt: DateTime<FixedOffset>) -> DateTime<Utc> {
    dt.with_timezone(&Utc)
}

fn money(amount: Option<i64>) -> Option<Money> {
    amount.map(Money::new)
}

pub(crate) fn map_financials(summary: FinancialSummary) -> FinancialsView {
    FinancialsView {
        rental_hours: summary.rental_hours,
        overtime_hours: summary.overtime_hours,
        overtime_fee: summary.overtime_fee.amount(),
        total_revenue: summary.total_revenue.amount(),
        total_operational_cost: summary.total_operational_cost.amount(),
        gross_profit: summary.gross_profit.amount(),
    }
}

fn map_booking(booking: Booking) -> BookingView {
    let financials = map_financials(booking.financials());
    BookingView {
        id: booking.id,
        invoice_code: booking.invoice_code,
        customer_name: booking.customer_name,
        customer_phone: booking.customer_phone,
        booking_date: booking.booking_date.fixed_offset(),
        checkout_at: booking.checkout_at.fixed_offset(),
        checkin_at: booking.checkin_at.fixed_offset(),
        all_in_rate: booking.all_in_rate.amount(),
        overtime_rate_per_hour: booking.overtime_rate_per_hour.amount(),
        fuel_cost: booking.fuel_cost.amount(),
        driver_fee: booking.driver_fee.amount(),
        base_duration_hours: booking.base_duration_hours,
        payment_status: map_status(booking.payment_status),
        note: booking.note,
        vehicle_id: booking.vehicle_id,
        driver_id: booking.driver_id,
        package_id: booking.package_id,
        financials,
    }
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BookingNew>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let cmd = NewBookingCmd {
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        booking_date: payload.booking_date.map(to_utc),
        checkout_at: to_utc(payload.checkout_at),
        checkin_at: to_utc(payload.checkin_at),
        all_in_rate: money(payload.all_in_rate),
        overtime_rate_per_hour: money(payload.overtime_rate_per_hour),
        fuel_cost: money(payload.fuel_cost),
        driver_fee: money(payload.driver_fee),
        payment_status: payload.payment_status.map(engine_status),
        note: payload.note,
        vehicle_id: payload.vehicle_id,
        driver_id: payload.driver_id,
        package_id: payload.package_id,
    };
    let booking = state.engine.create_booking(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_booking(booking))))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<BookingList>,
) -> Result<Json<BookingListResponse>, ServerError> {
    let filter = BookingListFilter {
        from: query.from.map(to_utc),
        to: query.to.map(to_utc),
        vehicle_id: query.vehicle_id,
        driver_id: query.driver_id,
        payment_status: query.payment_status.map(engine_status),
    };
    let (bookings, next_cursor) = state
        .engine
        .bookings_page(
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.cursor.as_deref(),
            &filter,
        )
        .await?;

    Ok(Json(BookingListResponse {
        bookings: bookings.into_iter().map(map_booking).collect(),
        next_cursor,
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingView>, ServerError> {
    let booking = state.engine.booking(id).await?;
    Ok(Json(map_booking(booking)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookingUpdate>,
) -> Result<Json<BookingView>, ServerError> {
    let cmd = UpdateBookingCmd {
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        booking_date: payload.booking_date.map(to_utc),
        checkout_at: payload.checkout_at.map(to_utc),
        checkin_at: payload.checkin_at.map(to_utc),
        all_in_rate: money(payload.all_in_rate),
        overtime_rate_per_hour: money(payload.overtime_rate_per_hour),
        fuel_cost: money(payload.fuel_cost),
        driver_fee: money(payload.driver_fee),
        note: payload.note,
        vehicle_id: payload.vehicle_id,
        driver_id: payload.driver_id,
        package_id: payload.package_id,
    };
    let booking = state.engine.update_booking(id, cmd).await?;
    Ok(Json(map_booking(booking)))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingCancelled>, ServerError> {
    let cancelled = state.engine.cancel_booking(id).await?;
    Ok(Json(BookingCancelled {
        id: cancelled.booking.id,
        invoice_code: cancelled.booking.invoice_code,
        vehicle_released: cancelled.vehicle_released,
        driver_released: cancelled.driver_released,
    }))
}

pub async fn set_payment_status(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentStatusUpdate>,
) -> Result<Json<BookingView>, ServerError> {
    let booking = state
        .engine
        .set_payment_status(id, &payload.payment_status)
        .await?;
    Ok(Json(map_booking(booking)))
}

pub async fn financials(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FinancialsView>, ServerError> {
    let summary = state.engine.booking_financials(id).await?;
    Ok(Json(map_financials(summary)))
}
