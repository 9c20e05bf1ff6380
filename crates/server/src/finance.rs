//! Stateless calculator endpoints: booking financials and price-band checks.

use api_types::{
    booking::FinancialsView,
    finance::{RentalTerms as ApiTerms, ValidationView},
    pricing::{BandErrorView, OverlapView, TierReportView, TierValidate},
};
use axum::Json;
use chrono::Utc;
use engine::{EngineError, Money, PriceBand, RentalTerms, finance, pricing};

use crate::{ServerError, bookings::map_financials};

fn engine_terms(terms: ApiTerms) -> RentalTerms {
    RentalTerms {
        checkout_at: terms.checkout_at.with_timezone(&Utc),
        checkin_at: terms.checkin_at.with_timezone(&Utc),
        all_in_rate: terms.all_in_rate.map(Money::new),
        overtime_rate_per_hour: terms.overtime_rate_per_hour.map(Money::new),
        fuel_cost: terms.fuel_cost.map(Money::new),
        driver_fee: terms.driver_fee.map(Money::new),
        base_duration_hours: terms.base_duration_hours,
    }
}

pub async fn compute(Json(payload): Json<ApiTerms>) -> Result<Json<FinancialsView>, ServerError> {
    if payload.base_duration_hours.is_some_and(|hours| hours < 0) {
        return Err(EngineError::Validation(
            "base duration must not be negative".to_string(),
        )
        .into());
    }
    let summary = finance::compute(&engine_terms(payload));
    Ok(Json(map_financials(summary)))
}

/// Reports every problem of the terms; never fails.
pub async fn validate(Json(payload): Json<ApiTerms>) -> Json<ValidationView> {
    let report = finance::validate(&engine_terms(payload));
    Json(ValidationView {
        valid: report.valid,
        violations: report.violations,
    })
}

pub async fn validate_tier(Json(payload): Json<TierValidate>) -> Json<TierReportView> {
    let bands: Vec<PriceBand> = payload
        .price_ranges
        .into_iter()
        .map(|band| PriceBand::new(band.min_pax, band.max_pax, Money::new(band.price)))
        .collect();
    let report = pricing::inspect(&bands);

    Json(TierReportView {
        valid: report.valid,
        errors: report
            .errors
            .into_iter()
            .map(|err| BandErrorView {
                index: err.index,
                message: err.message,
            })
            .collect(),
        overlaps: report
            .overlaps
            .into_iter()
            .map(|overlap| OverlapView {
                message: overlap.message(),
                first: overlap.first,
                second: overlap.second,
                first_range: overlap.first_range,
                second_range: overlap.second_range,
            })
            .collect(),
    })
}
