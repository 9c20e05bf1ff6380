//! Financial calculator.
//!
//! Pure functions turning the raw terms of a booking into billable revenue,
//! operational cost and profit. Nothing here touches the database: the
//! coordinator and the reports feed these functions with rows they loaded.
//!
//! Overtime is billed per rounded hour. The rental length is rounded half-up
//! to whole hours (12h29m → 12, 12h30m → 13) and every hour beyond the package
//! base duration is billed at the overtime rate.
//!
//! A booking whose check-in is not after its check-out is tolerated: all time
//! derived quantities are zero and the revenue is the all-in rate alone. Use
//! [`validate`] when the caller needs to reject such input instead.
//!
//! The calculator never panics: a negative base duration counts as zero and
//! money totals saturate at the [`Money`] bounds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Money;

/// Base duration applied when a booking has no package or the package has no
/// explicit duration.
pub const DEFAULT_BASE_DURATION_HOURS: i64 = 12;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// The booking-shaped input of the calculator.
///
/// Missing money fields count as zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RentalTerms {
    pub checkout_at: DateTime<Utc>,
    pub checkin_at: DateTime<Utc>,
    #[serde(default)]
    pub all_in_rate: Option<Money>,
    #[serde(default)]
    pub overtime_rate_per_hour: Option<Money>,
    #[serde(default)]
    pub fuel_cost: Option<Money>,
    #[serde(default)]
    pub driver_fee: Option<Money>,
    /// Base duration of the associated package, if any.
    #[serde(default)]
    pub base_duration_hours: Option<i64>,
}

/// Derived figures of one booking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub rental_hours: i64,
    pub overtime_hours: i64,
    pub overtime_fee: Money,
    pub total_revenue: Money,
    pub total_operational_cost: Money,
    pub gross_profit: Money,
}

/// Totals over a set of bookings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTotals {
    pub total_revenue: Money,
    pub total_operational_cost: Money,
    pub total_gross_profit: Money,
    pub total_overtime_fee: Money,
    pub count: u64,
    pub average_revenue: f64,
    pub average_profit: f64,
}

/// Gross profit minus office expenses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetProfit {
    pub gross_profit: Money,
    pub office_expenses: Money,
    pub net_profit: Money,
    /// Percentage of the gross profit that is kept, `0` when there is no
    /// positive gross profit.
    pub profit_margin: f64,
}

/// Outcome of [`validate`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<String>,
}

/// Rental length in hours, rounded half-up. Zero for empty or inverted
/// intervals.
pub fn rental_hours(checkout_at: DateTime<Utc>, checkin_at: DateTime<Utc>) -> i64 {
    let millis = (checkin_at - checkout_at).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + HOUR_MS / 2) / HOUR_MS
}

/// Computes the financial summary of one booking.
pub fn compute(terms: &RentalTerms) -> FinancialSummary {
    let all_in_rate = terms.all_in_rate.unwrap_or_default();
    let operational_cost =
        terms.fuel_cost.unwrap_or_default() + terms.driver_fee.unwrap_or_default();

    let (rental_hours, overtime_hours, overtime_fee) = if terms.checkin_at > terms.checkout_at {
        let base = terms
            .base_duration_hours
            .unwrap_or(DEFAULT_BASE_DURATION_HOURS)
            .max(0);
        let hours = rental_hours(terms.checkout_at, terms.checkin_at);
        let overtime = hours.saturating_sub(base).max(0);
        let fee = terms.overtime_rate_per_hour.unwrap_or_default() * overtime;
        (hours, overtime, fee)
    } else {
        (0, 0, Money::ZERO)
    };

    let total_revenue = all_in_rate + overtime_fee;
    FinancialSummary {
        rental_hours,
        overtime_hours,
        overtime_fee,
        total_revenue,
        total_operational_cost: operational_cost,
        gross_profit: total_revenue - operational_cost,
    }
}

/// Folds per-booking summaries into totals and averages.
pub fn aggregate<'a, I>(summaries: I) -> AggregateTotals
where
    I: IntoIterator<Item = &'a FinancialSummary>,
{
    let mut totals = AggregateTotals::default();
    for summary in summaries {
        totals.total_revenue += summary.total_revenue;
        totals.total_operational_cost += summary.total_operational_cost;
        totals.total_gross_profit += summary.gross_profit;
        totals.total_overtime_fee += summary.overtime_fee;
        totals.count += 1;
    }
    if totals.count > 0 {
        let count = totals.count as f64;
        totals.average_revenue = totals.total_revenue.as_f64() / count;
        totals.average_profit = totals.total_gross_profit.as_f64() / count;
    }
    totals
}

/// Net profit after office expenses.
///
/// The margin is `0` whenever the gross profit is not positive, losses
/// included.
pub fn net_profit(gross_profit: Money, office_expenses: Money) -> NetProfit {
    let net = gross_profit - office_expenses;
    let profit_margin = if gross_profit.is_positive() {
        net.as_f64() / gross_profit.as_f64() * 100.0
    } else {
        0.0
    };
    NetProfit {
        gross_profit,
        office_expenses,
        net_profit: net,
        profit_margin,
    }
}

/// Checks the terms of a booking without failing.
///
/// Every rule is evaluated, so one call reports all violations in a stable
/// order: time order, base duration, then the money fields.
pub fn validate(terms: &RentalTerms) -> ValidationReport {
    let mut violations = Vec::new();
    if terms.checkin_at <= terms.checkout_at {
        violations.push("check-in must be after check-out".to_string());
    }
    if terms.base_duration_hours.is_some_and(|hours| hours < 0) {
        violations.push("base duration must not be negative".to_string());
    }

    let money_fields = [
        ("all-in rate", terms.all_in_rate),
        ("overtime rate per hour", terms.overtime_rate_per_hour),
        ("fuel cost", terms.fuel_cost),
        ("driver fee", terms.driver_fee),
    ];
    for (label, value) in money_fields {
        if value.is_some_and(Money::is_negative) {
            violations.push(format!("{label} must not be negative"));
        }
    }

    ValidationReport {
        valid: violations.is_empty(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, hour, minute, 0).unwrap()
    }

    fn terms(checkout_at: DateTime<Utc>, checkin_at: DateTime<Utc>) -> RentalTerms {
        RentalTerms {
            checkout_at,
            checkin_at,
            all_in_rate: Some(Money::new(500_000)),
            overtime_rate_per_hour: Some(Money::new(50_000)),
            fuel_cost: Some(Money::new(100_000)),
            driver_fee: Some(Money::new(150_000)),
            base_duration_hours: Some(12),
        }
    }

    #[test]
    fn fifteen_hour_rental_bills_three_overtime_hours() {
        let summary = compute(&terms(at(8, 0), at(23, 0)));
        assert_eq!(
            summary,
            FinancialSummary {
                rental_hours: 15,
                overtime_hours: 3,
                overtime_fee: Money::new(150_000),
                total_revenue: Money::new(650_000),
                total_operational_cost: Money::new(250_000),
                gross_profit: Money::new(400_000),
            }
        );
    }

    #[test]
    fn inverted_interval_collapses_to_all_in_rate() {
        let input = terms(at(8, 0), at(7, 0));
        let summary = compute(&input);
        assert_eq!(summary.rental_hours, 0);
        assert_eq!(summary.overtime_hours, 0);
        assert_eq!(summary.overtime_fee, Money::ZERO);
        assert_eq!(summary.total_revenue, Money::new(500_000));
        assert_eq!(summary.gross_profit, Money::new(250_000));

        let report = validate(&input);
        assert!(!report.valid);
        assert_eq!(report.violations, vec!["check-in must be after check-out"]);
    }

    #[test]
    fn equal_instants_are_degenerate() {
        let mut input = terms(at(8, 0), at(8, 0));
        input.base_duration_hours = Some(-5);
        let summary = compute(&input);
        assert_eq!(summary.overtime_hours, 0);
        assert_eq!(summary.total_revenue, Money::new(500_000));
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(rental_hours(at(0, 0), at(12, 24)), 12);
        assert_eq!(rental_hours(at(0, 0), at(12, 36)), 13);
        assert_eq!(rental_hours(at(0, 0), at(12, 30)), 13);
        assert_eq!(
            rental_hours(at(0, 0), at(12, 30) - Duration::milliseconds(1)),
            12
        );
    }

    #[test]
    fn half_hour_past_base_is_one_overtime_hour() {
        let summary = compute(&terms(at(6, 0), at(18, 30)));
        assert_eq!(summary.rental_hours, 13);
        assert_eq!(summary.overtime_hours, 1);
        assert_eq!(summary.overtime_fee, Money::new(50_000));
    }

    #[test]
    fn overtime_formula_holds_across_durations() {
        for minutes in (0..=24 * 60).step_by(17) {
            let checkout = at(0, 0);
            let checkin = checkout + Duration::minutes(minutes + 1);
            for base in [0, 6, 12, 24] {
                let mut input = terms(checkout, checkin);
                input.base_duration_hours = Some(base);
                let summary = compute(&input);
                let rounded = (minutes + 1 + 30) / 60;
                let overtime = (rounded - base).max(0);
                assert_eq!(summary.overtime_hours, overtime);
                assert_eq!(
                    summary.total_revenue,
                    Money::new(500_000) + Money::new(50_000) * overtime
                );
            }
        }
    }

    #[test]
    fn missing_fields_count_as_zero_and_base_defaults_to_twelve() {
        let input = RentalTerms {
            checkout_at: at(0, 0),
            checkin_at: at(14, 0),
            all_in_rate: None,
            overtime_rate_per_hour: None,
            fuel_cost: None,
            driver_fee: Some(Money::new(10)),
            base_duration_hours: None,
        };
        let summary = compute(&input);
        assert_eq!(summary.rental_hours, 14);
        assert_eq!(summary.overtime_hours, 2);
        assert_eq!(summary.overtime_fee, Money::ZERO);
        assert_eq!(summary.total_revenue, Money::ZERO);
        assert_eq!(summary.gross_profit, Money::new(-10));
    }

    #[test]
    fn aggregate_of_nothing_is_zero() {
        let totals = aggregate(&Vec::<FinancialSummary>::new());
        assert_eq!(totals, AggregateTotals::default());
        assert_eq!(totals.average_revenue, 0.0);
        assert_eq!(totals.average_profit, 0.0);
    }

    #[test]
    fn aggregate_sums_and_averages() {
        let a = compute(&terms(at(8, 0), at(23, 0)));
        let b = compute(&terms(at(8, 0), at(18, 0)));
        let totals = aggregate([&a, &b]);
        assert_eq!(totals.count, 2);
        assert_eq!(totals.total_revenue, Money::new(1_150_000));
        assert_eq!(totals.total_operational_cost, Money::new(500_000));
        assert_eq!(totals.total_gross_profit, Money::new(650_000));
        assert_eq!(totals.total_overtime_fee, Money::new(150_000));
        assert_eq!(totals.average_revenue, 575_000.0);
        assert_eq!(totals.average_profit, 325_000.0);
    }

    #[test]
    fn net_profit_and_margin() {
        let result = net_profit(Money::new(400_000), Money::new(100_000));
        assert_eq!(result.net_profit, Money::new(300_000));
        assert_eq!(result.profit_margin, 75.0);

        for gross in [0, -1, -500_000] {
            let result = net_profit(Money::new(gross), Money::new(20_000));
            assert_eq!(result.net_profit, Money::new(gross - 20_000));
            assert_eq!(result.profit_margin, 0.0);
        }
    }

    #[test]
    fn validation_reports_every_violation() {
        let input = RentalTerms {
            checkout_at: at(10, 0),
            checkin_at: at(9, 0),
            all_in_rate: Some(Money::new(-1)),
            overtime_rate_per_hour: Some(Money::new(0)),
            fuel_cost: Some(Money::new(-2)),
            driver_fee: Some(Money::new(-3)),
            base_duration_hours: None,
        };
        let report = validate(&input);
        assert!(!report.valid);
        assert_eq!(
            report.violations,
            vec![
                "check-in must be after check-out",
                "all-in rate must not be negative",
                "fuel cost must not be negative",
                "driver fee must not be negative",
            ]
        );
    }

    #[test]
    fn extreme_terms_saturate_instead_of_overflowing() {
        let mut input = terms(at(0, 0), at(23, 0));
        input.base_duration_hours = Some(i64::MIN);
        let summary = compute(&input);
        assert_eq!(summary.overtime_hours, 23);
        assert_eq!(summary.overtime_fee, Money::new(50_000 * 23));
        assert_eq!(
            validate(&input).violations,
            vec!["base duration must not be negative"]
        );

        let mut input = terms(at(0, 0), at(23, 0));
        input.overtime_rate_per_hour = Some(Money::new(i64::MAX / 2));
        let summary = compute(&input);
        assert_eq!(summary.overtime_fee, Money::new(i64::MAX));
        assert_eq!(summary.total_revenue, Money::new(i64::MAX));

        let mut input = terms(at(0, 0), at(23, 0));
        input.all_in_rate = Some(Money::new(i64::MAX));
        input.fuel_cost = Some(Money::new(i64::MIN));
        input.driver_fee = Some(Money::new(i64::MIN));
        let summary = compute(&input);
        assert_eq!(summary.total_revenue, Money::new(i64::MAX));
        assert_eq!(summary.total_operational_cost, Money::new(i64::MIN));
        assert_eq!(summary.gross_profit, Money::new(i64::MAX));

        let totals = aggregate([&summary, &summary]);
        assert_eq!(totals.total_revenue, Money::new(i64::MAX));
    }

    #[test]
    fn valid_terms_report_nothing() {
        let report = validate(&terms(at(8, 0), at(20, 0)));
        assert!(report.valid);
        assert!(report.violations.is_empty());
    }
}
