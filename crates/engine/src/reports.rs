//! Read-only summaries over bookings and expenses.
//!
//! Everything here is a pure fold: the engine loads the rows for a window and
//! hands them over, so the grouping rules can be tested without a database.
//! Windows are half-open (`[from, to)`) and computed in the engine's
//! configured time zone; bucket keys and month labels use the same zone.

use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
};

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Booking, Driver, EngineError, Expense, Money, ResultEngine, Vehicle, VehicleAvailability,
    finance::{self, FinancialSummary, NetProfit},
    util::{normalize_category_display, normalize_category_key},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsPeriod {
    Today,
    #[default]
    Month,
    Year,
}

impl StatsPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Window containing `now`, in `tz`.
    pub fn window(self, now: DateTime<Utc>, tz: Tz) -> ResultEngine<DateRange> {
        let today = now.with_timezone(&tz).date_naive();
        let (start, end) = match self {
            Self::Today => (today, today.succ_opt()),
            Self::Month => {
                let first = today.with_day(1);
                (
                    first.unwrap_or(today),
                    first.and_then(|d| d.checked_add_months(Months::new(1))),
                )
            }
            Self::Year => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1);
                (
                    first.unwrap_or(today),
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1),
                )
            }
        };
        let end = end.ok_or_else(|| EngineError::Validation("date out of range".to_string()))?;
        DateRange::new(local_midnight(tz, start), local_midnight(tz, end))
    }

    /// Hour buckets carry the date once the window covers several days, so
    /// the same hour of different days is not merged.
    fn bucket_format(self, range: &DateRange, tz: Tz) -> &'static str {
        match self {
            Self::Today if range.spans_several_days(tz) => "%Y-%m-%d %H:00",
            Self::Today => "%H:00",
            Self::Month => "%Y-%m-%d",
            Self::Year => "%Y-%m",
        }
    }
}

impl FromStr for StatsPeriod {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(EngineError::Validation(format!("unknown period: {other}"))),
        }
    }
}

/// A half-open UTC window `[from, to)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> ResultEngine<Self> {
        if from >= to {
            return Err(EngineError::Validation(
                "invalid range: from must be < to".to_string(),
            ));
        }
        Ok(Self { from, to })
    }

    /// Whole local days, both ends inclusive.
    pub fn from_dates(first: NaiveDate, last: NaiveDate, tz: Tz) -> ResultEngine<Self> {
        let after_last = last
            .succ_opt()
            .ok_or_else(|| EngineError::Validation("date out of range".to_string()))?;
        Self::new(local_midnight(tz, first), local_midnight(tz, after_last))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant < self.to
    }

    /// Whether the window touches more than one local calendar day.
    pub fn spans_several_days(&self, tz: Tz) -> bool {
        let last = self.to - chrono::Duration::nanoseconds(1);
        self.from.with_timezone(&tz).date_naive() != last.with_timezone(&tz).date_naive()
    }
}

/// Start of a local day. A midnight skipped by a DST jump resolves to the
/// first valid instant after it.
fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + chrono::Duration::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsQuery {
    pub period: StatsPeriod,
    /// Overrides the period window; the period still picks the bucket size.
    /// Hourly buckets over a window of several days are keyed
    /// `YYYY-MM-DD HH:00`.
    pub range: Option<DateRange>,
}

impl StatsQuery {
    pub fn period(period: StatsPeriod) -> Self {
        Self {
            period,
            range: None,
        }
    }

    #[must_use]
    pub fn range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendBucket {
    pub bucket: String,
    pub revenue: Money,
    pub gross_profit: Money,
    pub bookings: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleRevenue {
    pub vehicle_id: Uuid,
    pub label: String,
    pub revenue: Money,
    pub bookings: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetStatusCount {
    pub availability: VehicleAvailability,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub period: StatsPeriod,
    pub range: DateRange,
    pub total_revenue: Money,
    pub total_operational_cost: Money,
    pub total_gross_profit: Money,
    pub booking_count: u64,
    pub trend: Vec<TrendBucket>,
    pub revenue_by_vehicle: Vec<VehicleRevenue>,
    pub fleet_status: Vec<FleetStatusCount>,
}

/// Folds the bookings of a window into dashboard figures.
///
/// `census` is the grouped `(availability, count)` query result; states it
/// does not mention are reported as zero.
pub fn dashboard(
    query: StatsQuery,
    range: DateRange,
    tz: Tz,
    bookings: &[Booking],
    vehicles: &HashMap<Uuid, Vehicle>,
    census: &[(String, i64)],
) -> ResultEngine<DashboardStats> {
    let format = query.period.bucket_format(&range, tz);
    let mut trend: BTreeMap<String, TrendBucket> = BTreeMap::new();
    let mut per_vehicle: HashMap<Uuid, VehicleRevenue> = HashMap::new();
    let mut summaries: Vec<FinancialSummary> = Vec::with_capacity(bookings.len());

    for booking in bookings {
        let summary = booking.financials();
        let key = booking
            .booking_date
            .with_timezone(&tz)
            .format(format)
            .to_string();
        let bucket = trend.entry(key.clone()).or_insert_with(|| TrendBucket {
            bucket: key,
            revenue: Money::ZERO,
            gross_profit: Money::ZERO,
            bookings: 0,
        });
        bucket.revenue += summary.total_revenue;
        bucket.gross_profit += summary.gross_profit;
        bucket.bookings += 1;

        let entry = per_vehicle
            .entry(booking.vehicle_id)
            .or_insert_with(|| VehicleRevenue {
                vehicle_id: booking.vehicle_id,
                label: vehicles
                    .get(&booking.vehicle_id)
                    .map(Vehicle::label)
                    .unwrap_or_else(|| booking.vehicle_id.to_string()),
                revenue: Money::ZERO,
                bookings: 0,
            });
        entry.revenue += summary.total_revenue;
        entry.bookings += 1;

        summaries.push(summary);
    }

    let totals = finance::aggregate(&summaries);
    let mut revenue_by_vehicle: Vec<VehicleRevenue> = per_vehicle.into_values().collect();
    revenue_by_vehicle.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.label.cmp(&b.label))
    });

    Ok(DashboardStats {
        period: query.period,
        range,
        total_revenue: totals.total_revenue,
        total_operational_cost: totals.total_operational_cost,
        total_gross_profit: totals.total_gross_profit,
        booking_count: totals.count,
        trend: trend.into_values().collect(),
        revenue_by_vehicle,
        fleet_status: fleet_census(census)?,
    })
}

fn fleet_census(rows: &[(String, i64)]) -> ResultEngine<Vec<FleetStatusCount>> {
    let mut counts: HashMap<VehicleAvailability, u64> = HashMap::new();
    for (state, count) in rows {
        let state = VehicleAvailability::try_from(state.as_str())?;
        *counts.entry(state).or_default() += u64::try_from(*count).unwrap_or_default();
    }
    Ok(VehicleAvailability::ALL
        .into_iter()
        .map(|availability| FleetStatusCount {
            availability,
            count: counts.get(&availability).copied().unwrap_or_default(),
        })
        .collect())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuelRecapRow {
    pub vehicle_id: Uuid,
    pub vehicle_label: String,
    /// `YYYY-MM`
    pub month: String,
    /// `October 2026`
    pub month_label: String,
    pub fuel_cost: Money,
    pub trips: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecapRow {
    pub driver_id: Uuid,
    pub driver_name: String,
    pub month: String,
    pub month_label: String,
    pub driver_fee: Money,
    pub trips: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleExpenseTotal {
    pub vehicle_id: Uuid,
    pub vehicle_label: String,
    pub total: Money,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub range: DateRange,
    pub booking_count: u64,
    pub total_revenue: Money,
    pub total_operational_cost: Money,
    pub total_gross_profit: Money,
    pub total_overtime_fee: Money,
    pub office_expenses: Money,
    pub net_profit: Money,
    pub profit_margin: f64,
    pub fuel_recap: Vec<FuelRecapRow>,
    pub payroll_recap: Vec<PayrollRecapRow>,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub expenses_by_vehicle: Vec<VehicleExpenseTotal>,
}

/// Builds the period report. Recaps are ordered by month, then label.
pub fn summary(
    range: DateRange,
    tz: Tz,
    bookings: &[Booking],
    expenses: &[Expense],
    vehicles: &HashMap<Uuid, Vehicle>,
    drivers: &HashMap<Uuid, Driver>,
) -> ReportSummary {
    let mut fuel: BTreeMap<(String, String, Uuid), FuelRecapRow> = BTreeMap::new();
    let mut payroll: BTreeMap<(String, String, Uuid), PayrollRecapRow> = BTreeMap::new();
    let mut summaries: Vec<FinancialSummary> = Vec::with_capacity(bookings.len());

    for booking in bookings {
        let local = booking.booking_date.with_timezone(&tz);
        let month = local.format("%Y-%m").to_string();
        let month_label = local.format("%B %Y").to_string();

        let vehicle_label = vehicles
            .get(&booking.vehicle_id)
            .map(Vehicle::label)
            .unwrap_or_else(|| booking.vehicle_id.to_string());
        let row = fuel
            .entry((month.clone(), vehicle_label.clone(), booking.vehicle_id))
            .or_insert_with(|| FuelRecapRow {
                vehicle_id: booking.vehicle_id,
                vehicle_label,
                month: month.clone(),
                month_label: month_label.clone(),
                fuel_cost: Money::ZERO,
                trips: 0,
            });
        row.fuel_cost += booking.fuel_cost;
        row.trips += 1;

        let driver_name = drivers
            .get(&booking.driver_id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| booking.driver_id.to_string());
        let row = payroll
            .entry((month.clone(), driver_name.clone(), booking.driver_id))
            .or_insert_with(|| PayrollRecapRow {
                driver_id: booking.driver_id,
                driver_name,
                month,
                month_label,
                driver_fee: Money::ZERO,
                trips: 0,
            });
        row.driver_fee += booking.driver_fee;
        row.trips += 1;

        summaries.push(booking.financials());
    }

    let totals = finance::aggregate(&summaries);
    let office_expenses: Money = expenses.iter().map(|e| e.amount).sum();
    let NetProfit {
        net_profit,
        profit_margin,
        ..
    } = finance::net_profit(totals.total_gross_profit, office_expenses);

    ReportSummary {
        range,
        booking_count: totals.count,
        total_revenue: totals.total_revenue,
        total_operational_cost: totals.total_operational_cost,
        total_gross_profit: totals.total_gross_profit,
        total_overtime_fee: totals.total_overtime_fee,
        office_expenses,
        net_profit,
        profit_margin,
        fuel_recap: fuel.into_values().collect(),
        payroll_recap: payroll.into_values().collect(),
        expenses_by_category: expenses_by_category(expenses),
        expenses_by_vehicle: expenses_by_vehicle(expenses, vehicles),
    }
}

/// Groups by normalized category key, keeping the first spelling seen.
/// Largest totals first.
fn expenses_by_category(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut groups: HashMap<String, CategoryTotal> = HashMap::new();
    for expense in expenses {
        let group = groups
            .entry(normalize_category_key(&expense.category))
            .or_insert_with(|| CategoryTotal {
                category: normalize_category_display(&expense.category),
                total: Money::ZERO,
                count: 0,
            });
        group.total += expense.amount;
        group.count += 1;
    }
    let mut out: Vec<CategoryTotal> = groups.into_values().collect();
    out.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    out
}

fn expenses_by_vehicle(
    expenses: &[Expense],
    vehicles: &HashMap<Uuid, Vehicle>,
) -> Vec<VehicleExpenseTotal> {
    let mut groups: HashMap<Uuid, VehicleExpenseTotal> = HashMap::new();
    for expense in expenses {
        let Some(vehicle_id) = expense.vehicle_id else {
            continue;
        };
        let group = groups.entry(vehicle_id).or_insert_with(|| VehicleExpenseTotal {
            vehicle_id,
            vehicle_label: vehicles
                .get(&vehicle_id)
                .map(Vehicle::label)
                .unwrap_or_else(|| vehicle_id.to_string()),
            total: Money::ZERO,
        });
        group.total += expense.amount;
    }
    let mut out: Vec<VehicleExpenseTotal> = groups.into_values().collect();
    out.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.vehicle_label.cmp(&b.vehicle_label))
    });
    out
}

#[cfg(test)]
mod tests {
    use chrono_tz::Asia::Jakarta;

    use super::*;
    use crate::{DriverAvailability, PaymentStatus};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn vehicle(plate: &str) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            plate: plate.to_string(),
            brand: "Toyota".to_string(),
            model_name: "Avanza".to_string(),
            availability: VehicleAvailability::Ready,
        }
    }

    fn driver(name: &str) -> Driver {
        Driver {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: None,
            availability: DriverAvailability::Ready,
        }
    }

    fn booking(vehicle: &Vehicle, driver: &Driver, date: DateTime<Utc>, rate: i64) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            invoice_code: format!("INV-{}", Uuid::new_v4()),
            customer_name: "Budi".to_string(),
            customer_phone: None,
            booking_date: date,
            checkout_at: date,
            checkin_at: date + chrono::Duration::hours(12),
            all_in_rate: Money::new(rate),
            overtime_rate_per_hour: Money::ZERO,
            fuel_cost: Money::new(100_000),
            driver_fee: Money::new(150_000),
            base_duration_hours: None,
            payment_status: PaymentStatus::Unpaid,
            note: None,
            vehicle_id: vehicle.id,
            driver_id: driver.id,
            package_id: None,
            created_at: date,
        }
    }

    fn expense(category: &str, amount: i64, vehicle_id: Option<Uuid>) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            spent_at: at(2026, 10, 5, 3),
            category: category.to_string(),
            description: None,
            amount: Money::new(amount),
            vehicle_id,
        }
    }

    #[test]
    fn month_window_follows_local_calendar() {
        // 2026-10-31 20:00 UTC is already November 1st in Jakarta (UTC+7).
        let range = StatsPeriod::Month.window(at(2026, 10, 31, 20), Jakarta).unwrap();
        assert_eq!(range.from, at(2026, 10, 31, 17));
        assert_eq!(range.to, at(2026, 11, 30, 17));

        let today = StatsPeriod::Today.window(at(2026, 10, 18, 2), Jakarta).unwrap();
        assert_eq!(today.from, at(2026, 10, 17, 17));
        assert_eq!(today.to, at(2026, 10, 18, 17));
    }

    #[test]
    fn inclusive_dates_become_half_open_range() {
        let range = DateRange::from_dates(
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 31).unwrap(),
            Jakarta,
        )
        .unwrap();
        assert!(range.contains(at(2026, 10, 31, 16)));
        assert!(!range.contains(at(2026, 10, 31, 17)));
        assert!(DateRange::new(range.to, range.from).is_err());
    }

    #[test]
    fn dashboard_buckets_and_vehicle_ranking() {
        let small = vehicle("B 1 AA");
        let big = vehicle("B 2 BB");
        let budi = driver("Budi");
        let vehicles = HashMap::from([(small.id, small.clone()), (big.id, big.clone())]);
        let bookings = vec![
            booking(&small, &budi, at(2026, 10, 3, 2), 500_000),
            booking(&big, &budi, at(2026, 10, 1, 2), 900_000),
            booking(&big, &budi, at(2026, 10, 3, 5), 700_000),
        ];
        let range = StatsPeriod::Month.window(at(2026, 10, 18, 2), Jakarta).unwrap();
        let census = vec![("READY".to_string(), 1), ("BOOKED".to_string(), 1)];

        let stats = dashboard(
            StatsQuery::period(StatsPeriod::Month),
            range,
            Jakarta,
            &bookings,
            &vehicles,
            &census,
        )
        .unwrap();

        assert_eq!(stats.booking_count, 3);
        assert_eq!(stats.total_revenue, Money::new(2_100_000));
        assert_eq!(stats.total_operational_cost, Money::new(750_000));
        let buckets: Vec<(&str, u64)> = stats
            .trend
            .iter()
            .map(|b| (b.bucket.as_str(), b.bookings))
            .collect();
        assert_eq!(buckets, vec![("2026-10-01", 1), ("2026-10-03", 2)]);
        assert_eq!(stats.revenue_by_vehicle[0].vehicle_id, big.id);
        assert_eq!(stats.revenue_by_vehicle[0].revenue, Money::new(1_600_000));
        assert_eq!(stats.revenue_by_vehicle[1].label, "B 1 AA (Toyota Avanza)");
        let census: Vec<u64> = stats.fleet_status.iter().map(|c| c.count).collect();
        assert_eq!(census, vec![1, 1, 0, 0]);
    }

    #[test]
    fn hour_buckets_use_local_time() {
        let car = vehicle("B 1 AA");
        let budi = driver("Budi");
        let bookings = vec![booking(&car, &budi, at(2026, 10, 18, 2), 1)];
        let range = StatsPeriod::Today.window(at(2026, 10, 18, 2), Jakarta).unwrap();
        let stats = dashboard(
            StatsQuery::period(StatsPeriod::Today),
            range,
            Jakarta,
            &bookings,
            &HashMap::new(),
            &[],
        )
        .unwrap();
        assert_eq!(stats.trend[0].bucket, "09:00");
        assert!(stats.fleet_status.iter().all(|c| c.count == 0));
        assert_eq!(stats.fleet_status.len(), 4);
    }

    #[test]
    fn hour_buckets_over_several_days_keep_the_date() {
        let car = vehicle("B 1 AA");
        let budi = driver("Budi");
        let bookings = vec![
            booking(&car, &budi, at(2026, 10, 16, 2), 1),
            booking(&car, &budi, at(2026, 10, 18, 2), 1),
        ];
        let range = DateRange::from_dates(
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            Jakarta,
        )
        .unwrap();
        let query = StatsQuery::period(StatsPeriod::Today).range(range);
        let stats = dashboard(query, range, Jakarta, &bookings, &HashMap::new(), &[]).unwrap();
        let buckets: Vec<(&str, u64)> = stats
            .trend
            .iter()
            .map(|b| (b.bucket.as_str(), b.bookings))
            .collect();
        assert_eq!(
            buckets,
            vec![("2026-10-16 09:00", 1), ("2026-10-18 09:00", 1)]
        );

        let single_day = StatsPeriod::Today.window(at(2026, 10, 18, 2), Jakarta).unwrap();
        assert!(!single_day.spans_several_days(Jakarta));
        assert!(range.spans_several_days(Jakarta));
    }

    #[test]
    fn summary_groups_recaps_by_month_and_categories_by_key() {
        let car = vehicle("B 1 AA");
        let budi = driver("Budi");
        let vehicles = HashMap::from([(car.id, car.clone())]);
        let drivers = HashMap::from([(budi.id, budi.clone())]);
        let bookings = vec![
            booking(&car, &budi, at(2026, 9, 30, 18), 600_000),
            booking(&car, &budi, at(2026, 10, 2, 2), 600_000),
            booking(&car, &budi, at(2026, 10, 9, 2), 600_000),
        ];
        let expenses = vec![
            expense("Fuel", 50_000, Some(car.id)),
            expense(" fuel ", 25_000, None),
            expense("Office Rent", 1_000_000, None),
        ];
        let range = DateRange::new(at(2026, 9, 1, 0), at(2026, 11, 1, 0)).unwrap();

        let report = summary(range, Jakarta, &bookings, &expenses, &vehicles, &drivers);

        assert_eq!(report.total_revenue, Money::new(1_800_000));
        assert_eq!(report.total_gross_profit, Money::new(1_050_000));
        assert_eq!(report.office_expenses, Money::new(1_075_000));
        assert_eq!(report.net_profit, Money::new(-25_000));
        assert!((report.profit_margin - (-25_000.0 / 1_050_000.0 * 100.0)).abs() < 1e-9);

        // The first booking is October 1st, 01:00 in Jakarta.
        assert_eq!(report.fuel_recap.len(), 1);
        assert_eq!(report.fuel_recap[0].month_label, "October 2026");
        assert_eq!(report.fuel_recap[0].fuel_cost, Money::new(300_000));
        assert_eq!(report.payroll_recap[0].driver_name, "Budi");
        assert_eq!(report.payroll_recap[0].driver_fee, Money::new(450_000));
        assert_eq!(report.payroll_recap[0].trips, 3);

        assert_eq!(report.expenses_by_category.len(), 2);
        assert_eq!(report.expenses_by_category[0].category, "Office Rent");
        assert_eq!(report.expenses_by_category[1].category, "Fuel");
        assert_eq!(report.expenses_by_category[1].count, 2);
        assert_eq!(report.expenses_by_vehicle.len(), 1);
        assert_eq!(report.expenses_by_vehicle[0].total, Money::new(50_000));
    }
}
