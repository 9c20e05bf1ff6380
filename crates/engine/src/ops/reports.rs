use std::collections::HashMap;

use sea_orm::{QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    DashboardStats, DateRange, Driver, ReportSummary, ResultEngine, StatsQuery, Vehicle, drivers,
    reports, vehicles,
};

use super::Engine;

impl Engine {
    /// Dashboard figures for the period (or explicit range) of `query`.
    pub async fn dashboard_stats(&self, query: StatsQuery) -> ResultEngine<DashboardStats> {
        let range = match query.range {
            Some(range) => range,
            None => query.period.window(self.clock.now(), self.timezone)?,
        };
        let bookings = self.bookings_between(range.from, range.to).await?;
        let vehicles = self.vehicle_index().await?;
        let census = self.fleet_census().await?;
        reports::dashboard(query, range, self.timezone, &bookings, &vehicles, &census)
    }

    /// Period report: profit after office expenses plus fuel, payroll and
    /// expense breakdowns.
    pub async fn report_summary(&self, range: DateRange) -> ResultEngine<ReportSummary> {
        let bookings = self.bookings_between(range.from, range.to).await?;
        let expenses = self.expenses(Some(range)).await?;
        let vehicles = self.vehicle_index().await?;
        let drivers: HashMap<_, _> = drivers::Entity::find()
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| Driver::try_from(model).map(|d| (d.id, d)))
            .collect::<ResultEngine<_>>()?;
        Ok(reports::summary(
            range,
            self.timezone,
            &bookings,
            &expenses,
            &vehicles,
            &drivers,
        ))
    }

    async fn vehicle_index(&self) -> ResultEngine<HashMap<Uuid, Vehicle>> {
        vehicles::Entity::find()
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| Vehicle::try_from(model).map(|v| (v.id, v)))
            .collect()
    }

    /// `(availability, count)` rows for the vehicles table.
    async fn fleet_census(&self) -> ResultEngine<Vec<(String, i64)>> {
        Ok(vehicles::Entity::find()
            .select_only()
            .column(vehicles::Column::Availability)
            .column_as(Expr::col(vehicles::Column::Id).count(), "count")
            .group_by(vehicles::Column::Availability)
            .into_tuple::<(String, i64)>()
            .all(&self.database)
            .await?)
    }
}
