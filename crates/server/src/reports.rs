//! Dashboard and report endpoints

use api_types::stats::{DashboardQuery, ReportQuery};
use axum::{
    Json,
    extract::{Query, State},
};
use engine::{DashboardStats, DateRange, ReportSummary, StatsPeriod, StatsQuery};

use crate::{ServerError, server::ServerState};

/// Handle requests for dashboard figures. The period defaults to the current
/// month.
pub async fn dashboard(
    State(state): State<ServerState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardStats>, ServerError> {
    let period = match query.period.as_deref() {
        Some(period) => period.parse::<StatsPeriod>()?,
        None => StatsPeriod::default(),
    };
    let mut stats_query = StatsQuery::period(period);
    match (query.from, query.to) {
        (Some(from), Some(to)) => {
            stats_query =
                stats_query.range(DateRange::from_dates(from, to, state.engine.timezone())?);
        }
        (None, None) => {}
        _ => {
            return Err(ServerError::Generic(
                "provide both from and to, or neither".to_string(),
            ));
        }
    }

    Ok(Json(state.engine.dashboard_stats(stats_query).await?))
}

pub async fn summary(
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportSummary>, ServerError> {
    let range = DateRange::from_dates(query.from, query.to, state.engine.timezone())?;
    Ok(Json(state.engine.report_summary(range).await?))
}
