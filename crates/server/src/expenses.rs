//! Expenses API endpoints

use api_types::expense::{ExpenseList, ExpenseNew};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{DateRange, Expense, Money, NewExpenseCmd};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<Expense>), ServerError> {
    let cmd = NewExpenseCmd {
        spent_at: payload.spent_at.with_timezone(&Utc),
        category: payload.category,
        amount: Money::new(payload.amount),
        description: payload.description,
        vehicle_id: payload.vehicle_id,
    };
    let expense = state.engine.new_expense(cmd).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ExpenseList>,
) -> Result<Json<Vec<Expense>>, ServerError> {
    let range = match (query.from, query.to) {
        (Some(from), Some(to)) => Some(DateRange::new(
            from.with_timezone(&Utc),
            to.with_timezone(&Utc),
        )?),
        (None, None) => None,
        _ => {
            return Err(ServerError::Generic(
                "provide both from and to, or neither".to_string(),
            ));
        }
    };
    Ok(Json(state.engine.expenses(range).await?))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
