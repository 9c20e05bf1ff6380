use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    DateRange, EngineError, Expense, NewExpenseCmd, ResultEngine, expenses,
    util::{normalize_category_display, normalize_optional_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Records an expense, optionally charged to a vehicle.
    pub async fn new_expense(&self, cmd: NewExpenseCmd) -> ResultEngine<Expense> {
        let category = normalize_category_display(&cmd.category);
        if category.is_empty() {
            return Err(EngineError::Validation(
                "category must not be empty".to_string(),
            ));
        }
        if !cmd.amount.is_positive() {
            return Err(EngineError::Validation(
                "expense amount must be positive".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            if let Some(vehicle_id) = cmd.vehicle_id {
                self.require_vehicle(&db_tx, vehicle_id).await?;
            }
            let model = expenses::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                spent_at: ActiveValue::Set(cmd.spent_at),
                category: ActiveValue::Set(category),
                description: ActiveValue::Set(normalize_optional_text(
                    cmd.description.as_deref(),
                )),
                amount: ActiveValue::Set(cmd.amount.amount()),
                vehicle_id: ActiveValue::Set(cmd.vehicle_id.map(|id| id.to_string())),
                created_at: ActiveValue::Set(self.clock.now()),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| EngineError::from_write(err, "expense"))?;
            let expense = Expense::try_from(model)?;
            tracing::info!(expense = %expense.id, amount = %expense.amount, "expense recorded");
            Ok(expense)
        })
    }

    /// Expenses, newest first, optionally limited to `[from, to)`.
    pub async fn expenses(&self, range: Option<DateRange>) -> ResultEngine<Vec<Expense>> {
        let mut query = expenses::Entity::find()
            .order_by_desc(expenses::Column::SpentAt)
            .order_by_desc(expenses::Column::Id);
        if let Some(range) = range {
            query = query
                .filter(expenses::Column::SpentAt.gte(range.from))
                .filter(expenses::Column::SpentAt.lt(range.to));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect()
    }

    pub async fn delete_expense(&self, id: Uuid) -> ResultEngine<()> {
        let result = expenses::Entity::delete_by_id(id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("expense not exists".to_string()));
        }
        Ok(())
    }
}
