//! Office and fleet operating expenses.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub spent_at: DateTime<Utc>,
    pub category: String,
    pub description: Option<String>,
    pub amount: Money,
    pub vehicle_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub spent_at: DateTimeUtc,
    pub category: String,
    pub description: Option<String>,
    pub amount: i64,
    pub vehicle_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            spent_at: model.spent_at,
            category: model.category,
            description: model.description,
            amount: Money::new(model.amount),
            vehicle_id: parse_optional_uuid(model.vehicle_id.as_deref(), "vehicle")?,
        })
    }
}
