//! Pax-range price bands of a hotel tier.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "price_ranges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tier_id: String,
    pub position: i32,
    #[sea_orm(column_type = "Double")]
    pub min_pax: f64,
    #[sea_orm(column_type = "Double")]
    pub max_pax: f64,
    pub price: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
