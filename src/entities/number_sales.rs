use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

/// 每日号码累计销量计数器
/// (zone_id, draw_type_id, number, sale_date) 唯一，pieces_sold 只在出票事务内条件自增
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "number_sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub zone_id: i64,
    pub draw_type_id: i64,
    pub number: String,
    pub sale_date: NaiveDate,
    pub pieces_sold: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
