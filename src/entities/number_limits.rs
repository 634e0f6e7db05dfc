use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 号码每日累计上限，(zone_id, draw_type_id, number) 唯一
/// - 没有记录 = 不限量
/// - max_pieces = 0 表示禁止销售该号码
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "number_limits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub zone_id: i64,
    pub draw_type_id: i64,
    pub number: String,
    pub max_pieces: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
