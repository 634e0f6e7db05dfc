use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::entity::prelude::*;

/// 截止时间配置，(zone_id, draw_type_id) 唯一
/// cutoff_time 为区域本地时间
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "draw_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub zone_id: i64,
    pub draw_type_id: i64,
    pub cutoff_time: NaiveTime,
    pub is_active: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
