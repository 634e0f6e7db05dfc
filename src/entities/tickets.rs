use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;

/// 彩票头
/// 说明:
/// - total_pieces 为明细份数之和，出票时计算后写入，之后不再修改
/// - sale_date 为出票时刻在区域时区下的日历日期
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub zone_id: i64,
    pub draw_type_id: i64,
    pub seller_id: i64,
    pub total_pieces: i64,
    pub sale_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ticket_items::Entity")]
    TicketItems,
}

impl Related<super::ticket_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TicketItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
