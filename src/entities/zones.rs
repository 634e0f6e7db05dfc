use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// 销售区域
/// - time_zone: IANA 时区名，NULL 时使用配置默认时区
/// - is_active: 逻辑停用，已被彩票引用的区域不做物理删除
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "zones")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: String,
    pub time_zone: Option<String>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
