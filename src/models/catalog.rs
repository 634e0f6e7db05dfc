use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    draw_schedule_entity as schedule_entity, draw_type_entity, number_limit_entity, zone_entity,
};

/// 销售区域
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Zone {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// IANA 时区名 (None = 使用默认时区)
    pub time_zone: Option<String>,
    pub is_active: bool,
}

impl From<zone_entity::Model> for Zone {
    fn from(m: zone_entity::Model) -> Self {
        Zone {
            id: m.id,
            name: m.name,
            description: m.description,
            time_zone: m.time_zone,
            is_active: m.is_active,
        }
    }
}

/// 开奖类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DrawType {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub is_active: bool,
}

impl From<draw_type_entity::Model> for DrawType {
    fn from(m: draw_type_entity::Model) -> Self {
        DrawType {
            id: m.id,
            code: m.code,
            name: m.name,
            is_active: m.is_active,
        }
    }
}

/// 截止时间配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Schedule {
    pub zone_id: i64,
    pub draw_type_id: i64,
    /// 区域本地时间 (HH:MM:SS)
    #[schema(value_type = String, example = "20:45:00")]
    pub cutoff_time: NaiveTime,
    pub is_active: bool,
}

impl From<schedule_entity::Model> for Schedule {
    fn from(m: schedule_entity::Model) -> Self {
        Schedule {
            zone_id: m.zone_id,
            draw_type_id: m.draw_type_id,
            cutoff_time: m.cutoff_time,
            is_active: m.is_active,
        }
    }
}

/// 号码每日累计上限
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NumberLimit {
    pub zone_id: i64,
    pub draw_type_id: i64,
    pub number: String,
    pub max_pieces: i64,
}

impl From<number_limit_entity::Model> for NumberLimit {
    fn from(m: number_limit_entity::Model) -> Self {
        NumberLimit {
            zone_id: m.zone_id,
            draw_type_id: m.draw_type_id,
            number: m.number,
            max_pieces: m.max_pieces,
        }
    }
}

/// 目录查询参数（均可选）
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CatalogQuery {
    pub zone_id: Option<i64>,
    pub draw_type_id: Option<i64>,
}
