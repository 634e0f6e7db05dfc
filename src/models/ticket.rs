use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::entities::{ticket_entity, ticket_item_entity};

use super::PaginatedResponse;

/// 彩票明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TicketItem {
    /// 两位号码 "00"-"99"
    pub number: String,
    /// 份数 (正整数)
    pub pieces: i64,
}

impl From<ticket_item_entity::Model> for TicketItem {
    fn from(m: ticket_item_entity::Model) -> Self {
        TicketItem {
            number: m.number,
            pieces: m.pieces,
        }
    }
}

/// 已出票的彩票
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ticket {
    pub id: i64,
    pub zone_id: i64,
    pub draw_type_id: i64,
    pub seller_id: i64,
    pub total_pieces: i64,
    /// 区域本地销售日期
    pub sale_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub items: Vec<TicketItem>,
}

impl Ticket {
    pub fn from_models(header: ticket_entity::Model, items: Vec<ticket_item_entity::Model>) -> Self {
        Ticket {
            id: header.id,
            zone_id: header.zone_id,
            draw_type_id: header.draw_type_id,
            seller_id: header.seller_id,
            total_pieces: header.total_pieces,
            sale_date: header.sale_date,
            created_at: header.created_at,
            items: items.into_iter().map(TicketItem::from).collect(),
        }
    }
}

/// 出票请求中的一行
///
/// 字段保持为原始 JSON 值，格式校验交给出票引擎，
/// 这样小数份数、数字形式的号码等都能得到统一的 `INVALID_ITEM_FORMAT` 错误。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct TicketItemRequest {
    #[serde(default)]
    #[schema(value_type = String, example = "12")]
    pub number: Value,
    #[serde(default)]
    #[schema(value_type = i64, example = 3)]
    pub pieces: Value,
}

impl TicketItemRequest {
    pub fn new(number: &str, pieces: i64) -> Self {
        Self {
            number: Value::from(number),
            pieces: Value::from(pieces),
        }
    }

    /// 号码的字符串形式（仅 JSON 字符串被视为合法号码候选）
    pub fn number_str(&self) -> Option<&str> {
        self.number.as_str()
    }

    /// 用于错误信息展示的号码
    pub fn number_display(&self) -> String {
        match &self.number {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// 份数：接受 JSON 整数或纯数字字符串，其它（小数、布尔、缺失）返回 None
    pub fn piece_count(&self) -> Option<i64> {
        match &self.pieces {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => {
                let s = s.trim();
                if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                    s.parse().ok()
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// 出票请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateTicketRequest {
    pub zone_id: i64,
    pub draw_type_id: i64,
    #[serde(default)]
    pub items: Vec<TicketItemRequest>,
}

/// 彩票列表查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct TicketQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub zone_id: Option<i64>,
    pub draw_type_id: Option<i64>,
    /// 开始日期 (YYYY-MM-DD, 含)
    pub start: Option<String>,
    /// 结束日期 (YYYY-MM-DD, 含)
    pub end: Option<String>,
}

/// 账本查询过滤条件，空列表表示不过滤
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub zone_ids: Vec<i64>,
    pub draw_type_ids: Vec<i64>,
    pub seller_ids: Vec<i64>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.start.is_none_or(|d| ticket.sale_date >= d)
            && self.end.is_none_or(|d| ticket.sale_date <= d)
            && (self.zone_ids.is_empty() || self.zone_ids.contains(&ticket.zone_id))
            && (self.draw_type_ids.is_empty() || self.draw_type_ids.contains(&ticket.draw_type_id))
            && (self.seller_ids.is_empty() || self.seller_ids.contains(&ticket.seller_id))
    }
}

/// 彩票分页响应
pub type TicketPageResponse = PaginatedResponse<Ticket>;
