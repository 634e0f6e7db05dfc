use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// 报表分组维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Zone,
    DrawType,
    Seller,
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zone" => Ok(GroupBy::Zone),
            "draw_type" => Ok(GroupBy::DrawType),
            "seller" | "user" => Ok(GroupBy::Seller),
            other => Err(format!("Invalid group_by: {other}")),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupBy::Zone => write!(f, "zone"),
            GroupBy::DrawType => write!(f, "draw_type"),
            GroupBy::Seller => write!(f, "seller"),
        }
    }
}

/// 汇总报表查询参数
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ReportQuery {
    /// 开始日期 (YYYY-MM-DD)
    pub start: Option<String>,
    /// 结束日期 (YYYY-MM-DD)
    pub end: Option<String>,
    /// 区域ID，逗号分隔
    pub zone: Option<String>,
    /// 开奖类型ID，逗号分隔
    pub draw_type: Option<String>,
    /// 销售员ID，逗号分隔
    pub seller: Option<String>,
    /// zone | draw_type | seller (默认 zone)
    pub group_by: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// "1" / "true" 时附带按日汇总
    pub daily: Option<String>,
}

/// 账本按分组键聚合后的原始结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupTotals {
    /// zone_id / draw_type_id / seller_id
    pub key: i64,
    pub ticket_count: i64,
    pub piece_sum: i64,
}

/// 按日聚合结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub total_tickets: i64,
    pub total_pieces: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SummaryRow {
    /// 分组名称（区域名 / 开奖类型名 / 销售员ID）
    pub group: String,
    pub total_tickets: i64,
    pub total_pieces: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReportTotals {
    pub total_tickets: i64,
    pub total_pieces: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReportPagination {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

/// 汇总报表响应
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SummaryReport {
    pub group_by: GroupBy,
    pub summary: Vec<SummaryRow>,
    pub totals: ReportTotals,
    pub pagination: ReportPagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<Vec<DailyTotals>>,
}
