use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ReportsConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    GroupBy, GroupTotals, ReportPagination, ReportQuery, SummaryReport, SummaryRow, TicketFilter,
    total_pages,
};
use crate::stores::{CatalogStore, TicketLedger};

/// 解析 YYYY-MM-DD
pub fn parse_date(field: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::ValidationError(format!("Invalid {field} date: {v}"))),
    }
}

/// 解析逗号分隔的 ID 列表，空值表示不过滤
pub fn parse_id_list(field: &str, value: Option<&str>) -> AppResult<Vec<i64>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| AppError::ValidationError(format!("Invalid {field} id: {s}")))
        })
        .collect()
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

/// 销售汇总报表，只读账本
#[derive(Clone)]
pub struct ReportService {
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn TicketLedger>,
    settings: ReportsConfig,
}

impl ReportService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        ledger: Arc<dyn TicketLedger>,
        settings: ReportsConfig,
    ) -> Self {
        Self {
            catalog,
            ledger,
            settings,
        }
    }

    pub fn build_filter(query: &ReportQuery) -> AppResult<TicketFilter> {
        let start = parse_date("start", query.start.as_deref())?;
        let end = parse_date("end", query.end.as_deref())?;
        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(AppError::ValidationError(format!(
                "start {s} is after end {e}"
            )));
        }
        Ok(TicketFilter {
            start,
            end,
            zone_ids: parse_id_list("zone", query.zone.as_deref())?,
            draw_type_ids: parse_id_list("draw_type", query.draw_type.as_deref())?,
            seller_ids: parse_id_list("seller", query.seller.as_deref())?,
        })
    }

    /// 分组显示名：区域名 / 开奖类型名 / 销售员ID
    async fn labels(&self, group_by: GroupBy) -> AppResult<HashMap<i64, String>> {
        Ok(match group_by {
            GroupBy::Zone => self
                .catalog
                .list_zones()
                .await?
                .into_iter()
                .map(|z| (z.id, z.name))
                .collect(),
            GroupBy::DrawType => self
                .catalog
                .list_draw_types()
                .await?
                .into_iter()
                .map(|d| (d.id, d.name))
                .collect(),
            GroupBy::Seller => HashMap::new(),
        })
    }

    pub async fn summary(&self, query: &ReportQuery) -> AppResult<SummaryReport> {
        let group_by = match query.group_by.as_deref().map(str::trim) {
            None | Some("") => GroupBy::Zone,
            Some(raw) => raw.parse::<GroupBy>().map_err(AppError::ValidationError)?,
        };
        let filter = Self::build_filter(query)?;

        let groups = self.ledger.aggregate(&filter, group_by).await?;
        let totals = self.ledger.totals(&filter).await?;
        let labels = self.labels(group_by).await?;

        let page = query.page.unwrap_or(1).max(1) as i64;
        let page_size = query
            .page_size
            .unwrap_or(self.settings.default_page_size)
            .clamp(1, self.settings.max_page_size.max(1)) as i64;
        let (summary, pagination) = paginate_rows(groups, &labels, page, page_size);

        let daily = if parse_flag(query.daily.as_deref()) {
            Some(self.ledger.daily_totals(&filter).await?)
        } else {
            None
        };

        log::debug!(
            "Summary report by {group_by}: {} groups, {} tickets",
            pagination.total_items,
            totals.total_tickets
        );

        Ok(SummaryReport {
            group_by,
            summary,
            totals,
            pagination,
            daily,
        })
    }
}

/// 按显示名排序后内存分页
fn paginate_rows(
    groups: Vec<GroupTotals>,
    labels: &HashMap<i64, String>,
    page: i64,
    page_size: i64,
) -> (Vec<SummaryRow>, ReportPagination) {
    let mut rows: Vec<SummaryRow> = groups
        .into_iter()
        .map(|g| SummaryRow {
            group: labels
                .get(&g.key)
                .cloned()
                .unwrap_or_else(|| g.key.to_string()),
            total_tickets: g.ticket_count,
            total_pieces: g.piece_sum,
        })
        .collect();
    rows.sort_by(|a, b| a.group.cmp(&b.group));

    let total_items = rows.len() as i64;
    let offset = ((page - 1) * page_size) as usize;
    let summary = rows
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .collect();

    (
        summary,
        ReportPagination {
            page,
            page_size,
            total_items,
            total_pages: total_pages(total_items, page_size),
        },
    )
}
