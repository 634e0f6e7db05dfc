//! Storage seams used by the ticket admission engine and the report aggregator.
//!
//! The catalog is read-mostly and never locked by the engine; the ledger owns the
//! atomic "check daily cap, then append ticket" step. Implementations:
//!
//! - [`postgres`]: SeaORM, with a per-(zone, draw, number, day) counter row updated by
//!   conditional increment inside the ticket transaction.
//! - [`memory`]: in-process, a single mutex makes check + append atomic.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DbErr;

use crate::error::LedgerError;
use crate::models::{
    DailyTotals, DrawType, GroupBy, GroupTotals, NumberLimit, ReportTotals, Schedule, Ticket,
    TicketFilter, Zone,
};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCatalog, InMemoryLedger};
pub use postgres::{PostgresCatalog, PostgresLedger};

pub type StoreResult<T> = Result<T, DbErr>;

/// 待写入的一行明细
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicketItem {
    pub number: String,
    pub pieces: i64,
    /// 当日累计上限，None = 不限量
    pub max_pieces: Option<i64>,
}

/// 待写入的彩票，已通过全部格式校验
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub zone_id: i64,
    pub draw_type_id: i64,
    pub seller_id: i64,
    pub created_at: DateTime<Utc>,
    /// created_at 在区域时区下的日期
    pub sale_date: NaiveDate,
    pub items: Vec<NewTicketItem>,
}

impl NewTicket {
    /// 明细份数之和，i64 溢出时为 None
    pub fn total_pieces(&self) -> Option<i64> {
        self.items
            .iter()
            .try_fold(0i64, |acc, item| acc.checked_add(item.pieces))
    }

    pub(crate) fn checked_total(&self) -> Result<i64, LedgerError> {
        self.total_pieces().ok_or_else(|| {
            LedgerError::Storage(DbErr::Custom(
                "Refusing to write a ticket whose total pieces overflow".into(),
            ))
        })
    }
}

/// `sold_today + pieces <= max_pieces`，相加溢出按超限处理
pub fn within_limit(sold_today: i64, pieces: i64, max_pieces: i64) -> bool {
    sold_today
        .checked_add(pieces)
        .is_some_and(|total| total <= max_pieces)
}

/// 目录（区域 / 开奖类型 / 截止时间 / 号码上限），对出票引擎只读
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_zone(&self, zone_id: i64) -> StoreResult<Option<Zone>>;

    /// 不区分启用状态
    async fn get_schedule(&self, zone_id: i64, draw_type_id: i64)
    -> StoreResult<Option<Schedule>>;

    /// 仅返回启用的截止时间配置
    async fn get_active_schedule(
        &self,
        zone_id: i64,
        draw_type_id: i64,
    ) -> StoreResult<Option<Schedule>> {
        Ok(self
            .get_schedule(zone_id, draw_type_id)
            .await?
            .filter(|s| s.is_active))
    }

    async fn get_limit(
        &self,
        zone_id: i64,
        draw_type_id: i64,
        number: &str,
    ) -> StoreResult<Option<NumberLimit>>;

    async fn list_zones(&self) -> StoreResult<Vec<Zone>>;

    async fn list_draw_types(&self) -> StoreResult<Vec<DrawType>>;

    async fn list_schedules(
        &self,
        zone_id: Option<i64>,
        draw_type_id: Option<i64>,
    ) -> StoreResult<Vec<Schedule>>;

    async fn list_limits(
        &self,
        zone_id: Option<i64>,
        draw_type_id: Option<i64>,
    ) -> StoreResult<Vec<NumberLimit>>;
}

/// 彩票账本
#[async_trait]
pub trait TicketLedger: Send + Sync {
    /// 某号码在某区域日期的已售份数
    async fn sum_pieces_sold(
        &self,
        zone_id: i64,
        draw_type_id: i64,
        number: &str,
        sale_date: NaiveDate,
    ) -> StoreResult<i64>;

    /// 原子写入彩票及明细。
    ///
    /// 对每个带上限的明细，在同一原子单元内确认 `已售 + 份数 <= 上限`；
    /// 任一明细不满足则整体不写入并返回 [`LedgerError::LimitExceeded`]。
    async fn create_ticket_with_items(&self, ticket: &NewTicket) -> Result<Ticket, LedgerError>;

    async fn get_ticket(&self, ticket_id: i64) -> StoreResult<Option<Ticket>>;

    /// 按 created_at 倒序分页，返回 (当前页, 总数)
    async fn list_tickets(
        &self,
        filter: &TicketFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Ticket>, i64)>;

    async fn aggregate(
        &self,
        filter: &TicketFilter,
        group_by: GroupBy,
    ) -> StoreResult<Vec<GroupTotals>>;

    async fn totals(&self, filter: &TicketFilter) -> StoreResult<ReportTotals>;

    /// 按 sale_date 升序
    async fn daily_totals(&self, filter: &TicketFilter) -> StoreResult<Vec<DailyTotals>>;
}
