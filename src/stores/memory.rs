use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::DbErr;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{Mutex, RwLock};

use crate::error::LedgerError;
use crate::models::{
    DailyTotals, DrawType, GroupBy, GroupTotals, NumberLimit, ReportTotals, Schedule, Ticket,
    TicketFilter, TicketItem, Zone,
};
use crate::stores::{CatalogStore, NewTicket, StoreResult, TicketLedger, within_limit};

#[derive(Default)]
struct CatalogState {
    zones: BTreeMap<i64, Zone>,
    draw_types: BTreeMap<i64, DrawType>,
    schedules: BTreeMap<(i64, i64), Schedule>,
    limits: BTreeMap<(i64, i64, String), NumberLimit>,
}

/// 进程内目录，测试与本地演示用
#[derive(Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_zone(&self, zone: Zone) {
        self.state.write().await.zones.insert(zone.id, zone);
    }

    pub async fn add_draw_type(&self, draw_type: DrawType) {
        self.state
            .write()
            .await
            .draw_types
            .insert(draw_type.id, draw_type);
    }

    pub async fn upsert_schedule(&self, schedule: Schedule) {
        self.state
            .write()
            .await
            .schedules
            .insert((schedule.zone_id, schedule.draw_type_id), schedule);
    }

    pub async fn set_limit(&self, limit: NumberLimit) {
        let key = (limit.zone_id, limit.draw_type_id, limit.number.clone());
        self.state.write().await.limits.insert(key, limit);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get_zone(&self, zone_id: i64) -> StoreResult<Option<Zone>> {
        Ok(self.state.read().await.zones.get(&zone_id).cloned())
    }

    async fn get_schedule(
        &self,
        zone_id: i64,
        draw_type_id: i64,
    ) -> StoreResult<Option<Schedule>> {
        Ok(self
            .state
            .read()
            .await
            .schedules
            .get(&(zone_id, draw_type_id))
            .cloned())
    }

    async fn get_limit(
        &self,
        zone_id: i64,
        draw_type_id: i64,
        number: &str,
    ) -> StoreResult<Option<NumberLimit>> {
        Ok(self
            .state
            .read()
            .await
            .limits
            .get(&(zone_id, draw_type_id, number.to_string()))
            .cloned())
    }

    async fn list_zones(&self) -> StoreResult<Vec<Zone>> {
        Ok(self.state.read().await.zones.values().cloned().collect())
    }

    async fn list_draw_types(&self) -> StoreResult<Vec<DrawType>> {
        Ok(self.state.read().await.draw_types.values().cloned().collect())
    }

    async fn list_schedules(
        &self,
        zone_id: Option<i64>,
        draw_type_id: Option<i64>,
    ) -> StoreResult<Vec<Schedule>> {
        Ok(self
            .state
            .read()
            .await
            .schedules
            .values()
            .filter(|s| zone_id.is_none_or(|z| s.zone_id == z))
            .filter(|s| draw_type_id.is_none_or(|d| s.draw_type_id == d))
            .cloned()
            .collect())
    }

    async fn list_limits(
        &self,
        zone_id: Option<i64>,
        draw_type_id: Option<i64>,
    ) -> StoreResult<Vec<NumberLimit>> {
        Ok(self
            .state
            .read()
            .await
            .limits
            .values()
            .filter(|l| zone_id.is_none_or(|z| l.zone_id == z))
            .filter(|l| draw_type_id.is_none_or(|d| l.draw_type_id == d))
            .cloned()
            .collect())
    }
}

type CounterKey = (i64, i64, String, NaiveDate);

#[derive(Default)]
struct LedgerState {
    next_id: i64,
    tickets: Vec<Ticket>,
    counters: HashMap<CounterKey, i64>,
    /// 接下来 n 次提交直接返回 Conflict
    pending_conflicts: u32,
    commit_attempts: u32,
}

/// 进程内账本
///
/// 校验与追加在同一把锁内完成，等价于 Postgres 实现中的条件自增。
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让接下来的 `n` 次提交以事务冲突失败
    pub async fn inject_conflicts(&self, n: u32) {
        self.state.lock().await.pending_conflicts = n;
    }

    /// 累计的提交尝试次数（含冲突失败）
    pub async fn commit_attempts(&self) -> u32 {
        self.state.lock().await.commit_attempts
    }

    pub async fn ticket_count(&self) -> usize {
        self.state.lock().await.tickets.len()
    }
}

/// 与 Postgres 的 bigint 溢出一致，报错而不是回绕
fn add_pieces(sum: i64, pieces: i64) -> StoreResult<i64> {
    sum.checked_add(pieces)
        .ok_or_else(|| DbErr::Custom("piece total out of range for bigint".into()))
}

#[async_trait]
impl TicketLedger for InMemoryLedger {
    async fn sum_pieces_sold(
        &self,
        zone_id: i64,
        draw_type_id: i64,
        number: &str,
        sale_date: NaiveDate,
    ) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .counters
            .get(&(zone_id, draw_type_id, number.to_string(), sale_date))
            .copied()
            .unwrap_or(0))
    }

    async fn create_ticket_with_items(&self, ticket: &NewTicket) -> Result<Ticket, LedgerError> {
        let mut state = self.state.lock().await;
        state.commit_attempts += 1;

        if state.pending_conflicts > 0 {
            state.pending_conflicts -= 1;
            return Err(LedgerError::Conflict(
                "could not serialize access due to concurrent update".into(),
            ));
        }

        let total_pieces = ticket.checked_total()?;

        let key_of = |number: &str| -> CounterKey {
            (
                ticket.zone_id,
                ticket.draw_type_id,
                number.to_string(),
                ticket.sale_date,
            )
        };

        // 先全部检查，再统一记账
        for item in &ticket.items {
            let Some(max_pieces) = item.max_pieces else {
                continue;
            };
            let sold_today = state
                .counters
                .get(&key_of(&item.number))
                .copied()
                .unwrap_or(0);
            if !within_limit(sold_today, item.pieces, max_pieces) {
                return Err(LedgerError::LimitExceeded {
                    number: item.number.clone(),
                    sold_today,
                    requested: item.pieces,
                    max_pieces,
                });
            }
        }

        // 不限量号码的计数器同样不能溢出
        for item in &ticket.items {
            let sold_today = state
                .counters
                .get(&key_of(&item.number))
                .copied()
                .unwrap_or(0);
            if sold_today.checked_add(item.pieces).is_none() {
                return Err(LedgerError::Storage(DbErr::Custom(format!(
                    "pieces sold for number {} would overflow",
                    item.number
                ))));
            }
        }

        for item in &ticket.items {
            *state.counters.entry(key_of(&item.number)).or_insert(0) += item.pieces;
        }

        state.next_id += 1;
        let created = Ticket {
            id: state.next_id,
            zone_id: ticket.zone_id,
            draw_type_id: ticket.draw_type_id,
            seller_id: ticket.seller_id,
            total_pieces,
            sale_date: ticket.sale_date,
            created_at: ticket.created_at,
            items: ticket
                .items
                .iter()
                .map(|item| TicketItem {
                    number: item.number.clone(),
                    pieces: item.pieces,
                })
                .collect(),
        };
        state.tickets.push(created.clone());
        Ok(created)
    }

    async fn get_ticket(&self, ticket_id: i64) -> StoreResult<Option<Ticket>> {
        let state = self.state.lock().await;
        Ok(state.tickets.iter().find(|t| t.id == ticket_id).cloned())
    }

    async fn list_tickets(
        &self,
        filter: &TicketFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Ticket>, i64)> {
        let state = self.state.lock().await;
        let mut matched: Vec<&Ticket> = state.tickets.iter().filter(|t| filter.matches(t)).collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn aggregate(
        &self,
        filter: &TicketFilter,
        group_by: GroupBy,
    ) -> StoreResult<Vec<GroupTotals>> {
        let state = self.state.lock().await;
        let mut groups: BTreeMap<i64, GroupTotals> = BTreeMap::new();
        for ticket in state.tickets.iter().filter(|t| filter.matches(t)) {
            let key = match group_by {
                GroupBy::Zone => ticket.zone_id,
                GroupBy::DrawType => ticket.draw_type_id,
                GroupBy::Seller => ticket.seller_id,
            };
            let entry = groups.entry(key).or_insert(GroupTotals {
                key,
                ticket_count: 0,
                piece_sum: 0,
            });
            entry.ticket_count += 1;
            entry.piece_sum = add_pieces(entry.piece_sum, ticket.total_pieces)?;
        }
        Ok(groups.into_values().collect())
    }

    async fn totals(&self, filter: &TicketFilter) -> StoreResult<ReportTotals> {
        let state = self.state.lock().await;
        Ok(state
            .tickets
            .iter()
            .filter(|t| filter.matches(t))
            .try_fold(ReportTotals::default(), |mut acc, t| {
                acc.total_tickets += 1;
                acc.total_pieces = add_pieces(acc.total_pieces, t.total_pieces)?;
                Ok::<_, DbErr>(acc)
            })?)
    }

    async fn daily_totals(&self, filter: &TicketFilter) -> StoreResult<Vec<DailyTotals>> {
        let state = self.state.lock().await;
        let mut days: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
        for ticket in state.tickets.iter().filter(|t| filter.matches(t)) {
            let entry = days.entry(ticket.sale_date).or_insert(DailyTotals {
                date: ticket.sale_date,
                total_tickets: 0,
                total_pieces: 0,
            });
            entry.total_tickets += 1;
            entry.total_pieces = add_pieces(entry.total_pieces, ticket.total_pieces)?;
        }
        Ok(days.into_values().collect())
    }
}
