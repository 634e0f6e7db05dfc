use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    TransactionTrait,
};
use std::collections::HashMap;

use crate::entities::{
    number_sale_entity as sales, ticket_entity as tickets, ticket_item_entity as ticket_items,
};
use crate::error::LedgerError;
use crate::models::{
    DailyTotals, GroupBy, GroupTotals, ReportTotals, Ticket, TicketFilter, TicketItem,
};
use crate::stores::{NewTicket, NewTicketItem, StoreResult, TicketLedger};

/// SUM(bigint) 在 Postgres 中返回 numeric，这里转回 bigint
const PIECE_SUM_SQL: &str = r#"COALESCE(SUM("tickets"."total_pieces"), 0)::BIGINT"#;

#[derive(Clone)]
pub struct PostgresLedger {
    pool: DatabaseConnection,
}

impl PostgresLedger {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 为一行明细占用当日额度:
    /// 1. 确保计数器行存在 (ON CONFLICT DO NOTHING)
    /// 2. 条件自增 `pieces_sold = pieces_sold + n WHERE pieces_sold <= max - n`
    ///
    /// 第 2 步在行锁下重新判断条件，并发事务会排队，不会同时越过上限。
    async fn reserve_pieces(
        &self,
        txn: &DatabaseTransaction,
        ticket: &NewTicket,
        item: &NewTicketItem,
    ) -> Result<(), LedgerError> {
        sales::Entity::insert(sales::ActiveModel {
            zone_id: Set(ticket.zone_id),
            draw_type_id: Set(ticket.draw_type_id),
            number: Set(item.number.clone()),
            sale_date: Set(ticket.sale_date),
            pieces_sold: Set(0),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                sales::Column::ZoneId,
                sales::Column::DrawTypeId,
                sales::Column::Number,
                sales::Column::SaleDate,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(txn)
        .await?;

        let update = sales::Entity::update_many()
            .col_expr(
                sales::Column::PiecesSold,
                Expr::col(sales::Column::PiecesSold).add(item.pieces),
            )
            .col_expr(sales::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(counter_key(ticket, &item.number));

        let Some(max_pieces) = item.max_pieces else {
            // 不限量号码只记账
            update.exec(txn).await?;
            return Ok(());
        };

        let result = update
            .filter(sales::Column::PiecesSold.lte(increment_ceiling(max_pieces, item.pieces)))
            .exec(txn)
            .await?;
        if result.rows_affected == 1 {
            return Ok(());
        }

        let sold_today = sales::Entity::find()
            .filter(counter_key(ticket, &item.number))
            .one(txn)
            .await?
            .map(|row| row.pieces_sold)
            .unwrap_or(0);
        Err(limit_exceeded(item, sold_today, max_pieces))
    }
}

/// 条件自增的阈值：已售 <= max - n 时才能再卖 n 份。
/// max_pieces = 0 时阈值为负，任何计数行都不满足。
fn increment_ceiling(max_pieces: i64, pieces: i64) -> i64 {
    max_pieces.saturating_sub(pieces)
}

/// 按号码排序，所有事务以相同顺序锁计数行
fn lock_order(items: &[NewTicketItem]) -> Vec<&NewTicketItem> {
    let mut ordered: Vec<&NewTicketItem> = items.iter().collect();
    ordered.sort_by(|a, b| a.number.cmp(&b.number));
    ordered
}

fn limit_exceeded(item: &NewTicketItem, sold_today: i64, max_pieces: i64) -> LedgerError {
    LedgerError::LimitExceeded {
        number: item.number.clone(),
        sold_today,
        requested: item.pieces,
        max_pieces,
    }
}

fn counter_key(ticket: &NewTicket, number: &str) -> Condition {
    Condition::all()
        .add(sales::Column::ZoneId.eq(ticket.zone_id))
        .add(sales::Column::DrawTypeId.eq(ticket.draw_type_id))
        .add(sales::Column::Number.eq(number))
        .add(sales::Column::SaleDate.eq(ticket.sale_date))
}

fn apply_filter(query: Select<tickets::Entity>, filter: &TicketFilter) -> Select<tickets::Entity> {
    let mut condition = Condition::all();
    if let Some(start) = filter.start {
        condition = condition.add(tickets::Column::SaleDate.gte(start));
    }
    if let Some(end) = filter.end {
        condition = condition.add(tickets::Column::SaleDate.lte(end));
    }
    if !filter.zone_ids.is_empty() {
        condition = condition.add(tickets::Column::ZoneId.is_in(filter.zone_ids.clone()));
    }
    if !filter.draw_type_ids.is_empty() {
        condition = condition.add(tickets::Column::DrawTypeId.is_in(filter.draw_type_ids.clone()));
    }
    if !filter.seller_ids.is_empty() {
        condition = condition.add(tickets::Column::SellerId.is_in(filter.seller_ids.clone()));
    }
    query.filter(condition)
}

#[async_trait]
impl TicketLedger for PostgresLedger {
    async fn sum_pieces_sold(
        &self,
        zone_id: i64,
        draw_type_id: i64,
        number: &str,
        sale_date: NaiveDate,
    ) -> StoreResult<i64> {
        Ok(sales::Entity::find()
            .filter(sales::Column::ZoneId.eq(zone_id))
            .filter(sales::Column::DrawTypeId.eq(draw_type_id))
            .filter(sales::Column::Number.eq(number))
            .filter(sales::Column::SaleDate.eq(sale_date))
            .one(&self.pool)
            .await?
            .map(|row| row.pieces_sold)
            .unwrap_or(0))
    }

    async fn create_ticket_with_items(&self, ticket: &NewTicket) -> Result<Ticket, LedgerError> {
        if ticket.items.is_empty() {
            return Err(LedgerError::Storage(DbErr::Custom(
                "Refusing to write a ticket without items".into(),
            )));
        }

        let total_pieces = ticket.checked_total()?;

        // 提前返回时事务在 drop 时回滚
        let txn = self.pool.begin().await?;

        // 按号码顺序加锁，避免两张彩票交叉加锁导致死锁
        for item in lock_order(&ticket.items) {
            self.reserve_pieces(&txn, ticket, item).await?;
        }

        let header = tickets::ActiveModel {
            zone_id: Set(ticket.zone_id),
            draw_type_id: Set(ticket.draw_type_id),
            seller_id: Set(ticket.seller_id),
            total_pieces: Set(total_pieces),
            sale_date: Set(ticket.sale_date),
            created_at: Set(ticket.created_at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        ticket_items::Entity::insert_many(ticket.items.iter().map(|item| {
            ticket_items::ActiveModel {
                ticket_id: Set(header.id),
                number: Set(item.number.clone()),
                pieces: Set(item.pieces),
                ..Default::default()
            }
        }))
        .exec(&txn)
        .await?;

        txn.commit().await?;

        Ok(Ticket {
            id: header.id,
            zone_id: header.zone_id,
            draw_type_id: header.draw_type_id,
            seller_id: header.seller_id,
            total_pieces: header.total_pieces,
            sale_date: header.sale_date,
            created_at: header.created_at,
            items: ticket
                .items
                .iter()
                .map(|item| TicketItem {
                    number: item.number.clone(),
                    pieces: item.pieces,
                })
                .collect(),
        })
    }

    async fn get_ticket(&self, ticket_id: i64) -> StoreResult<Option<Ticket>> {
        let Some(header) = tickets::Entity::find_by_id(ticket_id)
            .one(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let items = header
            .find_related(ticket_items::Entity)
            .order_by_asc(ticket_items::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(Some(Ticket::from_models(header, items)))
    }

    async fn list_tickets(
        &self,
        filter: &TicketFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Ticket>, i64)> {
        let base = apply_filter(tickets::Entity::find(), filter);
        let total = base.clone().count(&self.pool).await? as i64;

        let headers = base
            .order_by_desc(tickets::Column::CreatedAt)
            .order_by_desc(tickets::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.pool)
            .await?;

        let ids: Vec<i64> = headers.iter().map(|h| h.id).collect();
        let mut items_by_ticket: HashMap<i64, Vec<ticket_items::Model>> = HashMap::new();
        if !ids.is_empty() {
            let items = ticket_items::Entity::find()
                .filter(ticket_items::Column::TicketId.is_in(ids))
                .order_by_asc(ticket_items::Column::Id)
                .all(&self.pool)
                .await?;
            for item in items {
                items_by_ticket.entry(item.ticket_id).or_default().push(item);
            }
        }

        let page = headers
            .into_iter()
            .map(|header| {
                let items = items_by_ticket.remove(&header.id).unwrap_or_default();
                Ticket::from_models(header, items)
            })
            .collect();
        Ok((page, total))
    }

    async fn aggregate(
        &self,
        filter: &TicketFilter,
        group_by: GroupBy,
    ) -> StoreResult<Vec<GroupTotals>> {
        #[derive(Debug, sea_orm::FromQueryResult)]
        struct GroupRow {
            group_key: i64,
            ticket_count: i64,
            piece_sum: i64,
        }

        let column = match group_by {
            GroupBy::Zone => tickets::Column::ZoneId,
            GroupBy::DrawType => tickets::Column::DrawTypeId,
            GroupBy::Seller => tickets::Column::SellerId,
        };
        let rows = apply_filter(tickets::Entity::find(), filter)
            .select_only()
            .column_as(column, "group_key")
            .column_as(Expr::col(tickets::Column::Id).count(), "ticket_count")
            .column_as(Expr::cust(PIECE_SUM_SQL), "piece_sum")
            .group_by(column)
            .order_by_asc(column)
            .into_model::<GroupRow>()
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| GroupTotals {
                key: r.group_key,
                ticket_count: r.ticket_count,
                piece_sum: r.piece_sum,
            })
            .collect())
    }

    async fn totals(&self, filter: &TicketFilter) -> StoreResult<ReportTotals> {
        #[derive(Debug, sea_orm::FromQueryResult)]
        struct TotalsRow {
            total_tickets: i64,
            total_pieces: i64,
        }

        let row = apply_filter(tickets::Entity::find(), filter)
            .select_only()
            .column_as(Expr::col(tickets::Column::Id).count(), "total_tickets")
            .column_as(Expr::cust(PIECE_SUM_SQL), "total_pieces")
            .into_model::<TotalsRow>()
            .one(&self.pool)
            .await?;

        Ok(row
            .map(|r| ReportTotals {
                total_tickets: r.total_tickets,
                total_pieces: r.total_pieces,
            })
            .unwrap_or_default())
    }

    async fn daily_totals(&self, filter: &TicketFilter) -> StoreResult<Vec<DailyTotals>> {
        #[derive(Debug, sea_orm::FromQueryResult)]
        struct DailyRow {
            sale_date: NaiveDate,
            total_tickets: i64,
            total_pieces: i64,
        }

        let rows = apply_filter(tickets::Entity::find(), filter)
            .select_only()
            .column(tickets::Column::SaleDate)
            .column_as(Expr::col(tickets::Column::Id).count(), "total_tickets")
            .column_as(Expr::cust(PIECE_SUM_SQL), "total_pieces")
            .group_by(tickets::Column::SaleDate)
            .order_by_asc(tickets::Column::SaleDate)
            .into_model::<DailyRow>()
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| DailyTotals {
                date: r.sale_date,
                total_tickets: r.total_tickets,
                total_pieces: r.total_pieces,
            })
            .collect())
    }
}
