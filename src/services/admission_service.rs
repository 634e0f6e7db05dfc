use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use crate::config::AdmissionConfig;
use crate::error::{AdmissionError, ItemField, LedgerError};
use crate::models::{
    PaginatedResponse, PaginationParams, Ticket, TicketFilter, TicketItemRequest,
    TicketPageResponse,
};
use crate::stores::{CatalogStore, NewTicket, NewTicketItem, TicketLedger, within_limit};

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}$").expect("number pattern is valid"));

/// 号码是否为两位数字 "00"-"99"
pub fn is_valid_number(number: &str) -> bool {
    NUMBER_RE.is_match(number)
}

#[derive(Debug, Clone)]
pub struct AdmissionSettings {
    /// 区域未配置时区时使用
    pub default_time_zone: Tz,
    /// 事务冲突后的最大重试次数（不含首次提交）
    pub max_conflict_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        Self {
            default_time_zone: chrono_tz::America::Managua,
            max_conflict_retries: 3,
            retry_backoff: Duration::from_millis(20),
        }
    }
}

impl AdmissionSettings {
    pub fn from_config(config: &AdmissionConfig) -> Result<Self, String> {
        Ok(Self {
            default_time_zone: config.time_zone()?,
            max_conflict_retries: config.max_conflict_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }
}

/// 出票引擎
///
/// 决定一张彩票是否被接受。检查顺序固定，保证同一请求总是得到同一个错误:
/// 截止时间配置 → 截止时间 → 非空 → 明细格式 → 号码重复 → 累计上限 → 提交。
/// 上限在提交时由账本在原子单元内再次确认，前面的预检只是为了尽早给出明确的错误。
#[derive(Clone)]
pub struct AdmissionService {
    catalog: Arc<dyn CatalogStore>,
    ledger: Arc<dyn TicketLedger>,
    settings: AdmissionSettings,
}

impl AdmissionService {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        ledger: Arc<dyn TicketLedger>,
        settings: AdmissionSettings,
    ) -> Self {
        Self {
            catalog,
            ledger,
            settings,
        }
    }

    /// 区域本地时区，配置非法时回退到默认时区
    async fn zone_time_zone(&self, zone_id: i64) -> Result<Tz, AdmissionError> {
        let zone = self.catalog.get_zone(zone_id).await?;
        let Some(zone) = zone else {
            return Ok(self.settings.default_time_zone);
        };
        if !zone.is_active {
            log::debug!("Zone {} is inactive, accepting sales anyway", zone.id);
        }
        match zone.time_zone.as_deref() {
            Some(name) => Ok(name.parse::<Tz>().unwrap_or_else(|_| {
                log::warn!(
                    "Zone {} has invalid time zone {name:?}, falling back to {}",
                    zone.id,
                    self.settings.default_time_zone
                );
                self.settings.default_time_zone
            })),
            None => Ok(self.settings.default_time_zone),
        }
    }

    /// 提交彩票
    pub async fn submit_ticket(
        &self,
        zone_id: i64,
        draw_type_id: i64,
        seller_id: i64,
        items: &[TicketItemRequest],
        now: DateTime<Utc>,
    ) -> Result<Ticket, AdmissionError> {
        // 1. 截止时间配置，停用的配置存在时不做截止检查
        let cutoff_time = match self
            .catalog
            .get_active_schedule(zone_id, draw_type_id)
            .await?
        {
            Some(schedule) => Some(schedule.cutoff_time),
            None => {
                if self
                    .catalog
                    .get_schedule(zone_id, draw_type_id)
                    .await?
                    .is_none()
                {
                    return Err(AdmissionError::NoScheduleConfigured {
                        zone_id,
                        draw_type_id,
                    });
                }
                log::debug!(
                    "Schedule for zone {zone_id} draw type {draw_type_id} is inactive, skipping cutoff"
                );
                None
            }
        };

        let tz = self.zone_time_zone(zone_id).await?;
        let local_now = now.with_timezone(&tz);
        let local_time = local_now.time();
        let sale_date = local_now.date_naive();

        // 2. 截止时间
        if let Some(cutoff_time) = cutoff_time
            && local_time >= cutoff_time
        {
            return Err(AdmissionError::PastCutoff {
                cutoff_time,
                local_time,
            });
        }

        if items.is_empty() {
            return Err(AdmissionError::EmptyTicket);
        }

        // 3. 明细格式
        let mut parsed: Vec<(String, i64)> = Vec::with_capacity(items.len());
        let mut total_pieces: i64 = 0;
        for item in items {
            let number = match item.number_str() {
                Some(n) if is_valid_number(n) => n.to_string(),
                _ => {
                    return Err(AdmissionError::InvalidItemFormat {
                        number: item.number_display(),
                        field: ItemField::Number,
                    });
                }
            };
            // 整张票的合计也必须能用 i64 表示
            let pieces = match item.piece_count() {
                Some(p) if p > 0 && total_pieces.checked_add(p).is_some() => p,
                _ => {
                    return Err(AdmissionError::InvalidItemFormat {
                        number,
                        field: ItemField::Pieces,
                    });
                }
            };
            total_pieces += pieces;
            parsed.push((number, pieces));
        }

        // 4. 同一张票内号码不可重复
        {
            let mut seen = HashSet::with_capacity(parsed.len());
            for (number, _) in &parsed {
                if !seen.insert(number.as_str()) {
                    return Err(AdmissionError::DuplicateNumberInTicket {
                        number: number.clone(),
                    });
                }
            }
        }

        // 5. 累计上限预检
        let mut new_items = Vec::with_capacity(parsed.len());
        for (number, pieces) in parsed {
            let max_pieces = self
                .catalog
                .get_limit(zone_id, draw_type_id, &number)
                .await?
                .map(|l| l.max_pieces);
            if let Some(max_pieces) = max_pieces {
                let sold_today = self
                    .ledger
                    .sum_pieces_sold(zone_id, draw_type_id, &number, sale_date)
                    .await?;
                if !within_limit(sold_today, pieces, max_pieces) {
                    return Err(AdmissionError::AccumulatedLimitExceeded {
                        number,
                        sold_today,
                        requested: pieces,
                        max_pieces,
                    });
                }
            }
            new_items.push(NewTicketItem {
                number,
                pieces,
                max_pieces,
            });
        }

        // 6. 提交
        let new_ticket = NewTicket {
            zone_id,
            draw_type_id,
            seller_id,
            created_at: now,
            sale_date,
            items: new_items,
        };
        let ticket = self.commit_with_retry(&new_ticket).await?;

        log::info!(
            "Ticket {} accepted: zone={} draw_type={} seller={} items={} pieces={}",
            ticket.id,
            ticket.zone_id,
            ticket.draw_type_id,
            ticket.seller_id,
            ticket.items.len(),
            ticket.total_pieces
        );
        Ok(ticket)
    }

    /// 事务冲突时有限次重试，超限与存储错误直接返回
    async fn commit_with_retry(&self, ticket: &NewTicket) -> Result<Ticket, AdmissionError> {
        let max_attempts = self.settings.max_conflict_retries + 1;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.ledger.create_ticket_with_items(ticket).await {
                Ok(created) => return Ok(created),
                Err(LedgerError::LimitExceeded {
                    number,
                    sold_today,
                    requested,
                    max_pieces,
                }) => {
                    return Err(AdmissionError::AccumulatedLimitExceeded {
                        number,
                        sold_today,
                        requested,
                        max_pieces,
                    });
                }
                Err(LedgerError::Storage(e)) => return Err(AdmissionError::Storage(e)),
                Err(LedgerError::Conflict(reason)) => {
                    if attempt >= max_attempts {
                        log::error!(
                            "Ticket commit gave up after {attempt} attempts: {reason}"
                        );
                        return Err(AdmissionError::ContentionRetriesExhausted {
                            attempts: attempt,
                        });
                    }
                    log::warn!("Ticket commit conflict (attempt {attempt}), retrying: {reason}");
                    tokio::time::sleep(self.settings.retry_backoff * attempt).await;
                }
            }
        }
    }

    /// 销售员查看自己的彩票，他人的彩票视为不存在
    pub async fn get_ticket(
        &self,
        seller_id: i64,
        ticket_id: i64,
    ) -> Result<Option<Ticket>, AdmissionError> {
        Ok(self
            .ledger
            .get_ticket(ticket_id)
            .await?
            .filter(|t| t.seller_id == seller_id))
    }

    /// 销售员的彩票列表（分页，最新在前）
    pub async fn list_tickets(
        &self,
        seller_id: i64,
        mut filter: TicketFilter,
        params: &PaginationParams,
    ) -> Result<TicketPageResponse, AdmissionError> {
        filter.seller_ids = vec![seller_id];
        let (tickets, total) = self
            .ledger
            .list_tickets(
                &filter,
                params.get_offset() as u64,
                params.get_limit() as u64,
            )
            .await?;
        Ok(PaginatedResponse::new(
            tickets,
            params.get_page(),
            params.get_page_size(),
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NumberLimit, Schedule, Zone};
    use crate::stores::{InMemoryCatalog, InMemoryLedger};
    use chrono::{NaiveTime, TimeZone};
    use serde_json::json;

    const ZONE: i64 = 1;
    const DRAW: i64 = 2;

    async fn fixture(active: bool) -> (Arc<InMemoryCatalog>, Arc<InMemoryLedger>, AdmissionService) {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog
            .add_zone(Zone {
                id: ZONE,
                name: "Managua".into(),
                description: String::new(),
                time_zone: Some("America/Managua".into()),
                is_active: true,
            })
            .await;
        catalog
            .upsert_schedule(Schedule {
                zone_id: ZONE,
                draw_type_id: DRAW,
                cutoff_time: NaiveTime::from_hms_opt(20, 45, 0).unwrap(),
                is_active: active,
            })
            .await;
        let ledger = Arc::new(InMemoryLedger::new());
        let service = AdmissionService::new(
            catalog.clone(),
            ledger.clone(),
            AdmissionSettings {
                retry_backoff: Duration::from_millis(1),
                ..Default::default()
            },
        );
        (catalog, ledger, service)
    }

    /// Managua 为 UTC-6，无夏令时
    fn managua(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        chrono_tz::America::Managua
            .with_ymd_and_hms(2025, 9, 1, h, m, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_number_pattern() {
        assert!(is_valid_number("00"));
        assert!(is_valid_number("99"));
        assert!(!is_valid_number("7"));
        assert!(!is_valid_number("100"));
        assert!(!is_valid_number("1a"));
        assert!(!is_valid_number(" 12"));
    }

    #[tokio::test]
    async fn test_cutoff_uses_zone_local_time() {
        let (_, _, service) = fixture(true).await;
        let items = [TicketItemRequest::new("12", 1)];

        // 20:44 本地 = 02:44 UTC 次日，UTC 日期与本地日期不同
        let ticket = service
            .submit_ticket(ZONE, DRAW, 9, &items, managua(20, 44, 59))
            .await
            .unwrap();
        assert_eq!(ticket.sale_date, chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());

        let err = service
            .submit_ticket(ZONE, DRAW, 9, &items, managua(20, 45, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::PastCutoff { .. }));
    }

    #[tokio::test]
    async fn test_cutoff_checked_before_item_format() {
        let (_, _, service) = fixture(true).await;
        let items = [TicketItemRequest {
            number: json!("123"),
            pieces: json!(0),
        }];
        let err = service
            .submit_ticket(ZONE, DRAW, 9, &items, managua(21, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AdmissionError::PastCutoff { .. }));
    }

    #[tokio::test]
    async fn test_invalid_items_are_reported_by_field() {
        let (_, _, service) = fixture(true).await;
        let now = managua(10, 0, 0);

        let cases = [
            (json!("7"), json!(1), ItemField::Number),
            (json!(12), json!(1), ItemField::Number),
            (json!("12"), json!(0), ItemField::Pieces),
            (json!("12"), json!(-3), ItemField::Pieces),
            (json!("12"), json!(1.5), ItemField::Pieces),
        ];
        for (number, pieces, expected) in cases {
            let items = [TicketItemRequest { number, pieces }];
            match service.submit_ticket(ZONE, DRAW, 9, &items, now).await {
                Err(AdmissionError::InvalidItemFormat { field, .. }) => assert_eq!(field, expected),
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_format_checked_before_duplicates() {
        let (_, _, service) = fixture(true).await;
        let items = [
            TicketItemRequest::new("12", 1),
            TicketItemRequest::new("12", 1),
            TicketItemRequest::new("x1", 1),
        ];
        let err = service
            .submit_ticket(ZONE, DRAW, 9, &items, managua(10, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::InvalidItemFormat {
                field: ItemField::Number,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_precheck_reports_sold_today() {
        let (catalog, _, service) = fixture(true).await;
        catalog
            .set_limit(NumberLimit {
                zone_id: ZONE,
                draw_type_id: DRAW,
                number: "13".into(),
                max_pieces: 5,
            })
            .await;
        let now = managua(9, 0, 0);
        service
            .submit_ticket(ZONE, DRAW, 9, &[TicketItemRequest::new("13", 3)], now)
            .await
            .unwrap();

        let err = service
            .submit_ticket(ZONE, DRAW, 9, &[TicketItemRequest::new("13", 3)], now)
            .await
            .unwrap_err();
        match err {
            AdmissionError::AccumulatedLimitExceeded {
                number,
                sold_today,
                requested,
                max_pieces,
            } => {
                assert_eq!(number, "13");
                assert_eq!((sold_today, requested, max_pieces), (3, 3, 5));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_huge_piece_count_cannot_pass_limit() {
        let (catalog, ledger, service) = fixture(true).await;
        catalog
            .set_limit(NumberLimit {
                zone_id: ZONE,
                draw_type_id: DRAW,
                number: "12".into(),
                max_pieces: 5,
            })
            .await;
        let now = managua(9, 0, 0);
        service
            .submit_ticket(ZONE, DRAW, 9, &[TicketItemRequest::new("12", 3)], now)
            .await
            .unwrap();

        let items = [TicketItemRequest::new("12", i64::MAX)];
        let err = service
            .submit_ticket(ZONE, DRAW, 9, &items, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::AccumulatedLimitExceeded {
                sold_today: 3,
                requested: i64::MAX,
                max_pieces: 5,
                ..
            }
        ));
        assert_eq!(ledger.ticket_count().await, 1);
        let day = chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert_eq!(ledger.sum_pieces_sold(ZONE, DRAW, "12", day).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_ticket_total_overflow_is_invalid_pieces() {
        let (_, ledger, service) = fixture(true).await;
        let items = [
            TicketItemRequest::new("77", i64::MAX),
            TicketItemRequest::new("78", 1),
        ];
        match service
            .submit_ticket(ZONE, DRAW, 9, &items, managua(9, 0, 0))
            .await
        {
            Err(AdmissionError::InvalidItemFormat { number, field }) => {
                assert_eq!(number, "78");
                assert_eq!(field, ItemField::Pieces);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(ledger.commit_attempts().await, 0);
    }

    #[tokio::test]
    async fn test_inactive_schedule_is_found_through_fallback() {
        let (_, _, service) = fixture(false).await;
        let items = [TicketItemRequest::new("12", 1)];

        // 停用配置: 截止后仍可提交
        let ticket = service
            .submit_ticket(ZONE, DRAW, 9, &items, managua(23, 0, 0))
            .await
            .unwrap();
        assert_eq!(ticket.total_pieces, 1);

        let err = service
            .submit_ticket(ZONE, DRAW + 1, 9, &items, managua(9, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::NoScheduleConfigured {
                zone_id: ZONE,
                draw_type_id: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_conflicts_are_retried_then_exhausted() {
        let (_, ledger, service) = fixture(true).await;
        let items = [TicketItemRequest::new("40", 2)];
        let now = managua(11, 0, 0);

        ledger.inject_conflicts(2).await;
        let ticket = service.submit_ticket(ZONE, DRAW, 9, &items, now).await.unwrap();
        assert_eq!(ticket.total_pieces, 2);
        assert_eq!(ledger.commit_attempts().await, 3);

        ledger.inject_conflicts(10).await;
        let err = service
            .submit_ticket(ZONE, DRAW, 9, &items, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::ContentionRetriesExhausted { attempts: 4 }
        ));
        assert_eq!(ledger.ticket_count().await, 1);
    }

    #[tokio::test]
    async fn test_other_sellers_tickets_are_hidden() {
        let (_, _, service) = fixture(true).await;
        let ticket = service
            .submit_ticket(ZONE, DRAW, 9, &[TicketItemRequest::new("01", 1)], managua(8, 0, 0))
            .await
            .unwrap();

        assert!(service.get_ticket(9, ticket.id).await.unwrap().is_some());
        assert!(service.get_ticket(10, ticket.id).await.unwrap().is_none());

        let page = service
            .list_tickets(10, TicketFilter::default(), &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }
}
