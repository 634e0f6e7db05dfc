#![allow(dead_code)]

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use loteria_backend::models::{DrawType, NumberLimit, Schedule, TicketItemRequest, Zone};
use loteria_backend::services::{AdmissionService, AdmissionSettings};
use loteria_backend::stores::{InMemoryCatalog, InMemoryLedger};
use std::sync::Arc;
use std::time::Duration;

pub const MANAGUA: i64 = 1;
pub const GRANADA: i64 = 2;
pub const MANANA: i64 = 10;
pub const NOCHE: i64 = 20;

/// Managua / Granada 均为 UTC-6
pub fn local(day: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
    chrono_tz::America::Managua
        .with_ymd_and_hms(2025, 9, day, h, m, s)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn items(pairs: &[(&str, i64)]) -> Vec<TicketItemRequest> {
    pairs
        .iter()
        .map(|(number, pieces)| TicketItemRequest::new(number, *pieces))
        .collect()
}

pub struct World {
    pub catalog: Arc<InMemoryCatalog>,
    pub ledger: Arc<InMemoryLedger>,
    pub admission: AdmissionService,
}

impl World {
    /// 两个区域、两种开奖，截止时间 10:45 / 20:45，全部启用，无号码上限
    pub async fn new() -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        for (id, name) in [(MANAGUA, "Managua"), (GRANADA, "Granada")] {
            catalog
                .add_zone(Zone {
                    id,
                    name: name.to_string(),
                    description: String::new(),
                    time_zone: Some("America/Managua".to_string()),
                    is_active: true,
                })
                .await;
        }
        for (id, code, name) in [(MANANA, "manana", "Mañana"), (NOCHE, "noche", "Noche")] {
            catalog
                .add_draw_type(DrawType {
                    id,
                    code: code.to_string(),
                    name: name.to_string(),
                    is_active: true,
                })
                .await;
        }
        for zone_id in [MANAGUA, GRANADA] {
            for (draw_type_id, h, m) in [(MANANA, 10, 45), (NOCHE, 20, 45)] {
                catalog
                    .upsert_schedule(Schedule {
                        zone_id,
                        draw_type_id,
                        cutoff_time: NaiveTime::from_hms_opt(h, m, 0).unwrap(),
                        is_active: true,
                    })
                    .await;
            }
        }

        let ledger = Arc::new(InMemoryLedger::new());
        let admission = AdmissionService::new(
            catalog.clone(),
            ledger.clone(),
            AdmissionSettings {
                retry_backoff: Duration::from_millis(1),
                ..Default::default()
            },
        );
        Self {
            catalog,
            ledger,
            admission,
        }
    }

    pub async fn limit(&self, zone_id: i64, draw_type_id: i64, number: &str, max_pieces: i64) {
        self.catalog
            .set_limit(NumberLimit {
                zone_id,
                draw_type_id,
                number: number.to_string(),
                max_pieces,
            })
            .await;
    }
}
