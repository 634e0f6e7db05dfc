mod common;

use chrono::NaiveTime;
use common::*;
use loteria_backend::error::{AdmissionError, ItemField};
use loteria_backend::models::{Schedule, TicketItemRequest};
use loteria_backend::stores::TicketLedger;
use serde_json::json;

#[tokio::test]
async fn total_pieces_is_sum_of_items() {
    let world = World::new().await;
    let ticket = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("12", 3), ("34", 2)]), local(1, 12, 0, 0))
        .await
        .unwrap();

    assert_eq!(ticket.total_pieces, 5);
    assert_eq!(ticket.seller_id, 7);
    assert_eq!(
        ticket
            .items
            .iter()
            .map(|i| (i.number.as_str(), i.pieces))
            .collect::<Vec<_>>(),
        vec![("12", 3), ("34", 2)]
    );
}

#[tokio::test]
async fn exact_cutoff_is_rejected_one_second_before_is_accepted() {
    let world = World::new().await;
    let ticket_items = items(&[("05", 1)]);

    let accepted = world
        .admission
        .submit_ticket(MANAGUA, MANANA, 7, &ticket_items, local(1, 10, 44, 59))
        .await;
    assert!(accepted.is_ok());

    let rejected = world
        .admission
        .submit_ticket(MANAGUA, MANANA, 7, &ticket_items, local(1, 10, 45, 0))
        .await
        .unwrap_err();
    match rejected {
        AdmissionError::PastCutoff {
            cutoff_time,
            local_time,
        } => {
            assert_eq!(cutoff_time, NaiveTime::from_hms_opt(10, 45, 0).unwrap());
            assert_eq!(local_time, NaiveTime::from_hms_opt(10, 45, 0).unwrap());
        }
        other => panic!("expected PastCutoff, got {other:?}"),
    }
}

#[tokio::test]
async fn inactive_schedule_skips_cutoff_but_keeps_limits() {
    let world = World::new().await;
    world
        .catalog
        .upsert_schedule(Schedule {
            zone_id: MANAGUA,
            draw_type_id: MANANA,
            cutoff_time: NaiveTime::from_hms_opt(10, 45, 0).unwrap(),
            is_active: false,
        })
        .await;
    world.limit(MANAGUA, MANANA, "12", 5).await;

    // 截止之后仍可出票
    world
        .admission
        .submit_ticket(MANAGUA, MANANA, 7, &items(&[("12", 5)]), local(1, 23, 0, 0))
        .await
        .unwrap();

    let err = world
        .admission
        .submit_ticket(MANAGUA, MANANA, 7, &items(&[("12", 1)]), local(1, 23, 5, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AdmissionError::AccumulatedLimitExceeded { .. }));
}

#[tokio::test]
async fn missing_schedule_is_rejected() {
    let world = World::new().await;
    let err = world
        .admission
        .submit_ticket(99, NOCHE, 7, &items(&[("12", 1)]), local(1, 9, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdmissionError::NoScheduleConfigured {
            zone_id: 99,
            draw_type_id: NOCHE
        }
    ));
}

#[tokio::test]
async fn empty_ticket_is_rejected() {
    let world = World::new().await;
    let err = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &[], local(1, 9, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AdmissionError::EmptyTicket));
}

#[tokio::test]
async fn duplicate_numbers_rejected_even_without_limits() {
    let world = World::new().await;
    let err = world
        .admission
        .submit_ticket(
            MANAGUA,
            NOCHE,
            7,
            &items(&[("12", 1), ("40", 2), ("12", 1)]),
            local(1, 9, 0, 0),
        )
        .await
        .unwrap_err();
    match err {
        AdmissionError::DuplicateNumberInTicket { number } => assert_eq!(number, "12"),
        other => panic!("expected DuplicateNumberInTicket, got {other:?}"),
    }
    assert_eq!(world.ledger.ticket_count().await, 0);
}

#[tokio::test]
async fn unlimited_number_accepts_large_piece_counts() {
    let world = World::new().await;
    world.limit(MANAGUA, NOCHE, "12", 5).await;

    let ticket = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("77", 1_000_000)]), local(1, 9, 0, 0))
        .await
        .unwrap();
    assert_eq!(ticket.total_pieces, 1_000_000);
}

#[tokio::test]
async fn fractional_and_string_pieces() {
    let world = World::new().await;
    let now = local(1, 9, 0, 0);

    let fractional = [TicketItemRequest {
        number: json!("12"),
        pieces: json!(1.5),
    }];
    let err = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &fractional, now)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdmissionError::InvalidItemFormat {
            field: ItemField::Pieces,
            ..
        }
    ));

    let digit_string = [TicketItemRequest {
        number: json!("12"),
        pieces: json!("4"),
    }];
    let ticket = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &digit_string, now)
        .await
        .unwrap();
    assert_eq!(ticket.total_pieces, 4);
}

#[tokio::test]
async fn daily_limit_resets_on_next_local_day() {
    let world = World::new().await;
    world.limit(MANAGUA, NOCHE, "12", 5).await;
    let three = items(&[("12", 3)]);

    world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &three, local(1, 9, 0, 0))
        .await
        .unwrap();

    let err = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 8, &three, local(1, 9, 30, 0))
        .await
        .unwrap_err();
    match err {
        AdmissionError::AccumulatedLimitExceeded {
            number,
            sold_today,
            requested,
            max_pieces,
        } => {
            assert_eq!(number, "12");
            assert_eq!((sold_today, requested, max_pieces), (3, 3, 5));
        }
        other => panic!("expected AccumulatedLimitExceeded, got {other:?}"),
    }

    // 第二天重新计数
    world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &three, local(2, 9, 0, 0))
        .await
        .unwrap();

    let day1 = chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let day2 = chrono::NaiveDate::from_ymd_opt(2025, 9, 2).unwrap();
    assert_eq!(world.ledger.sum_pieces_sold(MANAGUA, NOCHE, "12", day1).await.unwrap(), 3);
    assert_eq!(world.ledger.sum_pieces_sold(MANAGUA, NOCHE, "12", day2).await.unwrap(), 3);
}

#[tokio::test]
async fn sale_day_follows_zone_local_calendar() {
    let world = World::new().await;
    world.limit(MANAGUA, NOCHE, "12", 5).await;

    // 本地 9月1日 19:00 = UTC 9月2日 01:00
    let ticket = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("12", 4)]), local(1, 19, 0, 0))
        .await
        .unwrap();
    assert_eq!(ticket.sale_date, chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());

    // 本地同一天稍后仍计入同一额度
    let err = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("12", 2)]), local(1, 20, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AdmissionError::AccumulatedLimitExceeded { sold_today: 4, .. }
    ));
}

#[tokio::test]
async fn limits_are_per_zone_and_draw_type() {
    let world = World::new().await;
    world.limit(MANAGUA, NOCHE, "12", 5).await;
    world.limit(GRANADA, NOCHE, "12", 10).await;
    let now = local(1, 9, 0, 0);

    world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("12", 5)]), now)
        .await
        .unwrap();
    world
        .admission
        .submit_ticket(GRANADA, NOCHE, 7, &items(&[("12", 10)]), now)
        .await
        .unwrap();
    // MANANA 没有配置上限
    world
        .admission
        .submit_ticket(MANAGUA, MANANA, 7, &items(&[("12", 50)]), now)
        .await
        .unwrap();

    assert!(
        world
            .admission
            .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("12", 1)]), now)
            .await
            .is_err()
    );
    assert!(
        world
            .admission
            .submit_ticket(GRANADA, NOCHE, 7, &items(&[("12", 1)]), now)
            .await
            .is_err()
    );
}

#[tokio::test]
async fn one_item_over_limit_rejects_whole_ticket() {
    let world = World::new().await;
    world.limit(MANAGUA, NOCHE, "13", 2).await;

    let err = world
        .admission
        .submit_ticket(
            MANAGUA,
            NOCHE,
            7,
            &items(&[("01", 4), ("13", 3)]),
            local(1, 9, 0, 0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AdmissionError::AccumulatedLimitExceeded { .. }));

    let day = chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    assert_eq!(world.ledger.ticket_count().await, 0);
    assert_eq!(world.ledger.sum_pieces_sold(MANAGUA, NOCHE, "01", day).await.unwrap(), 0);
}

#[tokio::test]
async fn max_i64_pieces_cannot_slip_under_a_small_cap() {
    let world = World::new().await;
    world.limit(MANAGUA, NOCHE, "12", 5).await;
    world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("12", 3)]), local(1, 9, 0, 0))
        .await
        .unwrap();

    let err = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 8, &items(&[("12", i64::MAX)]), local(1, 9, 5, 0))
        .await
        .unwrap_err();
    match err {
        AdmissionError::AccumulatedLimitExceeded {
            sold_today,
            requested,
            max_pieces,
            ..
        } => assert_eq!((sold_today, requested, max_pieces), (3, i64::MAX, 5)),
        other => panic!("expected AccumulatedLimitExceeded, got {other:?}"),
    }

    let day = chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    assert_eq!(world.ledger.sum_pieces_sold(MANAGUA, NOCHE, "12", day).await.unwrap(), 3);
    assert_eq!(world.ledger.ticket_count().await, 1);
}

#[tokio::test]
async fn ticket_total_beyond_i64_is_invalid_pieces() {
    let world = World::new().await;

    let err = world
        .admission
        .submit_ticket(
            MANAGUA,
            NOCHE,
            7,
            &items(&[("77", i64::MAX), ("78", 1)]),
            local(1, 9, 0, 0),
        )
        .await
        .unwrap_err();
    assert!(err.is_business_rejection());
    assert!(matches!(
        err,
        AdmissionError::InvalidItemFormat {
            field: ItemField::Pieces,
            ..
        }
    ));
    assert_eq!(world.ledger.ticket_count().await, 0);

    // 单个明细恰好为 i64::MAX 仍然合法
    let ticket = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("77", i64::MAX)]), local(1, 9, 0, 0))
        .await
        .unwrap();
    assert_eq!(ticket.total_pieces, i64::MAX);
}

#[tokio::test]
async fn transient_conflicts_are_retried() {
    let world = World::new().await;
    world.ledger.inject_conflicts(3).await;

    let ticket = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("22", 1)]), local(1, 9, 0, 0))
        .await
        .unwrap();
    assert_eq!(ticket.total_pieces, 1);
    assert_eq!(world.ledger.commit_attempts().await, 4);

    world.ledger.inject_conflicts(4).await;
    let err = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("22", 1)]), local(1, 9, 0, 0))
        .await
        .unwrap_err();
    assert!(!err.is_business_rejection());
    assert!(matches!(
        err,
        AdmissionError::ContentionRetriesExhausted { attempts: 4 }
    ));
}
