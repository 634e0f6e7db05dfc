mod common;

use common::*;
use loteria_backend::error::AdmissionError;
use loteria_backend::stores::TicketLedger;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_sellers_never_exceed_daily_cap() {
    let world = Arc::new(World::new().await);
    world.limit(MANAGUA, NOCHE, "12", 20).await;
    let now = local(1, 12, 0, 0);

    // 24 张票各 3 份 = 72 份，上限 20
    let mut handles = Vec::new();
    for seller in 0..24i64 {
        let world = world.clone();
        handles.push(tokio::spawn(async move {
            world
                .admission
                .submit_ticket(MANAGUA, NOCHE, seller, &items(&[("12", 3)]), now)
                .await
        }));
    }

    let mut accepted = 0i64;
    let mut rejected = 0i64;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(ticket) => accepted += ticket.total_pieces,
            Err(AdmissionError::AccumulatedLimitExceeded { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let day = now.with_timezone(&chrono_tz::America::Managua).date_naive();
    let sold = world
        .ledger
        .sum_pieces_sold(MANAGUA, NOCHE, "12", day)
        .await
        .unwrap();

    assert_eq!(sold, accepted);
    assert!(accepted <= 20);
    // 3 的倍数中不超过 20 的最大值
    assert_eq!(accepted, 18);
    assert_eq!(rejected, 24 - 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_multi_item_tickets_keep_every_cap() {
    let world = Arc::new(World::new().await);
    world.limit(GRANADA, MANANA, "01", 10).await;
    world.limit(GRANADA, MANANA, "02", 7).await;
    let now = local(3, 8, 0, 0);

    let mut handles = Vec::new();
    for seller in 0..16i64 {
        let world = world.clone();
        // 一半的票号码顺序相反
        let pairs: &[(&str, i64)] = if seller % 2 == 0 {
            &[("01", 2), ("02", 1)]
        } else {
            &[("02", 1), ("01", 2)]
        };
        let ticket_items = items(pairs);
        handles.push(tokio::spawn(async move {
            world
                .admission
                .submit_ticket(GRANADA, MANANA, seller, &ticket_items, now)
                .await
        }));
    }

    let mut accepted_tickets = 0i64;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted_tickets += 1;
        }
    }

    let day = now.with_timezone(&chrono_tz::America::Managua).date_naive();
    let sold_01 = world
        .ledger
        .sum_pieces_sold(GRANADA, MANANA, "01", day)
        .await
        .unwrap();
    let sold_02 = world
        .ledger
        .sum_pieces_sold(GRANADA, MANANA, "02", day)
        .await
        .unwrap();

    assert!(sold_01 <= 10);
    assert!(sold_02 <= 7);
    assert_eq!(sold_01, accepted_tickets * 2);
    assert_eq!(sold_02, accepted_tickets);
    assert_eq!(accepted_tickets, 5);
}
