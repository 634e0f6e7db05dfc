mod common;

use actix_web::{App, http::StatusCode, test, web};
use common::*;
use loteria_backend::config::ReportsConfig;
use loteria_backend::handlers;
use loteria_backend::middlewares::AuthMiddleware;
use loteria_backend::services::{CatalogService, ReportService};
use loteria_backend::utils::JwtService;
use serde_json::{Value, json};

const SECRET: &str = "integration-secret";

macro_rules! app {
    ($world:expr) => {
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(JwtService::new(SECRET, 600)))
                .app_data(web::Data::new($world.admission.clone()))
                .app_data(web::Data::new(ReportService::new(
                    $world.catalog.clone(),
                    $world.ledger.clone(),
                    ReportsConfig::default(),
                )))
                .app_data(web::Data::new(CatalogService::new($world.catalog.clone())))
                .service(
                    web::scope("/api/v1")
                        .configure(handlers::ticket_config)
                        .configure(handlers::report_config)
                        .configure(handlers::catalog_config),
                ),
        )
        .await
    };
}

fn bearer(seller_id: i64) -> (&'static str, String) {
    let token = JwtService::new(SECRET, 600)
        .generate_access_token(seller_id)
        .unwrap();
    ("Authorization", format!("Bearer {token}"))
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let world = World::new().await;
    let app = app!(world);

    let req = test::TestRequest::get().uri("/api/v1/catalog/zones").to_request();
    let result = test::try_call_service(&app, req).await;
    let status = match result {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    };
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn catalog_lists_zones() {
    let world = World::new().await;
    let app = app!(world);

    let req = test::TestRequest::get()
        .uri("/api/v1/catalog/zones")
        .insert_header(bearer(1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn rejection_carries_code_and_details() {
    let world = World::new().await;
    let app = app!(world);

    let req = test::TestRequest::post()
        .uri("/api/v1/tickets")
        .insert_header(bearer(7))
        .set_json(json!({
            "zone_id": 404,
            "draw_type_id": NOCHE,
            "items": [{ "number": "12", "pieces": 1 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NO_SCHEDULE_CONFIGURED");
    assert_eq!(body["error"]["details"]["zone_id"], 404);
}

#[actix_web::test]
async fn schedule_is_checked_before_item_format() {
    let world = World::new().await;
    let app = app!(world);

    let req = test::TestRequest::post()
        .uri("/api/v1/tickets")
        .insert_header(bearer(7))
        .set_json(json!({
            "zone_id": MANAGUA,
            "draw_type_id": 999,
            "items": [{ "number": "123", "pieces": 1 }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    // 没有截止时间配置时先报 409
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn seller_sees_only_own_tickets() {
    let world = World::new().await;
    let app = app!(world);

    // 直接经由引擎出票，避免依赖当前时钟与截止时间
    let ticket = world
        .admission
        .submit_ticket(MANAGUA, NOCHE, 7, &items(&[("12", 2)]), local(1, 9, 0, 0))
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/tickets/{}", ticket.id))
        .insert_header(bearer(7))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total_pieces"], 2);
    assert_eq!(body["data"]["items"][0]["number"], "12");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/tickets/{}", ticket.id))
        .insert_header(bearer(8))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/v1/tickets?per_page=5")
        .insert_header(bearer(7))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["page_size"], 5);
}

#[actix_web::test]
async fn report_summary_rejects_bad_dates() {
    let world = World::new().await;
    let app = app!(world);

    let req = test::TestRequest::get()
        .uri("/api/v1/reports/summary?start=2025-13-01")
        .insert_header(bearer(1))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/reports/summary?group_by=draw_type&daily=1")
        .insert_header(bearer(1))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["group_by"], "draw_type");
    assert_eq!(body["data"]["totals"]["total_tickets"], 0);
    assert_eq!(body["data"]["daily"].as_array().unwrap().len(), 0);
}
