use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{AdmissionService, parse_date};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

use super::get_seller_id_from_request;

#[utoipa::path(
    post,
    path = "/tickets",
    tag = "ticket",
    request_body = CreateTicketRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "出票成功", body = Ticket),
        (status = 400, description = "空票 / 明细格式错误 / 号码重复"),
        (status = 401, description = "未授权"),
        (status = 409, description = "未配置截止时间 / 已过截止时间 / 超出号码累计上限"),
        (status = 503, description = "并发冲突重试耗尽")
    )
)]
/// 提交彩票
///
/// 以服务器当前时间作为提交时间，按区域本地时间判断截止与销售日期。
/// 任一检查失败时不会写入任何数据。
pub async fn create_ticket(
    service: web::Data<AdmissionService>,
    req: HttpRequest,
    body: web::Json<CreateTicketRequest>,
) -> Result<HttpResponse> {
    let seller_id = match get_seller_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let body = body.into_inner();

    match service
        .submit_ticket(
            body.zone_id,
            body.draw_type_id,
            seller_id,
            &body.items,
            Utc::now(),
        )
        .await
    {
        Ok(ticket) => Ok(HttpResponse::Created().json(json!({ "success": true, "data": ticket }))),
        Err(e) => Ok(AppError::from(e).error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/tickets",
    tag = "ticket",
    params(
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("per_page" = Option<u32>, Query, description = "每页数量 (默认20)"),
        ("zone_id" = Option<i64>, Query, description = "区域ID"),
        ("draw_type_id" = Option<i64>, Query, description = "开奖类型ID"),
        ("start" = Option<String>, Query, description = "开始销售日期 YYYY-MM-DD"),
        ("end" = Option<String>, Query, description = "结束销售日期 YYYY-MM-DD")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取彩票列表成功", body = PaginatedResponse<Ticket>),
        (status = 400, description = "日期格式错误"),
        (status = 401, description = "未授权")
    )
)]
/// 当前销售员的彩票列表（最新在前）
pub async fn list_tickets(
    service: web::Data<AdmissionService>,
    req: HttpRequest,
    query: web::Query<TicketQuery>,
) -> Result<HttpResponse> {
    let seller_id = match get_seller_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let query = query.into_inner();

    let filter = match build_ticket_filter(&query) {
        Ok(f) => f,
        Err(e) => return Ok(e.error_response()),
    };
    let params = PaginationParams::new(query.page, query.per_page);

    match service.list_tickets(seller_id, filter, &params).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": page }))),
        Err(e) => Ok(AppError::from(e).error_response()),
    }
}

fn build_ticket_filter(query: &TicketQuery) -> AppResult<TicketFilter> {
    Ok(TicketFilter {
        start: parse_date("start", query.start.as_deref())?,
        end: parse_date("end", query.end.as_deref())?,
        zone_ids: query.zone_id.into_iter().collect(),
        draw_type_ids: query.draw_type_id.into_iter().collect(),
        seller_ids: Vec::new(),
    })
}

#[utoipa::path(
    get,
    path = "/tickets/{id}",
    tag = "ticket",
    params(
        ("id" = i64, Path, description = "彩票ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取彩票成功", body = Ticket),
        (status = 401, description = "未授权"),
        (status = 404, description = "彩票不存在")
    )
)]
/// 查看单张彩票（仅限本人出的票）
pub async fn get_ticket(
    service: web::Data<AdmissionService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let seller_id = match get_seller_id_from_request(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let ticket_id = path.into_inner();

    match service.get_ticket(seller_id, ticket_id).await {
        Ok(Some(ticket)) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": ticket }))),
        Ok(None) => Ok(AppError::NotFound(format!("Ticket {ticket_id} not found")).error_response()),
        Err(e) => Ok(AppError::from(e).error_response()),
    }
}

/// 路由配置
pub fn ticket_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tickets")
            .route("", web::post().to(create_ticket))
            .route("", web::get().to(list_tickets))
            .route("/{id}", web::get().to(get_ticket)),
    );
}
