use crate::models::*;
use crate::services::CatalogService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/catalog/zones",
    tag = "catalog",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取区域列表成功", body = [Zone]),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_zones(service: web::Data<CatalogService>) -> Result<HttpResponse> {
    match service.list_zones().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/catalog/draw-types",
    tag = "catalog",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取开奖类型列表成功", body = [DrawType]),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_draw_types(service: web::Data<CatalogService>) -> Result<HttpResponse> {
    match service.list_draw_types().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/catalog/schedules",
    tag = "catalog",
    params(
        ("zone_id" = Option<i64>, Query, description = "区域ID"),
        ("draw_type_id" = Option<i64>, Query, description = "开奖类型ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取截止时间配置成功", body = [Schedule]),
        (status = 401, description = "未授权")
    )
)]
/// 截止时间配置（含停用的）
pub async fn list_schedules(
    service: web::Data<CatalogService>,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse> {
    match service.list_schedules(&query.into_inner()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/catalog/limits",
    tag = "catalog",
    params(
        ("zone_id" = Option<i64>, Query, description = "区域ID"),
        ("draw_type_id" = Option<i64>, Query, description = "开奖类型ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取号码上限成功", body = [NumberLimit]),
        (status = 401, description = "未授权")
    )
)]
/// 号码每日累计上限，未列出的号码不限量
pub async fn list_limits(
    service: web::Data<CatalogService>,
    query: web::Query<CatalogQuery>,
) -> Result<HttpResponse> {
    match service.list_limits(&query.into_inner()).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn catalog_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/catalog")
            .route("/zones", web::get().to(list_zones))
            .route("/draw-types", web::get().to(list_draw_types))
            .route("/schedules", web::get().to(list_schedules))
            .route("/limits", web::get().to(list_limits)),
    );
}
