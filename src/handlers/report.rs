use crate::models::*;
use crate::services::ReportService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/reports/summary",
    tag = "report",
    params(
        ("start" = Option<String>, Query, description = "开始销售日期 YYYY-MM-DD"),
        ("end" = Option<String>, Query, description = "结束销售日期 YYYY-MM-DD"),
        ("zone" = Option<String>, Query, description = "区域ID，逗号分隔"),
        ("draw_type" = Option<String>, Query, description = "开奖类型ID，逗号分隔"),
        ("seller" = Option<String>, Query, description = "销售员ID，逗号分隔"),
        ("group_by" = Option<String>, Query, description = "zone | draw_type | seller (默认 zone)"),
        ("page" = Option<u32>, Query, description = "页码 (默认1)"),
        ("page_size" = Option<u32>, Query, description = "每页数量 (默认50，最大500)"),
        ("daily" = Option<String>, Query, description = "true 时附带按日汇总")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取汇总报表成功", body = SummaryReport),
        (status = 400, description = "参数错误"),
        (status = 401, description = "未授权")
    )
)]
/// 销售汇总：按区域 / 开奖类型 / 销售员分组统计票数与份数
pub async fn get_summary(
    service: web::Data<ReportService>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse> {
    match service.summary(&query.into_inner()).await {
        Ok(report) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": report }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn report_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/reports").route("/summary", web::get().to(get_summary)));
}
