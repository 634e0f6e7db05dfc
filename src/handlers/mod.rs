pub mod catalog;
pub mod report;
pub mod ticket;

pub use catalog::catalog_config;
pub use report::report_config;
pub use ticket::ticket_config;

use crate::error::{AppError, AppResult};
use actix_web::{HttpMessage, HttpRequest};

/// 从请求扩展中获取销售员ID（中间件在鉴权后注入）
fn get_seller_id_from_request(req: &HttpRequest) -> AppResult<i64> {
    req.extensions()
        .get::<i64>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}
