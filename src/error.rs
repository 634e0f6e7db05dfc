use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::NaiveTime;
use sea_orm::{DbErr, RuntimeErr};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

use crate::models::ApiResponse;

pub type AppResult<T> = Result<T, AppError>;

/// 出错的明细字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    Number,
    Pieces,
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemField::Number => write!(f, "number"),
            ItemField::Pieces => write!(f, "pieces"),
        }
    }
}

/// 出票引擎的结果错误
///
/// 前六个变体是业务拒绝（调用方修正请求后可重新提交），
/// `Storage` 与 `ContentionRetriesExhausted` 属于基础设施故障。
#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("No schedule configured for zone {zone_id} and draw type {draw_type_id}")]
    NoScheduleConfigured { zone_id: i64, draw_type_id: i64 },

    #[error("Sales are closed for this draw: local time {local_time} is past cutoff {cutoff_time}")]
    PastCutoff {
        cutoff_time: NaiveTime,
        local_time: NaiveTime,
    },

    #[error("Ticket must contain at least one item")]
    EmptyTicket,

    #[error("Invalid {field} in item for number {number:?}: number must be 00-99 and pieces a positive integer")]
    InvalidItemFormat { number: String, field: ItemField },

    #[error("Number {number} appears more than once in the ticket")]
    DuplicateNumberInTicket { number: String },

    #[error(
        "Accumulated limit exceeded for number {number}: {sold_today}+{requested} > {max_pieces}"
    )]
    AccumulatedLimitExceeded {
        number: String,
        sold_today: i64,
        requested: i64,
        max_pieces: i64,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] DbErr),

    #[error("Ticket could not be committed after {attempts} attempts due to contention")]
    ContentionRetriesExhausted { attempts: u32 },
}

impl AdmissionError {
    pub fn is_business_rejection(&self) -> bool {
        !matches!(
            self,
            AdmissionError::Storage(_) | AdmissionError::ContentionRetriesExhausted { .. }
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            AdmissionError::NoScheduleConfigured { .. } => "NO_SCHEDULE_CONFIGURED",
            AdmissionError::PastCutoff { .. } => "PAST_CUTOFF",
            AdmissionError::EmptyTicket => "EMPTY_TICKET",
            AdmissionError::InvalidItemFormat { .. } => "INVALID_ITEM_FORMAT",
            AdmissionError::DuplicateNumberInTicket { .. } => "DUPLICATE_NUMBER_IN_TICKET",
            AdmissionError::AccumulatedLimitExceeded { .. } => "ACCUMULATED_LIMIT_EXCEEDED",
            AdmissionError::Storage(_) => "DATABASE_ERROR",
            AdmissionError::ContentionRetriesExhausted { .. } => "CONTENTION_RETRIES_EXHAUSTED",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionError::EmptyTicket
            | AdmissionError::InvalidItemFormat { .. }
            | AdmissionError::DuplicateNumberInTicket { .. } => StatusCode::BAD_REQUEST,
            AdmissionError::NoScheduleConfigured { .. }
            | AdmissionError::PastCutoff { .. }
            | AdmissionError::AccumulatedLimitExceeded { .. } => StatusCode::CONFLICT,
            AdmissionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AdmissionError::ContentionRetriesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// 供前端渲染的结构化详情
    pub fn details(&self) -> Option<Value> {
        match self {
            AdmissionError::NoScheduleConfigured {
                zone_id,
                draw_type_id,
            } => Some(json!({ "zone_id": zone_id, "draw_type_id": draw_type_id })),
            AdmissionError::PastCutoff {
                cutoff_time,
                local_time,
            } => Some(json!({
                "cutoff_time": cutoff_time.format("%H:%M:%S").to_string(),
                "local_time": local_time.format("%H:%M:%S").to_string(),
            })),
            AdmissionError::InvalidItemFormat { number, field } => {
                Some(json!({ "number": number, "field": field }))
            }
            AdmissionError::DuplicateNumberInTicket { number } => Some(json!({ "number": number })),
            AdmissionError::AccumulatedLimitExceeded {
                number,
                sold_today,
                requested,
                max_pieces,
            } => Some(json!({
                "number": number,
                "sold_today": sold_today,
                "requested": requested,
                "max_pieces": max_pieces,
            })),
            AdmissionError::ContentionRetriesExhausted { attempts } => {
                Some(json!({ "attempts": attempts }))
            }
            AdmissionError::EmptyTicket | AdmissionError::Storage(_) => None,
        }
    }
}

/// 账本写入错误
#[derive(Error, Debug)]
pub enum LedgerError {
    /// 条件自增失败：累计份数会超过上限，事务已回滚
    #[error(
        "Accumulated limit exceeded for number {number}: {sold_today}+{requested} > {max_pieces}"
    )]
    LimitExceeded {
        number: String,
        sold_today: i64,
        requested: i64,
        max_pieces: i64,
    },

    /// 序列化失败或死锁，可重试
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(DbErr),
}

impl From<DbErr> for LedgerError {
    fn from(err: DbErr) -> Self {
        if is_contention(&err) {
            LedgerError::Conflict(err.to_string())
        } else {
            LedgerError::Storage(err)
        }
    }
}

/// Postgres SQLSTATE 40001 (serialization_failure) / 40P01 (deadlock_detected)
pub fn is_contention(err: &DbErr) -> bool {
    let runtime = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return false,
    };
    match runtime {
        RuntimeErr::SqlxError(e) => e
            .as_database_error()
            .is_some_and(|db| is_contention_code(db.code().as_deref())),
        _ => false,
    }
}

fn is_contention_code(code: Option<&str>) -> bool {
    matches!(code, Some("40001" | "40P01"))
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Admission(#[from] AdmissionError),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Admission(e) => e.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message, details) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                ("VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                ("AUTH_ERROR", msg.clone(), None)
            }
            AppError::JwtError(err) => {
                log::warn!("Token rejected: {err}");
                ("AUTH_ERROR", "Invalid access token".to_string(), None)
            }
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone(), None),
            AppError::Admission(err) if err.is_business_rejection() => {
                log::info!("Ticket rejected: {err}");
                (err.code(), err.to_string(), err.details())
            }
            AppError::Admission(err) => {
                log::error!("Ticket admission failed: {err}");
                let message = match err {
                    AdmissionError::Storage(_) => "Database error".to_string(),
                    _ => err.to_string(),
                };
                (err.code(), message, err.details())
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                ("DATABASE_ERROR", "Database error".to_string(), None)
            }
            _ => {
                log::error!("Internal error: {self}");
                ("INTERNAL_ERROR", "Internal server error".to_string(), None)
            }
        };

        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(
            error_code.to_string(),
            message,
            details,
        ))
    }
}
