//! JSON / 查询参数解析错误处理器
//!
//! 让参数错误也走统一的 ApiResponse 结构，而不是 actix 默认的纯文本。

use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{Error, HttpRequest, HttpResponse};

use crate::models::{ApiResponse, ErrorCode};

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::InvalidInput,
        format!("请求体解析失败: {err}"),
    ));
    InternalError::from_response(err, response).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::InvalidInput,
        format!("查询参数解析失败: {err}"),
    ));
    InternalError::from_response(err, response).into()
}
