//! 路径参数提取器
//!
//! 把 `{id}` 解析为 i64，非法值直接回 400 而不是 404。

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError};
use std::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

#[derive(Debug)]
pub struct SafeIDI64(pub i64);

#[derive(Debug)]
pub struct InvalidIdError(String);

impl std::fmt::Display for InvalidIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid id: {}", self.0)
    }
}

impl ResponseError for InvalidIdError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::InvalidInput,
            format!("非法的 ID 参数: {}", self.0),
        ))
    }
}

impl FromRequest for SafeIDI64 {
    type Error = InvalidIdError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("id").unwrap_or_default();
        ready(
            raw.parse::<i64>()
                .map(SafeIDI64)
                .map_err(|_| InvalidIdError(raw.to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_parses_valid_id() {
        let req = TestRequest::default()
            .param("id", "42")
            .to_http_request();
        let id = SafeIDI64::from_request(&req, &mut Payload::None)
            .await
            .unwrap();
        assert_eq!(id.0, 42);
    }

    #[actix_web::test]
    async fn test_rejects_non_numeric_id() {
        let req = TestRequest::default()
            .param("id", "abc")
            .to_http_request();
        assert!(
            SafeIDI64::from_request(&req, &mut Payload::None)
                .await
                .is_err()
        );
    }
}
