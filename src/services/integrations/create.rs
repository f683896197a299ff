use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::IntegrationService;
use crate::errors::LearnboardError;
use crate::models::integrations::requests::CreateIntegrationRequest;
use crate::models::{ApiResponse, ErrorCode};

pub async fn create_integration(
    service: &IntegrationService,
    request: &HttpRequest,
    req: CreateIntegrationRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.create_integration(req).await {
        Ok(integration) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(integration, "集成注册成功")))
        }
        Err(LearnboardError::Validation(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidInput, msg))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("注册集成失败: {e}"),
            )),
        ),
    }
}
