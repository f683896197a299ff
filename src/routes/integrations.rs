use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::integrations::requests::CreateIntegrationRequest;
use crate::services::IntegrationService;
use crate::services::integrations::IntegrationListQuery;

// 懒加载的全局 IntegrationService 实例
static INTEGRATION_SERVICE: Lazy<IntegrationService> = Lazy::new(IntegrationService::new_lazy);

// 注册 LMS 集成
pub async fn create_integration(
    req: HttpRequest,
    body: web::Json<CreateIntegrationRequest>,
) -> ActixResult<HttpResponse> {
    INTEGRATION_SERVICE
        .create_integration(&req, body.into_inner())
        .await
}

// 按课程列出集成
pub async fn list_integrations(
    req: HttpRequest,
    query: web::Query<IntegrationListQuery>,
) -> ActixResult<HttpResponse> {
    INTEGRATION_SERVICE
        .list_integrations(&req, query.into_inner())
        .await
}

// 配置路由
pub fn configure_integrations_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/integrations").service(
            web::resource("")
                .route(web::get().to(list_integrations))
                .route(web::post().to(create_integration)),
        ),
    );
}
