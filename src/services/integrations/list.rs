use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{IntegrationListQuery, IntegrationService};
use crate::models::{ApiResponse, ErrorCode};

pub async fn list_integrations(
    service: &IntegrationService,
    request: &HttpRequest,
    query: IntegrationListQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage
        .list_integrations_by_course(query.course_id, query.active_only)
        .await
    {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::success(items, "查询成功"))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("查询集成列表失败: {e}"),
            )),
        ),
    }
}
