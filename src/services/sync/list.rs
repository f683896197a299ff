use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SyncService;
use crate::models::sync::responses::SyncJobListResponse;
use crate::models::{ApiResponse, ErrorCode};

pub async fn list_sync_jobs(
    service: &SyncService,
    request: &HttpRequest,
    grade_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_grade_by_id(grade_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::error_empty(ErrorCode::GradeNotFound, "评分不存在")));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询评分失败: {e}"),
                )),
            );
        }
    }

    match storage.list_sync_jobs_by_grade(grade_id).await {
        Ok(items) => Ok(HttpResponse::Ok()
            .json(ApiResponse::success(SyncJobListResponse { items }, "查询成功"))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("查询同步任务失败: {e}"),
            )),
        ),
    }
}
