use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SyncService;
use crate::errors::LearnboardError;
use crate::models::{ApiResponse, ErrorCode};

/// 教师手动重试一条 failed 的同步任务
pub async fn retry_sync_job(
    service: &SyncService,
    request: &HttpRequest,
    job_id: i64,
) -> ActixResult<HttpResponse> {
    let runner = service.get_runner(request);

    match runner.retry_sync_job(job_id).await {
        Ok(job) => Ok(HttpResponse::Ok().json(ApiResponse::success(job, "同步任务已重试"))),
        Err(LearnboardError::InvalidTransition(msg)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::InvalidStateTransition, msg),
        )),
        Err(LearnboardError::NotFound(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::SyncJobNotFound, msg))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("重试同步任务失败: {e}"),
            )),
        ),
    }
}
