use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::errors::LearnboardError;
use crate::models::{ApiResponse, ErrorCode};

/// 教师对终止失败的提交重新触发流水线
pub async fn retry_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let runner = service.get_runner(request);

    match runner.retry_failed(submission_id).await {
        Ok(submission) => {
            runner.spawn(submission_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "已重新进入流水线")))
        }
        Err(LearnboardError::InvalidTransition(msg)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::InvalidStateTransition, msg),
        )),
        Err(LearnboardError::NotFound(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::SubmissionNotFound, msg))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("重试提交失败: {e}"),
            )),
        ),
    }
}
