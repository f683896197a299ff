use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::GradeService;
use crate::errors::LearnboardError;
use crate::models::grades::requests::ManualGradeRequest;
use crate::models::{ApiResponse, ErrorCode};

/// 教师人工评分/覆盖入口
pub async fn override_grade(
    service: &GradeService,
    request: &HttpRequest,
    submission_id: i64,
    req: ManualGradeRequest,
) -> ActixResult<HttpResponse> {
    let runner = service.get_runner(request);

    match runner.apply_manual_override(submission_id, &req).await {
        Ok(grade) => Ok(HttpResponse::Ok().json(ApiResponse::success(grade, "评分已更新"))),
        Err(LearnboardError::Validation(msg)) => Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::InvalidInput, msg))),
        Err(LearnboardError::InvalidTransition(msg)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::InvalidStateTransition, msg),
        )),
        Err(LearnboardError::NotFound(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::SubmissionNotFound, msg))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("人工评分失败: {e}"),
            )),
        ),
    }
}
