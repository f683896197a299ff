use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::errors::LearnboardError;
use crate::models::submissions::entities::SubmissionStatus;
use crate::models::{ApiResponse, ErrorCode};

pub async fn cancel_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_submission_by_id(submission_id).await {
        Ok(Some(submission)) if submission.status == SubmissionStatus::Cancelled => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::AlreadyCancelled,
                "提交已经取消",
            )));
        }
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::SubmissionNotFound,
                "提交不存在",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("查询提交失败: {e}"),
                )),
            );
        }
    }

    match service.get_runner(request).cancel(submission_id).await {
        Ok(submission) => Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "提交已取消"))),
        Err(LearnboardError::InvalidTransition(msg)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(ErrorCode::InvalidStateTransition, msg),
        )),
        Err(LearnboardError::NotFound(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::SubmissionNotFound, msg))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("取消提交失败: {e}"),
            )),
        ),
    }
}
