use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::submissions::responses::SubmissionDetailResponse;
use crate::models::{ApiResponse, ErrorCode};

pub async fn get_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    submission_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_submission_by_id(submission_id).await {
        Ok(Some(submission)) => {
            let grade = storage
                .get_grade_by_submission_id(submission_id)
                .await
                .unwrap_or_default();
            let evaluations = storage
                .list_evaluations_by_submission(submission_id)
                .await
                .unwrap_or_default();
            let detail = SubmissionDetailResponse {
                submission,
                grade,
                evaluations,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(detail, "查询成功")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubmissionNotFound,
            "提交不存在",
        ))),
        Err(e) => Ok(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                format!("查询提交失败: {e}"),
            )),
        ),
    }
}
