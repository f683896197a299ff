use serde::Serialize;

use crate::models::PaginationInfo;
use crate::models::evaluations::entities::EvaluationResult;
use crate::models::grades::entities::Grade;
use crate::models::submissions::entities::Submission;

/// 提交详情响应（含评分与评估历史）
#[derive(Debug, Serialize)]
pub struct SubmissionDetailResponse {
    #[serde(flatten)]
    pub submission: Submission,
    pub grade: Option<Grade>,
    pub evaluations: Vec<EvaluationResult>,
}

/// 提交列表响应
#[derive(Debug, Serialize)]
pub struct SubmissionListResponse {
    pub items: Vec<Submission>,
    pub pagination: PaginationInfo,
}
