use serde::Deserialize;

use super::entities::SubmissionInputKind;
use crate::errors::{LearnboardError, Result};

/// 创建提交请求
///
/// text_content 与 image_ref 二选一。
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubmissionRequest {
    pub student_id: i64,
    pub assignment_id: i64,
    pub course_id: i64,
    pub text_content: Option<String>,
    pub image_ref: Option<String>,
}

impl CreateSubmissionRequest {
    /// 校验请求并返回输入类型
    pub fn input_kind(&self) -> Result<SubmissionInputKind> {
        match (&self.text_content, &self.image_ref) {
            (Some(_), None) => Ok(SubmissionInputKind::Text),
            (None, Some(_)) => Ok(SubmissionInputKind::Image),
            (Some(_), Some(_)) => Err(LearnboardError::validation(
                "text_content 和 image_ref 只能提供一个",
            )),
            (None, None) => Err(LearnboardError::validation(
                "必须提供 text_content 或 image_ref",
            )),
        }
    }
}

/// 提交列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub student_id: Option<i64>,
    pub assignment_id: Option<i64>,
    pub status: Option<String>,
}
