//! 提交存储操作

use super::SeaOrmStorage;
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{LearnboardError, Result};
use crate::models::{
    PaginationInfo,
    submissions::{
        entities::{FailureReason, Submission, SubmissionStatus},
        requests::{CreateSubmissionRequest, SubmissionListQuery},
        responses::SubmissionListResponse,
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 创建提交（初始状态 new）
    pub async fn create_submission_impl(
        &self,
        req: CreateSubmissionRequest,
    ) -> Result<Submission> {
        let input_kind = req.input_kind()?;
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            student_id: Set(req.student_id),
            assignment_id: Set(req.assignment_id),
            course_id: Set(req.course_id),
            input_type: Set(input_kind.as_str().to_string()),
            text_content: Set(req.text_content),
            image_ref: Set(req.image_ref),
            extracted_text: Set(None),
            status: Set(SubmissionStatus::New.as_str().to_string()),
            failure_reason: Set(None),
            extraction_attempts: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("创建提交失败: {e}")))?;

        result.into_submission()
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(&self, id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询提交失败: {e}")))?;

        result.map(|m| m.into_submission()).transpose()
    }

    /// 列出提交（分页）
    pub async fn list_submissions_with_pagination_impl(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(20).clamp(1, 100) as u64;

        let mut select = Submissions::find();

        if let Some(student_id) = query.student_id {
            select = select.filter(Column::StudentId.eq(student_id));
        }
        if let Some(assignment_id) = query.assignment_id {
            select = select.filter(Column::AssignmentId.eq(assignment_id));
        }
        if let Some(status) = &query.status {
            // 非法状态过滤值直接报错，而不是静默返回全部
            let status = SubmissionStatus::parse(status)?;
            select = select.filter(Column::Status.eq(status.as_str()));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| LearnboardError::database_operation(format!("统计提交数失败: {e}")))?;

        let models = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询提交列表失败: {e}")))?;

        let items = models
            .into_iter()
            .map(|m| m.into_submission())
            .collect::<Result<Vec<_>>>()?;

        Ok(SubmissionListResponse {
            items,
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: total.div_ceil(size) as i64,
            },
        })
    }

    /// 更新生命周期状态；failure_reason 为 None 时清除原因
    pub async fn update_submission_status_impl(
        &self,
        id: i64,
        status: SubmissionStatus,
        failure_reason: Option<FailureReason>,
    ) -> Result<Option<Submission>> {
        if self.get_submission_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let model = ActiveModel {
            id: Set(id),
            status: Set(status.as_str().to_string()),
            failure_reason: Set(failure_reason.map(|r| r.as_str().to_string())),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("更新提交状态失败: {e}")))?;

        self.get_submission_by_id_impl(id).await
    }

    /// 写入提取文本并置状态为 extracted
    pub async fn set_extracted_text_impl(
        &self,
        id: i64,
        text: &str,
    ) -> Result<Option<Submission>> {
        if self.get_submission_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let model = ActiveModel {
            id: Set(id),
            extracted_text: Set(Some(text.to_string())),
            status: Set(SubmissionStatus::Extracted.as_str().to_string()),
            failure_reason: Set(None),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("写入提取文本失败: {e}")))?;

        self.get_submission_by_id_impl(id).await
    }

    /// 提取重试计数 +1
    pub async fn increment_extraction_attempts_impl(&self, id: i64) -> Result<i32> {
        let submission = self
            .get_submission_by_id_impl(id)
            .await?
            .ok_or_else(|| LearnboardError::not_found(format!("提交 {id} 不存在")))?;

        let attempts = submission.extraction_attempts + 1;
        let model = ActiveModel {
            id: Set(id),
            extraction_attempts: Set(attempts),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("更新重试计数失败: {e}")))?;

        Ok(attempts)
    }

    /// 清零提取重试计数
    pub async fn reset_extraction_attempts_impl(&self, id: i64) -> Result<()> {
        let model = ActiveModel {
            id: Set(id),
            extraction_attempts: Set(0),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("清零重试计数失败: {e}")))?;
        Ok(())
    }

    /// 列出所有未终止的提交（重启恢复）
    pub async fn list_unfinished_submissions_impl(&self) -> Result<Vec<Submission>> {
        let open_states = [
            SubmissionStatus::New.as_str(),
            SubmissionStatus::Extracting.as_str(),
            SubmissionStatus::Extracted.as_str(),
            SubmissionStatus::Evaluating.as_str(),
            SubmissionStatus::Evaluated.as_str(),
        ];

        let models = Submissions::find()
            .filter(Column::Status.is_in(open_states))
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询未完成提交失败: {e}")))?;

        models
            .into_iter()
            .map(|m| m.into_submission())
            .collect::<Result<Vec<_>>>()
    }
}
