//! 评估结果存储操作

use super::SeaOrmStorage;
use crate::entity::evaluation_results::{ActiveModel, Column, Entity as EvaluationResults};
use crate::errors::{LearnboardError, Result};
use crate::models::evaluations::entities::{
    EvaluationOutcome, EvaluationResult, NewEvaluationResult,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 分配下一个尝试序号（max + 1，从 1 开始）
    pub async fn next_evaluation_attempt_impl(&self, submission_id: i64) -> Result<i32> {
        let latest = EvaluationResults::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .order_by_desc(Column::AttemptNumber)
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询评估序号失败: {e}")))?;

        Ok(latest.map(|m| m.attempt_number).unwrap_or(0) + 1)
    }

    /// 落库一次评估尝试
    pub async fn create_evaluation_result_impl(
        &self,
        rec: NewEvaluationResult,
    ) -> Result<EvaluationResult> {
        let feedback = if rec.feedback.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&rec.feedback)?)
        };

        let model = ActiveModel {
            submission_id: Set(rec.submission_id),
            attempt_number: Set(rec.attempt_number),
            outcome: Set(rec.outcome.as_str().to_string()),
            score: Set(rec.score),
            score_clamped: Set(rec.score_clamped),
            feedback: Set(feedback),
            model_version: Set(rec.model_version),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("落库评估结果失败: {e}")))?;

        result.into_evaluation()
    }

    /// 活跃评估 = 序号最大的成功尝试
    pub async fn get_active_evaluation_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<EvaluationResult>> {
        let result = EvaluationResults::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .filter(Column::Outcome.eq(EvaluationOutcome::Success.as_str()))
            .order_by_desc(Column::AttemptNumber)
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询活跃评估失败: {e}")))?;

        result.map(|m| m.into_evaluation()).transpose()
    }

    /// 列出某提交的全部评估历史（按尝试序号升序）
    pub async fn list_evaluations_by_submission_impl(
        &self,
        submission_id: i64,
    ) -> Result<Vec<EvaluationResult>> {
        let models = EvaluationResults::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .order_by_asc(Column::AttemptNumber)
            .all(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询评估历史失败: {e}")))?;

        models
            .into_iter()
            .map(|m| m.into_evaluation())
            .collect::<Result<Vec<_>>>()
    }
}
