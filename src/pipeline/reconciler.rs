//! 评分对账
//!
//! 自动评估完成和教师人工评分都经过这里落成 Grade。
//! 人工评分一旦存在，后续自动结果只入评估历史，不再覆盖 Grade。

use std::sync::Arc;

use crate::errors::{LearnboardError, Result};
use crate::models::evaluations::entities::EvaluationResult;
use crate::models::grades::{
    entities::{Grade, GradeSource, GradeUpsert},
    requests::ManualGradeRequest,
};
use crate::storage::Storage;

pub struct GradeReconciler {
    storage: Arc<dyn Storage>,
}

impl GradeReconciler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// 自动评估完成后的对账
    ///
    /// 评估进行期间教师已人工评分的，自动结果被丢弃（只留在评估历史里）。
    pub async fn reconcile_auto(&self, eval: &EvaluationResult) -> Result<Grade> {
        let score = eval.score.ok_or_else(|| {
            LearnboardError::validation("成功的评估结果缺少分数".to_string())
        })?;

        if let Some(existing) = self
            .storage
            .get_grade_by_submission_id(eval.submission_id)
            .await?
            && existing.source != GradeSource::Ai
        {
            tracing::info!(
                submission_id = eval.submission_id,
                attempt_number = eval.attempt_number,
                "已存在人工评分，自动评估结果不落成 Grade"
            );
            return Ok(existing);
        }

        let feedback = if eval.feedback.is_empty() {
            None
        } else {
            Some(
                eval.feedback
                    .iter()
                    .map(|item| format!("{}: {}", item.category, item.comment))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        };

        self.storage
            .upsert_grade(GradeUpsert {
                submission_id: eval.submission_id,
                score,
                source: GradeSource::Ai,
                feedback,
                grader_id: None,
            })
            .await
    }

    /// 教师人工评分
    ///
    /// 已有成功的自动评估时记为 ai-overridden，否则记为 manual。
    pub async fn reconcile_manual(
        &self,
        submission_id: i64,
        req: &ManualGradeRequest,
    ) -> Result<Grade> {
        let source = if self
            .storage
            .get_active_evaluation(submission_id)
            .await?
            .is_some()
        {
            GradeSource::AiOverridden
        } else {
            GradeSource::Manual
        };

        self.storage
            .upsert_grade(GradeUpsert {
                submission_id,
                score: req.score,
                source,
                feedback: req.feedback.clone(),
                grader_id: Some(req.grader_id),
            })
            .await
    }
}
