//! 评估客户端
//!
//! 每次调用分配一个严格递增的尝试序号，无论成败都落库，
//! 评估历史因此是完整的审计记录。

use std::sync::Arc;
use std::time::Duration;

use crate::clients::model::{EvaluationModel, ModelReply, build_prompt, parse_model_reply};
use crate::config::AiConfig;
use crate::errors::Result;
use crate::models::evaluations::entities::{EvaluationOutcome, EvaluationResult, NewEvaluationResult};
use crate::storage::Storage;

pub struct EvaluationClient {
    model: Arc<dyn EvaluationModel>,
    storage: Arc<dyn Storage>,
    timeout: Duration,
    max_score: f64,
}

impl EvaluationClient {
    pub fn new(model: Arc<dyn EvaluationModel>, storage: Arc<dyn Storage>, ai: &AiConfig) -> Self {
        Self {
            model,
            storage,
            timeout: Duration::from_secs(ai.timeout),
            max_score: ai.max_score,
        }
    }

    /// 执行一次评估尝试并落库
    ///
    /// strict 用于 rejected 后的唯一一次重试，提示词会附加格式警告。
    pub async fn evaluate_once(
        &self,
        submission_id: i64,
        text: &str,
        strict: bool,
    ) -> Result<EvaluationResult> {
        let attempt_number = self.storage.next_evaluation_attempt(submission_id).await?;
        let prompt = build_prompt(text, strict);

        let mut rec = NewEvaluationResult {
            submission_id,
            attempt_number,
            outcome: EvaluationOutcome::TransientFailure,
            score: None,
            score_clamped: false,
            feedback: Vec::new(),
            model_version: self.model.model_version().to_string(),
        };

        match tokio::time::timeout(self.timeout, self.model.evaluate(&prompt)).await {
            Err(_elapsed) => {
                tracing::warn!(submission_id, attempt_number, "评估调用超时");
            }
            Ok(Err(e)) => {
                tracing::warn!(submission_id, attempt_number, error = %e, "评估调用传输失败");
            }
            Ok(Ok(raw)) => match parse_model_reply(&raw, self.max_score) {
                ModelReply::Scored {
                    score,
                    clamped,
                    feedback,
                } => {
                    if clamped {
                        tracing::warn!(submission_id, attempt_number, score, "模型分数越界，已收敛");
                    }
                    rec.outcome = EvaluationOutcome::Success;
                    rec.score = Some(score);
                    rec.score_clamped = clamped;
                    rec.feedback = feedback;
                }
                ModelReply::Malformed { detail } => {
                    tracing::warn!(submission_id, attempt_number, detail = %detail, "模型输出不可解析");
                    rec.outcome = EvaluationOutcome::Rejected;
                }
            },
        }

        self.storage.create_evaluation_result(rec).await
    }
}
