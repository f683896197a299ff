use serde::{Deserialize, Serialize};

use crate::errors::{LearnboardError, Result};

/// 单次评估的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationOutcome {
    Success,
    // 网络/超时/限流，可重试
    TransientFailure,
    // 模型有响应但内容不可用，按更严格的提示词重试一次
    Rejected,
}

impl EvaluationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationOutcome::Success => "success",
            EvaluationOutcome::TransientFailure => "transient_failure",
            EvaluationOutcome::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(EvaluationOutcome::Success),
            "transient_failure" => Ok(EvaluationOutcome::TransientFailure),
            "rejected" => Ok(EvaluationOutcome::Rejected),
            other => Err(LearnboardError::validation(format!(
                "未知的评估结局: {other}"
            ))),
        }
    }
}

/// 结构化反馈条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub category: String,
    pub comment: String,
}

/// 评估结果领域模型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub id: i64,
    pub submission_id: i64,
    pub attempt_number: i32,
    pub outcome: EvaluationOutcome,
    pub score: Option<f64>,
    pub score_clamped: bool,
    pub feedback: Vec<FeedbackItem>,
    pub model_version: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 待落库的评估尝试记录
#[derive(Debug, Clone)]
pub struct NewEvaluationResult {
    pub submission_id: i64,
    pub attempt_number: i32,
    pub outcome: EvaluationOutcome,
    pub score: Option<f64>,
    pub score_clamped: bool,
    pub feedback: Vec<FeedbackItem>,
    pub model_version: String,
}

impl crate::entity::evaluation_results::Model {
    pub fn into_evaluation(self) -> Result<EvaluationResult> {
        let feedback = match &self.feedback {
            Some(raw) => serde_json::from_str(raw)?,
            None => Vec::new(),
        };
        Ok(EvaluationResult {
            id: self.id,
            submission_id: self.submission_id,
            attempt_number: self.attempt_number,
            outcome: EvaluationOutcome::parse(&self.outcome)?,
            score: self.score,
            score_clamped: self.score_clamped,
            feedback,
            model_version: self.model_version,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0)
                .unwrap_or_default(),
        })
    }
}
