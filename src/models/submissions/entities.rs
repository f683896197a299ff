use serde::{Deserialize, Serialize};

use crate::errors::{LearnboardError, Result};

/// 提交生命周期状态
///
/// 正常路径 new → extracting → extracted → evaluating → evaluated → graded → synced；
/// 失败分支 extraction_failed / evaluation_failed；取消分支 cancelled。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    New,
    Extracting,
    Extracted,
    Evaluating,
    Evaluated,
    Graded,
    Synced,
    ExtractionFailed,
    EvaluationFailed,
    Cancelled,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::New => "new",
            SubmissionStatus::Extracting => "extracting",
            SubmissionStatus::Extracted => "extracted",
            SubmissionStatus::Evaluating => "evaluating",
            SubmissionStatus::Evaluated => "evaluated",
            SubmissionStatus::Graded => "graded",
            SubmissionStatus::Synced => "synced",
            SubmissionStatus::ExtractionFailed => "extraction_failed",
            SubmissionStatus::EvaluationFailed => "evaluation_failed",
            SubmissionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "new" => Ok(SubmissionStatus::New),
            "extracting" => Ok(SubmissionStatus::Extracting),
            "extracted" => Ok(SubmissionStatus::Extracted),
            "evaluating" => Ok(SubmissionStatus::Evaluating),
            "evaluated" => Ok(SubmissionStatus::Evaluated),
            "graded" => Ok(SubmissionStatus::Graded),
            "synced" => Ok(SubmissionStatus::Synced),
            "extraction_failed" => Ok(SubmissionStatus::ExtractionFailed),
            "evaluation_failed" => Ok(SubmissionStatus::EvaluationFailed),
            "cancelled" => Ok(SubmissionStatus::Cancelled),
            other => Err(LearnboardError::validation(format!(
                "未知的提交状态: {other}"
            ))),
        }
    }

    /// 终止失败状态（只能通过人工评分继续）
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::ExtractionFailed | SubmissionStatus::EvaluationFailed
        )
    }

    /// 是否已到达（或越过）评分完成
    pub fn is_graded_or_later(&self) -> bool {
        matches!(self, SubmissionStatus::Graded | SubmissionStatus::Synced)
    }

    /// 评分之前的非终止状态才允许取消
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::New
                | SubmissionStatus::Extracting
                | SubmissionStatus::Extracted
                | SubmissionStatus::Evaluating
                | SubmissionStatus::Evaluated
        )
    }

    /// 人工评分入口：已评分可覆盖，终止失败可补录
    pub fn allows_manual_override(&self) -> bool {
        self.is_graded_or_later() || self.is_terminal_failure()
    }
}

/// 提交输入类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionInputKind {
    Text,
    Image,
}

impl SubmissionInputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionInputKind::Text => "text",
            SubmissionInputKind::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(SubmissionInputKind::Text),
            "image" => Ok(SubmissionInputKind::Image),
            other => Err(LearnboardError::validation(format!(
                "未知的提交输入类型: {other}"
            ))),
        }
    }
}

/// 终止失败的原因码（展示给教师）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    // 提取阶段
    Illegible,
    EngineUnavailable,
    BadInput,
    // 评估阶段
    ModelRejected,
    ModelUnavailable,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Illegible => "illegible",
            FailureReason::EngineUnavailable => "engine_unavailable",
            FailureReason::BadInput => "bad_input",
            FailureReason::ModelRejected => "model_rejected",
            FailureReason::ModelUnavailable => "model_unavailable",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "illegible" => Ok(FailureReason::Illegible),
            "engine_unavailable" => Ok(FailureReason::EngineUnavailable),
            "bad_input" => Ok(FailureReason::BadInput),
            "model_rejected" => Ok(FailureReason::ModelRejected),
            "model_unavailable" => Ok(FailureReason::ModelUnavailable),
            other => Err(LearnboardError::validation(format!(
                "未知的失败原因: {other}"
            ))),
        }
    }
}

/// 提交领域模型
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub student_id: i64,
    pub assignment_id: i64,
    pub course_id: i64,
    pub input_type: SubmissionInputKind,
    pub text_content: Option<String>,
    pub image_ref: Option<String>,
    pub extracted_text: Option<String>,
    pub status: SubmissionStatus,
    pub failure_reason: Option<FailureReason>,
    pub extraction_attempts: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl crate::entity::submissions::Model {
    pub fn into_submission(self) -> Result<Submission> {
        Ok(Submission {
            id: self.id,
            student_id: self.student_id,
            assignment_id: self.assignment_id,
            course_id: self.course_id,
            input_type: SubmissionInputKind::parse(&self.input_type)?,
            text_content: self.text_content,
            image_ref: self.image_ref,
            extracted_text: self.extracted_text,
            status: SubmissionStatus::parse(&self.status)?,
            failure_reason: self
                .failure_reason
                .as_deref()
                .map(FailureReason::parse)
                .transpose()?,
            extraction_attempts: self.extraction_attempts,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0)
                .unwrap_or_default(),
            updated_at: chrono::DateTime::from_timestamp(self.updated_at, 0)
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for s in [
            SubmissionStatus::New,
            SubmissionStatus::Extracting,
            SubmissionStatus::Graded,
            SubmissionStatus::ExtractionFailed,
            SubmissionStatus::Cancelled,
        ] {
            assert_eq!(SubmissionStatus::parse(s.as_str()).unwrap(), s);
        }
        assert!(SubmissionStatus::parse("bogus").is_err());
    }

    #[test]
    fn test_cancellable_states() {
        assert!(SubmissionStatus::New.is_cancellable());
        assert!(SubmissionStatus::Evaluating.is_cancellable());
        assert!(!SubmissionStatus::Graded.is_cancellable());
        assert!(!SubmissionStatus::Synced.is_cancellable());
        assert!(!SubmissionStatus::ExtractionFailed.is_cancellable());
        assert!(!SubmissionStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_manual_override_entry_points() {
        assert!(SubmissionStatus::Graded.allows_manual_override());
        assert!(SubmissionStatus::Synced.allows_manual_override());
        assert!(SubmissionStatus::ExtractionFailed.allows_manual_override());
        assert!(SubmissionStatus::EvaluationFailed.allows_manual_override());
        assert!(!SubmissionStatus::Evaluating.allows_manual_override());
        assert!(!SubmissionStatus::Cancelled.allows_manual_override());
    }
}
