use serde::{Deserialize, Serialize};

use crate::errors::{LearnboardError, Result};

/// 评分来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeSource {
    #[serde(rename = "ai")]
    Ai,
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "ai-overridden")]
    AiOverridden,
}

impl GradeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeSource::Ai => "ai",
            GradeSource::Manual => "manual",
            GradeSource::AiOverridden => "ai-overridden",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "ai" => Ok(GradeSource::Ai),
            "manual" => Ok(GradeSource::Manual),
            "ai-overridden" => Ok(GradeSource::AiOverridden),
            other => Err(LearnboardError::validation(format!(
                "未知的评分来源: {other}"
            ))),
        }
    }
}

/// 评分领域模型（每个提交最多一条，覆盖更新而非追加）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub id: i64,
    pub submission_id: i64,
    pub score: f64,
    pub source: GradeSource,
    pub feedback: Option<String>,
    pub grader_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 评分写入记录（创建或覆盖更新）
#[derive(Debug, Clone)]
pub struct GradeUpsert {
    pub submission_id: i64,
    pub score: f64,
    pub source: GradeSource,
    pub feedback: Option<String>,
    pub grader_id: Option<i64>,
}

impl crate::entity::grades::Model {
    pub fn into_grade(self) -> Result<Grade> {
        Ok(Grade {
            id: self.id,
            submission_id: self.submission_id,
            score: self.score,
            source: GradeSource::parse(&self.source)?,
            feedback: self.feedback,
            grader_id: self.grader_id,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0)
                .unwrap_or_default(),
            updated_at: chrono::DateTime::from_timestamp(self.updated_at, 0)
                .unwrap_or_default(),
        })
    }
}
