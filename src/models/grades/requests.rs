use serde::Deserialize;

use crate::errors::{LearnboardError, Result};

/// 教师人工评分/覆盖请求
#[derive(Debug, Clone, Deserialize)]
pub struct ManualGradeRequest {
    pub grader_id: i64,
    pub score: f64,
    pub feedback: Option<String>,
}

impl ManualGradeRequest {
    pub fn validate(&self, max_score: f64) -> Result<()> {
        if !self.score.is_finite() || self.score < 0.0 || self.score > max_score {
            return Err(LearnboardError::validation(format!(
                "分数必须在 0 到 {max_score} 之间"
            )));
        }
        Ok(())
    }
}
