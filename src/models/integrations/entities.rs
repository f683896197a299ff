use serde::{Deserialize, Serialize};

use crate::errors::{LearnboardError, Result};

/// 支持的 LMS 类型，连接器按类型分发
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LmsType {
    Canvas,
    Moodle,
    Blackboard,
}

impl LmsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LmsType::Canvas => "canvas",
            LmsType::Moodle => "moodle",
            LmsType::Blackboard => "blackboard",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "canvas" => Ok(LmsType::Canvas),
            "moodle" => Ok(LmsType::Moodle),
            "blackboard" => Ok(LmsType::Blackboard),
            other => Err(LearnboardError::validation(format!(
                "不支持的 LMS 类型: {other}"
            ))),
        }
    }
}

/// LMS 集成配置（对流水线只读）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmsIntegration {
    pub id: i64,
    pub course_id: i64,
    pub lms_type: LmsType,
    pub api_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub external_course_id: String,
    pub is_active: bool,
    pub sync_enabled: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl crate::entity::lms_integrations::Model {
    pub fn into_integration(self) -> Result<LmsIntegration> {
        Ok(LmsIntegration {
            id: self.id,
            course_id: self.course_id,
            lms_type: LmsType::parse(&self.lms_type)?,
            api_url: self.api_url,
            api_key: self.api_key,
            external_course_id: self.external_course_id,
            is_active: self.is_active,
            sync_enabled: self.sync_enabled,
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0)
                .unwrap_or_default(),
        })
    }
}
