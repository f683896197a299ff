use serde::{Deserialize, Serialize};

use crate::errors::{LearnboardError, Result};

/// 同步任务投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncJobStatus {
    Pending,
    Sent,
    Failed,
    Disabled,
}

impl SyncJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncJobStatus::Pending => "pending",
            SyncJobStatus::Sent => "sent",
            SyncJobStatus::Failed => "failed",
            SyncJobStatus::Disabled => "disabled",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(SyncJobStatus::Pending),
            "sent" => Ok(SyncJobStatus::Sent),
            "failed" => Ok(SyncJobStatus::Failed),
            "disabled" => Ok(SyncJobStatus::Disabled),
            other => Err(LearnboardError::validation(format!(
                "未知的同步任务状态: {other}"
            ))),
        }
    }

    /// 非终止：还会被调度器继续处理
    pub fn is_open(&self) -> bool {
        matches!(self, SyncJobStatus::Pending)
    }
}

/// 同步任务领域模型（一条 = 一个评分到一个集成的投递）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub id: i64,
    pub grade_id: i64,
    pub integration_id: i64,
    pub status: SyncJobStatus,
    pub attempt_count: i32,
    pub last_error: Option<String>,
    pub last_attempted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl crate::entity::sync_jobs::Model {
    pub fn into_sync_job(self) -> Result<SyncJob> {
        Ok(SyncJob {
            id: self.id,
            grade_id: self.grade_id,
            integration_id: self.integration_id,
            status: SyncJobStatus::parse(&self.status)?,
            attempt_count: self.attempt_count,
            last_error: self.last_error,
            last_attempted_at: self
                .last_attempted_at
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0)),
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0)
                .unwrap_or_default(),
            updated_at: chrono::DateTime::from_timestamp(self.updated_at, 0)
                .unwrap_or_default(),
        })
    }
}
