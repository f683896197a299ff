use serde::Serialize;

use super::entities::SyncJob;

/// 某评分的同步任务列表
#[derive(Debug, Serialize)]
pub struct SyncJobListResponse {
    pub items: Vec<SyncJob>,
}
