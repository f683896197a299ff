//! 同步任务存储操作

use super::SeaOrmStorage;
use crate::entity::sync_jobs::{ActiveModel, Column, Entity as SyncJobs};
use crate::errors::{LearnboardError, Result};
use crate::models::sync::entities::{SyncJob, SyncJobStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建 pending 任务
    pub async fn create_sync_job_impl(
        &self,
        grade_id: i64,
        integration_id: i64,
    ) -> Result<SyncJob> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            grade_id: Set(grade_id),
            integration_id: Set(integration_id),
            status: Set(SyncJobStatus::Pending.as_str().to_string()),
            attempt_count: Set(0),
            last_error: Set(None),
            last_attempted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("创建同步任务失败: {e}")))?;

        result.into_sync_job()
    }

    /// 通过 ID 获取任务
    pub async fn get_sync_job_by_id_impl(&self, id: i64) -> Result<Option<SyncJob>> {
        let result = SyncJobs::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询同步任务失败: {e}")))?;

        result.map(|m| m.into_sync_job()).transpose()
    }

    /// 查找 (grade, integration) 的未终止任务
    pub async fn find_open_sync_job_impl(
        &self,
        grade_id: i64,
        integration_id: i64,
    ) -> Result<Option<SyncJob>> {
        let result = SyncJobs::find()
            .filter(Column::GradeId.eq(grade_id))
            .filter(Column::IntegrationId.eq(integration_id))
            .filter(Column::Status.eq(SyncJobStatus::Pending.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询同步任务失败: {e}")))?;

        result.map(|m| m.into_sync_job()).transpose()
    }

    /// 查找 (grade, integration) 的任意任务
    pub async fn find_sync_job_impl(
        &self,
        grade_id: i64,
        integration_id: i64,
    ) -> Result<Option<SyncJob>> {
        let result = SyncJobs::find()
            .filter(Column::GradeId.eq(grade_id))
            .filter(Column::IntegrationId.eq(integration_id))
            .order_by_desc(Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询同步任务失败: {e}")))?;

        result.map(|m| m.into_sync_job()).transpose()
    }

    /// 列出某评分的全部任务
    pub async fn list_sync_jobs_by_grade_impl(&self, grade_id: i64) -> Result<Vec<SyncJob>> {
        let models = SyncJobs::find()
            .filter(Column::GradeId.eq(grade_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询同步任务失败: {e}")))?;

        models
            .into_iter()
            .map(|m| m.into_sync_job())
            .collect::<Result<Vec<_>>>()
    }

    /// 记一次投递尝试
    pub async fn mark_sync_attempt_impl(&self, id: i64) -> Result<Option<SyncJob>> {
        let Some(job) = self.get_sync_job_by_id_impl(id).await? else {
            return Ok(None);
        };

        let now = chrono::Utc::now().timestamp();
        let model = ActiveModel {
            id: Set(id),
            attempt_count: Set(job.attempt_count + 1),
            last_attempted_at: Set(Some(now)),
            updated_at: Set(now),
            ..Default::default()
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("更新同步任务失败: {e}")))?;

        self.get_sync_job_by_id_impl(id).await
    }

    /// 更新任务状态与最近错误
    pub async fn set_sync_job_status_impl(
        &self,
        id: i64,
        status: SyncJobStatus,
        last_error: Option<String>,
    ) -> Result<Option<SyncJob>> {
        if self.get_sync_job_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let model = ActiveModel {
            id: Set(id),
            status: Set(status.as_str().to_string()),
            last_error: Set(last_error),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        model
            .update(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("更新同步任务失败: {e}")))?;

        self.get_sync_job_by_id_impl(id).await
    }
}
