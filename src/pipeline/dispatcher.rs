//! 同步调度器
//!
//! 一个评分对每个集成各有一条 SyncJob，互相独立：
//! 某个 LMS 投递失败不影响其它集成，也不回写提交或评分。

use std::sync::Arc;

use futures_util::future::join_all;

use crate::clients::lms::{ConnectorFactory, GradeDelivery};
use crate::errors::{LearnboardError, Result};
use crate::models::grades::entities::Grade;
use crate::models::integrations::entities::LmsIntegration;
use crate::models::submissions::entities::Submission;
use crate::models::sync::entities::{SyncJob, SyncJobStatus};
use crate::pipeline::retry::RetryPolicy;
use crate::storage::Storage;

pub struct SyncDispatcher {
    storage: Arc<dyn Storage>,
    factory: Arc<dyn ConnectorFactory>,
    policy: RetryPolicy,
}

impl SyncDispatcher {
    pub fn new(
        storage: Arc<dyn Storage>,
        factory: Arc<dyn ConnectorFactory>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            storage,
            factory,
            policy,
        }
    }

    /// 评分落库后的首次分发
    ///
    /// 课程没有活跃集成时返回空列表，调用方据此决定提交停在 graded。
    pub async fn dispatch(&self, submission: &Submission, grade: &Grade) -> Result<Vec<SyncJob>> {
        let integrations = self
            .storage
            .list_integrations_by_course(submission.course_id, true)
            .await?;

        let tasks = integrations.iter().map(|integration| async move {
            let job = match self
                .storage
                .find_open_sync_job(grade.id, integration.id)
                .await?
            {
                Some(existing) => existing,
                None => self.storage.create_sync_job(grade.id, integration.id).await?,
            };
            self.deliver(job, integration, submission, grade).await
        });

        let mut jobs = Vec::with_capacity(integrations.len());
        for result in join_all(tasks).await {
            match result {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    tracing::error!(grade_id = grade.id, error = %e, "同步任务执行出错");
                }
            }
        }
        Ok(jobs)
    }

    /// 重新评分后的再分发
    ///
    /// 已发送的任务重置为 pending 重投；缺失的补建；
    /// failed 的留给教师手动重试，不自动复活。
    pub async fn redispatch_after_regrade(
        &self,
        submission: &Submission,
        grade: &Grade,
    ) -> Result<Vec<SyncJob>> {
        let integrations = self
            .storage
            .list_integrations_by_course(submission.course_id, true)
            .await?;

        let tasks = integrations.iter().map(|integration| async move {
            let job = match self.storage.find_sync_job(grade.id, integration.id).await? {
                None => Some(self.storage.create_sync_job(grade.id, integration.id).await?),
                Some(job) if job.status == SyncJobStatus::Sent => self
                    .storage
                    .set_sync_job_status(job.id, SyncJobStatus::Pending, None)
                    .await?,
                Some(job) if job.status == SyncJobStatus::Pending => Some(job),
                Some(_) => None,
            };
            match job {
                Some(job) => self
                    .deliver(job, integration, submission, grade)
                    .await
                    .map(Some),
                None => Ok(None),
            }
        });

        let mut jobs = Vec::new();
        for result in join_all(tasks).await {
            match result {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(grade_id = grade.id, error = %e, "重新分发同步任务出错");
                }
            }
        }
        Ok(jobs)
    }

    /// 教师手动重试一条 failed 任务
    pub async fn retry_job(&self, job: &SyncJob) -> Result<SyncJob> {
        if job.status != SyncJobStatus::Failed {
            return Err(LearnboardError::invalid_transition(format!(
                "只有 failed 状态的任务可以重试，当前为 {}",
                job.status.as_str()
            )));
        }

        let grade = self
            .storage
            .get_grade_by_id(job.grade_id)
            .await?
            .ok_or_else(|| LearnboardError::not_found(format!("评分 {} 不存在", job.grade_id)))?;
        let submission = self
            .storage
            .get_submission_by_id(grade.submission_id)
            .await?
            .ok_or_else(|| {
                LearnboardError::not_found(format!("提交 {} 不存在", grade.submission_id))
            })?;
        let integration = self
            .storage
            .get_integration_by_id(job.integration_id)
            .await?
            .ok_or_else(|| {
                LearnboardError::not_found(format!("集成 {} 不存在", job.integration_id))
            })?;

        let job = self
            .storage
            .set_sync_job_status(job.id, SyncJobStatus::Pending, None)
            .await?
            .ok_or_else(|| LearnboardError::not_found(format!("同步任务 {} 不存在", job.id)))?;

        self.deliver(job, &integration, &submission, &grade).await
    }

    /// 在重试预算内反复投递一条任务，返回任务的终态
    async fn deliver(
        &self,
        job: SyncJob,
        integration: &LmsIntegration,
        submission: &Submission,
        grade: &Grade,
    ) -> Result<SyncJob> {
        if !integration.sync_enabled || !integration.is_active {
            return self
                .storage
                .set_sync_job_status(job.id, SyncJobStatus::Disabled, None)
                .await?
                .ok_or_else(|| LearnboardError::not_found(format!("同步任务 {} 不存在", job.id)));
        }

        let connector = self.factory.connector_for(integration);
        let delivery = GradeDelivery {
            external_course_id: integration.external_course_id.clone(),
            external_student_id: submission.student_id.to_string(),
            external_assignment_id: submission.assignment_id.to_string(),
            score: grade.score,
        };

        let mut retries: u32 = 0;
        loop {
            let job = self
                .storage
                .mark_sync_attempt(job.id)
                .await?
                .ok_or_else(|| {
                    LearnboardError::not_found(format!("同步任务 {} 不存在", job.id))
                })?;

            match connector.push_grade(&delivery).await {
                Ok(()) => {
                    tracing::info!(
                        job_id = job.id,
                        integration_id = integration.id,
                        lms_type = integration.lms_type.as_str(),
                        "成绩同步成功"
                    );
                    return self
                        .storage
                        .set_sync_job_status(job.id, SyncJobStatus::Sent, None)
                        .await?
                        .ok_or_else(|| {
                            LearnboardError::not_found(format!("同步任务 {} 不存在", job.id))
                        });
                }
                Err(e) => {
                    if self.policy.exhausted(retries + 1) {
                        tracing::warn!(
                            job_id = job.id,
                            integration_id = integration.id,
                            error = %e,
                            "成绩同步重试耗尽"
                        );
                        return self
                            .storage
                            .set_sync_job_status(job.id, SyncJobStatus::Failed, Some(e.to_string()))
                            .await?
                            .ok_or_else(|| {
                                LearnboardError::not_found(format!("同步任务 {} 不存在", job.id))
                            });
                    }
                    tracing::warn!(
                        job_id = job.id,
                        integration_id = integration.id,
                        error = %e,
                        "成绩同步失败，退避后重试"
                    );
                    tokio::time::sleep(self.policy.jittered_delay(retries)).await;
                    retries += 1;
                }
            }
        }
    }
}
