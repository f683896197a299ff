use std::sync::Arc;

use crate::models::{
    evaluations::entities::{EvaluationResult, NewEvaluationResult},
    grades::entities::{Grade, GradeUpsert},
    integrations::{entities::LmsIntegration, requests::CreateIntegrationRequest},
    submissions::{
        entities::{FailureReason, Submission, SubmissionStatus},
        requests::{CreateSubmissionRequest, SubmissionListQuery},
        responses::SubmissionListResponse,
    },
    sync::entities::{SyncJob, SyncJobStatus},
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 提交管理方法
    // 创建提交（初始状态 new）
    async fn create_submission(&self, req: CreateSubmissionRequest) -> Result<Submission>;
    // 通过ID获取提交
    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>>;
    // 列出提交
    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse>;
    // 更新提交生命周期状态（同时写入/清除失败原因）
    async fn update_submission_status(
        &self,
        id: i64,
        status: SubmissionStatus,
        failure_reason: Option<FailureReason>,
    ) -> Result<Option<Submission>>;
    // 写入提取文本并置状态为 extracted
    async fn set_extracted_text(&self, id: i64, text: &str) -> Result<Option<Submission>>;
    // 提取阶段重试计数 +1，返回新值
    async fn increment_extraction_attempts(&self, id: i64) -> Result<i32>;
    // 清零提取重试计数（人工重试入口）
    async fn reset_extraction_attempts(&self, id: i64) -> Result<()>;
    // 列出所有未到达终止状态的提交（进程重启后恢复用）
    async fn list_unfinished_submissions(&self) -> Result<Vec<Submission>>;

    /// 评估结果方法
    // 分配下一个尝试序号（每个提交严格递增，不复用）
    async fn next_evaluation_attempt(&self, submission_id: i64) -> Result<i32>;
    // 落库一次评估尝试（无论成败）
    async fn create_evaluation_result(&self, rec: NewEvaluationResult)
    -> Result<EvaluationResult>;
    // 活跃评估 = 序号最大的成功尝试
    async fn get_active_evaluation(&self, submission_id: i64) -> Result<Option<EvaluationResult>>;
    // 列出某提交的全部评估历史
    async fn list_evaluations_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<EvaluationResult>>;

    /// 评分方法
    // 创建或覆盖更新评分（每个提交至多一条）
    async fn upsert_grade(&self, rec: GradeUpsert) -> Result<Grade>;
    // 通过ID获取评分
    async fn get_grade_by_id(&self, id: i64) -> Result<Option<Grade>>;
    // 通过提交ID获取评分
    async fn get_grade_by_submission_id(&self, submission_id: i64) -> Result<Option<Grade>>;

    /// LMS 集成配置方法（调度器只读）
    // 注册集成
    async fn create_integration(&self, req: CreateIntegrationRequest) -> Result<LmsIntegration>;
    // 通过ID获取集成
    async fn get_integration_by_id(&self, id: i64) -> Result<Option<LmsIntegration>>;
    // 列出某课程的集成；active_only 时仅返回启用同步的
    async fn list_integrations_by_course(
        &self,
        course_id: i64,
        active_only: bool,
    ) -> Result<Vec<LmsIntegration>>;

    /// 同步任务方法
    // 创建 pending 任务
    async fn create_sync_job(&self, grade_id: i64, integration_id: i64) -> Result<SyncJob>;
    // 通过ID获取任务
    async fn get_sync_job_by_id(&self, id: i64) -> Result<Option<SyncJob>>;
    // 查找 (grade, integration) 的未终止任务
    async fn find_open_sync_job(
        &self,
        grade_id: i64,
        integration_id: i64,
    ) -> Result<Option<SyncJob>>;
    // 查找 (grade, integration) 的任意任务（重新评分时复用）
    async fn find_sync_job(&self, grade_id: i64, integration_id: i64)
    -> Result<Option<SyncJob>>;
    // 列出某评分的全部任务
    async fn list_sync_jobs_by_grade(&self, grade_id: i64) -> Result<Vec<SyncJob>>;
    // 记一次投递尝试（计数 +1、时间戳），返回更新后的任务
    async fn mark_sync_attempt(&self, id: i64) -> Result<Option<SyncJob>>;
    // 更新任务状态与最近错误
    async fn set_sync_job_status(
        &self,
        id: i64,
        status: SyncJobStatus,
        last_error: Option<String>,
    ) -> Result<Option<SyncJob>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
