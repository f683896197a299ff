//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod evaluations;
mod grades;
mod integrations;
mod submissions;
mod sync_jobs;

use crate::config::AppConfig;
use crate::errors::{LearnboardError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| LearnboardError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| LearnboardError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| LearnboardError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(LearnboardError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
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
use crate::storage::Storage;

#[async_trait::async_trait]
impl Storage for SeaOrmStorage {
    async fn create_submission(&self, req: CreateSubmissionRequest) -> Result<Submission> {
        self.create_submission_impl(req).await
    }

    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(id).await
    }

    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        self.list_submissions_with_pagination_impl(query).await
    }

    async fn update_submission_status(
        &self,
        id: i64,
        status: SubmissionStatus,
        failure_reason: Option<FailureReason>,
    ) -> Result<Option<Submission>> {
        self.update_submission_status_impl(id, status, failure_reason)
            .await
    }

    async fn set_extracted_text(&self, id: i64, text: &str) -> Result<Option<Submission>> {
        self.set_extracted_text_impl(id, text).await
    }

    async fn increment_extraction_attempts(&self, id: i64) -> Result<i32> {
        self.increment_extraction_attempts_impl(id).await
    }

    async fn reset_extraction_attempts(&self, id: i64) -> Result<()> {
        self.reset_extraction_attempts_impl(id).await
    }

    async fn list_unfinished_submissions(&self) -> Result<Vec<Submission>> {
        self.list_unfinished_submissions_impl().await
    }

    async fn next_evaluation_attempt(&self, submission_id: i64) -> Result<i32> {
        self.next_evaluation_attempt_impl(submission_id).await
    }

    async fn create_evaluation_result(
        &self,
        rec: NewEvaluationResult,
    ) -> Result<EvaluationResult> {
        self.create_evaluation_result_impl(rec).await
    }

    async fn get_active_evaluation(&self, submission_id: i64) -> Result<Option<EvaluationResult>> {
        self.get_active_evaluation_impl(submission_id).await
    }

    async fn list_evaluations_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<EvaluationResult>> {
        self.list_evaluations_by_submission_impl(submission_id)
            .await
    }

    async fn upsert_grade(&self, rec: GradeUpsert) -> Result<Grade> {
        self.upsert_grade_impl(rec).await
    }

    async fn get_grade_by_id(&self, id: i64) -> Result<Option<Grade>> {
        self.get_grade_by_id_impl(id).await
    }

    async fn get_grade_by_submission_id(&self, submission_id: i64) -> Result<Option<Grade>> {
        self.get_grade_by_submission_id_impl(submission_id).await
    }

    async fn create_integration(&self, req: CreateIntegrationRequest) -> Result<LmsIntegration> {
        self.create_integration_impl(req).await
    }

    async fn get_integration_by_id(&self, id: i64) -> Result<Option<LmsIntegration>> {
        self.get_integration_by_id_impl(id).await
    }

    async fn list_integrations_by_course(
        &self,
        course_id: i64,
        active_only: bool,
    ) -> Result<Vec<LmsIntegration>> {
        self.list_integrations_by_course_impl(course_id, active_only)
            .await
    }

    async fn create_sync_job(&self, grade_id: i64, integration_id: i64) -> Result<SyncJob> {
        self.create_sync_job_impl(grade_id, integration_id).await
    }

    async fn get_sync_job_by_id(&self, id: i64) -> Result<Option<SyncJob>> {
        self.get_sync_job_by_id_impl(id).await
    }

    async fn find_open_sync_job(
        &self,
        grade_id: i64,
        integration_id: i64,
    ) -> Result<Option<SyncJob>> {
        self.find_open_sync_job_impl(grade_id, integration_id).await
    }

    async fn find_sync_job(
        &self,
        grade_id: i64,
        integration_id: i64,
    ) -> Result<Option<SyncJob>> {
        self.find_sync_job_impl(grade_id, integration_id).await
    }

    async fn list_sync_jobs_by_grade(&self, grade_id: i64) -> Result<Vec<SyncJob>> {
        self.list_sync_jobs_by_grade_impl(grade_id).await
    }

    async fn mark_sync_attempt(&self, id: i64) -> Result<Option<SyncJob>> {
        self.mark_sync_attempt_impl(id).await
    }

    async fn set_sync_job_status(
        &self,
        id: i64,
        status: SyncJobStatus,
        last_error: Option<String>,
    ) -> Result<Option<SyncJob>> {
        self.set_sync_job_status_impl(id, status, last_error).await
    }
}
