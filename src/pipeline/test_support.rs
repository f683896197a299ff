//! 流水线测试用的内存存储与桩客户端

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::clients::lms::{ConnectorFactory, GradeDelivery, LmsConnector};
use crate::clients::model::{EvaluationModel, ModelTransportError};
use crate::clients::ocr::{OcrEngine, OcrError};
use crate::errors::{LearnboardError, Result};
use crate::models::{
    PaginationInfo,
    evaluations::entities::{EvaluationOutcome, EvaluationResult, NewEvaluationResult},
    grades::entities::{Grade, GradeUpsert},
    integrations::{
        entities::{LmsIntegration, LmsType},
        requests::CreateIntegrationRequest,
    },
    submissions::{
        entities::{FailureReason, Submission, SubmissionStatus},
        requests::{CreateSubmissionRequest, SubmissionListQuery},
        responses::SubmissionListResponse,
    },
    sync::entities::{SyncJob, SyncJobStatus},
};
use crate::storage::Storage;

#[derive(Default)]
struct Inner {
    submissions: HashMap<i64, Submission>,
    evaluations: Vec<EvaluationResult>,
    grades: HashMap<i64, Grade>,
    integrations: HashMap<i64, LmsIntegration>,
    sync_jobs: HashMap<i64, SyncJob>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// 全内存的 Storage 实现，行为与 SeaOrmStorage 对齐
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn create_submission(&self, req: CreateSubmissionRequest) -> Result<Submission> {
        let input_type = req.input_kind()?;
        let mut inner = self.inner.lock().unwrap();
        let now = chrono::Utc::now();
        let submission = Submission {
            id: inner.next_id(),
            student_id: req.student_id,
            assignment_id: req.assignment_id,
            course_id: req.course_id,
            input_type,
            text_content: req.text_content,
            image_ref: req.image_ref,
            extracted_text: None,
            status: SubmissionStatus::New,
            failure_reason: None,
            extraction_attempts: 0,
            created_at: now,
            updated_at: now,
        };
        inner.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn get_submission_by_id(&self, id: i64) -> Result<Option<Submission>> {
        Ok(self.inner.lock().unwrap().submissions.get(&id).cloned())
    }

    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let status = query.status.as_deref().map(SubmissionStatus::parse).transpose()?;
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<Submission> = inner
            .submissions
            .values()
            .filter(|s| query.student_id.is_none_or(|id| s.student_id == id))
            .filter(|s| query.assignment_id.is_none_or(|id| s.assignment_id == id))
            .filter(|s| status.is_none_or(|st| s.status == st))
            .cloned()
            .collect();
        items.sort_by_key(|s| std::cmp::Reverse(s.id));
        let total = items.len() as i64;
        Ok(SubmissionListResponse {
            items,
            pagination: PaginationInfo {
                page: 1,
                page_size: total.max(1),
                total,
                total_pages: 1,
            },
        })
    }

    async fn update_submission_status(
        &self,
        id: i64,
        status: SubmissionStatus,
        failure_reason: Option<FailureReason>,
    ) -> Result<Option<Submission>> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.submissions.get_mut(&id).map(|s| {
            s.status = status;
            s.failure_reason = failure_reason;
            s.updated_at = chrono::Utc::now();
            s.clone()
        }))
    }

    async fn set_extracted_text(&self, id: i64, text: &str) -> Result<Option<Submission>> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.submissions.get_mut(&id).map(|s| {
            s.extracted_text = Some(text.to_string());
            s.status = SubmissionStatus::Extracted;
            s.failure_reason = None;
            s.updated_at = chrono::Utc::now();
            s.clone()
        }))
    }

    async fn increment_extraction_attempts(&self, id: i64) -> Result<i32> {
        let mut inner = self.inner.lock().unwrap();
        let submission = inner
            .submissions
            .get_mut(&id)
            .ok_or_else(|| LearnboardError::not_found(format!("提交 {id} 不存在")))?;
        submission.extraction_attempts += 1;
        Ok(submission.extraction_attempts)
    }

    async fn reset_extraction_attempts(&self, id: i64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(s) = inner.submissions.get_mut(&id) {
            s.extraction_attempts = 0;
        }
        Ok(())
    }

    async fn list_unfinished_submissions(&self) -> Result<Vec<Submission>> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<Submission> = inner
            .submissions
            .values()
            .filter(|s| s.status.is_cancellable())
            .cloned()
            .collect();
        items.sort_by_key(|s| s.id);
        Ok(items)
    }

    async fn next_evaluation_attempt(&self, submission_id: i64) -> Result<i32> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .evaluations
            .iter()
            .filter(|e| e.submission_id == submission_id)
            .map(|e| e.attempt_number)
            .max()
            .unwrap_or(0)
            + 1)
    }

    async fn create_evaluation_result(
        &self,
        rec: NewEvaluationResult,
    ) -> Result<EvaluationResult> {
        let mut inner = self.inner.lock().unwrap();
        let eval = EvaluationResult {
            id: inner.next_id(),
            submission_id: rec.submission_id,
            attempt_number: rec.attempt_number,
            outcome: rec.outcome,
            score: rec.score,
            score_clamped: rec.score_clamped,
            feedback: rec.feedback,
            model_version: rec.model_version,
            created_at: chrono::Utc::now(),
        };
        inner.evaluations.push(eval.clone());
        Ok(eval)
    }

    async fn get_active_evaluation(&self, submission_id: i64) -> Result<Option<EvaluationResult>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .evaluations
            .iter()
            .filter(|e| {
                e.submission_id == submission_id && e.outcome == EvaluationOutcome::Success
            })
            .max_by_key(|e| e.attempt_number)
            .cloned())
    }

    async fn list_evaluations_by_submission(
        &self,
        submission_id: i64,
    ) -> Result<Vec<EvaluationResult>> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<EvaluationResult> = inner
            .evaluations
            .iter()
            .filter(|e| e.submission_id == submission_id)
            .cloned()
            .collect();
        items.sort_by_key(|e| e.attempt_number);
        Ok(items)
    }

    async fn upsert_grade(&self, rec: GradeUpsert) -> Result<Grade> {
        let mut inner = self.inner.lock().unwrap();
        let now = chrono::Utc::now();
        if let Some(existing) = inner
            .grades
            .values_mut()
            .find(|g| g.submission_id == rec.submission_id)
        {
            existing.score = rec.score;
            existing.source = rec.source;
            existing.feedback = rec.feedback;
            existing.grader_id = rec.grader_id;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let grade = Grade {
            id: inner.next_id(),
            submission_id: rec.submission_id,
            score: rec.score,
            source: rec.source,
            feedback: rec.feedback,
            grader_id: rec.grader_id,
            created_at: now,
            updated_at: now,
        };
        inner.grades.insert(grade.id, grade.clone());
        Ok(grade)
    }

    async fn get_grade_by_id(&self, id: i64) -> Result<Option<Grade>> {
        Ok(self.inner.lock().unwrap().grades.get(&id).cloned())
    }

    async fn get_grade_by_submission_id(&self, submission_id: i64) -> Result<Option<Grade>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .grades
            .values()
            .find(|g| g.submission_id == submission_id)
            .cloned())
    }

    async fn create_integration(&self, req: CreateIntegrationRequest) -> Result<LmsIntegration> {
        let lms_type = LmsType::parse(&req.lms_type)?;
        let mut inner = self.inner.lock().unwrap();
        let integration = LmsIntegration {
            id: inner.next_id(),
            course_id: req.course_id,
            lms_type,
            api_url: req.api_url,
            api_key: req.api_key,
            external_course_id: req.external_course_id,
            is_active: true,
            sync_enabled: true,
            created_at: chrono::Utc::now(),
        };
        inner.integrations.insert(integration.id, integration.clone());
        Ok(integration)
    }

    async fn get_integration_by_id(&self, id: i64) -> Result<Option<LmsIntegration>> {
        Ok(self.inner.lock().unwrap().integrations.get(&id).cloned())
    }

    async fn list_integrations_by_course(
        &self,
        course_id: i64,
        active_only: bool,
    ) -> Result<Vec<LmsIntegration>> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<LmsIntegration> = inner
            .integrations
            .values()
            .filter(|i| i.course_id == course_id)
            .filter(|i| !active_only || (i.is_active && i.sync_enabled))
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }

    async fn create_sync_job(&self, grade_id: i64, integration_id: i64) -> Result<SyncJob> {
        let mut inner = self.inner.lock().unwrap();
        let now = chrono::Utc::now();
        let job = SyncJob {
            id: inner.next_id(),
            grade_id,
            integration_id,
            status: SyncJobStatus::Pending,
            attempt_count: 0,
            last_error: None,
            last_attempted_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.sync_jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn get_sync_job_by_id(&self, id: i64) -> Result<Option<SyncJob>> {
        Ok(self.inner.lock().unwrap().sync_jobs.get(&id).cloned())
    }

    async fn find_open_sync_job(
        &self,
        grade_id: i64,
        integration_id: i64,
    ) -> Result<Option<SyncJob>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sync_jobs
            .values()
            .find(|j| {
                j.grade_id == grade_id
                    && j.integration_id == integration_id
                    && j.status.is_open()
            })
            .cloned())
    }

    async fn find_sync_job(
        &self,
        grade_id: i64,
        integration_id: i64,
    ) -> Result<Option<SyncJob>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sync_jobs
            .values()
            .filter(|j| j.grade_id == grade_id && j.integration_id == integration_id)
            .max_by_key(|j| j.id)
            .cloned())
    }

    async fn list_sync_jobs_by_grade(&self, grade_id: i64) -> Result<Vec<SyncJob>> {
        let inner = self.inner.lock().unwrap();
        let mut items: Vec<SyncJob> = inner
            .sync_jobs
            .values()
            .filter(|j| j.grade_id == grade_id)
            .cloned()
            .collect();
        items.sort_by_key(|j| j.id);
        Ok(items)
    }

    async fn mark_sync_attempt(&self, id: i64) -> Result<Option<SyncJob>> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.sync_jobs.get_mut(&id).map(|j| {
            j.attempt_count += 1;
            let now = chrono::Utc::now();
            j.last_attempted_at = Some(now);
            j.updated_at = now;
            j.clone()
        }))
    }

    async fn set_sync_job_status(
        &self,
        id: i64,
        status: SyncJobStatus,
        last_error: Option<String>,
    ) -> Result<Option<SyncJob>> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.sync_jobs.get_mut(&id).map(|j| {
            j.status = status;
            j.last_error = last_error;
            j.updated_at = chrono::Utc::now();
            j.clone()
        }))
    }
}

/// 按脚本回放结果的 OCR 桩
pub struct StubOcr {
    replies: Mutex<VecDeque<std::result::Result<String, OcrError>>>,
}

impl StubOcr {
    pub fn new(replies: Vec<std::result::Result<String, OcrError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }
}

#[async_trait::async_trait]
impl OcrEngine for StubOcr {
    async fn recognize(&self, _image_bytes: &[u8]) -> std::result::Result<String, OcrError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OcrError::EngineUnavailable("脚本已耗尽".to_string())))
    }
}

/// 按脚本回放原始输出的评估模型桩，同时记录收到的提示词
pub struct StubModel {
    replies: Mutex<VecDeque<std::result::Result<String, ModelTransportError>>>,
    prompts: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn new(replies: Vec<std::result::Result<String, ModelTransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EvaluationModel for StubModel {
    async fn evaluate(&self, prompt: &str) -> std::result::Result<String, ModelTransportError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelTransportError("脚本已耗尽".to_string())))
    }

    fn model_version(&self) -> &str {
        "stub-model"
    }
}

/// 先失败 N 次再成功的 LMS 连接器桩，记录每次成功的投递
pub struct StubConnector {
    remaining_failures: Mutex<u32>,
    pushes: Mutex<Vec<GradeDelivery>>,
}

impl StubConnector {
    pub fn new(fail_times: u32) -> Self {
        Self {
            remaining_failures: Mutex::new(fail_times),
            pushes: Mutex::new(Vec::new()),
        }
    }

    pub fn pushes(&self) -> Vec<GradeDelivery> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LmsConnector for StubConnector {
    fn lms_type(&self) -> LmsType {
        LmsType::Canvas
    }

    async fn push_grade(&self, delivery: &GradeDelivery) -> Result<()> {
        {
            let mut remaining = self.remaining_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Err(LearnboardError::lms_connector("桩投递失败".to_string()));
            }
        }
        self.pushes.lock().unwrap().push(delivery.clone());
        Ok(())
    }
}

/// 始终返回同一个连接器的工厂桩
pub struct StubConnectorFactory {
    connector: Arc<StubConnector>,
}

impl StubConnectorFactory {
    pub fn new(connector: Arc<StubConnector>) -> Self {
        Self { connector }
    }
}

impl ConnectorFactory for StubConnectorFactory {
    fn connector_for(&self, _integration: &LmsIntegration) -> Arc<dyn LmsConnector> {
        Arc::clone(&self.connector) as Arc<dyn LmsConnector>
    }
}
