//! 提交评分流水线
//!
//! 状态机：new → extracting → extracted → evaluating → evaluated → graded
//! → synced，失败分支 extraction_failed / evaluation_failed，取消分支
//! cancelled。每个提交同一时刻只有一个写者（DashMap 里的异步互斥锁），
//! 长耗时的外部调用都在不持锁的情况下进行，锁只保护状态迁移本身，
//! 因此取消和人工评分不会被慢请求卡住。

pub mod dispatcher;
pub mod evaluator;
pub mod extractor;
pub mod reconciler;
pub mod retry;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::clients::lms::ConnectorFactory;
use crate::clients::model::EvaluationModel;
use crate::clients::ocr::OcrEngine;
use crate::config::{AiConfig, GradingConfig};
use crate::errors::{LearnboardError, Result};
use crate::models::evaluations::entities::EvaluationOutcome;
use crate::models::grades::{entities::Grade, requests::ManualGradeRequest};
use crate::models::submissions::entities::{FailureReason, Submission, SubmissionStatus};
use crate::models::sync::entities::SyncJob;
use crate::storage::Storage;

use dispatcher::SyncDispatcher;
use evaluator::EvaluationClient;
use extractor::ContentExtractor;
use reconciler::GradeReconciler;
use retry::RetryPolicy;

pub struct PipelineRunner {
    storage: Arc<dyn Storage>,
    extractor: ContentExtractor,
    evaluator: EvaluationClient,
    reconciler: GradeReconciler,
    dispatcher: SyncDispatcher,
    extraction_policy: RetryPolicy,
    evaluation_policy: RetryPolicy,
    max_score: f64,
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl PipelineRunner {
    pub fn new(
        storage: Arc<dyn Storage>,
        ocr: Arc<dyn OcrEngine>,
        model: Arc<dyn EvaluationModel>,
        factory: Arc<dyn ConnectorFactory>,
        upload_dir: String,
        grading: &GradingConfig,
        ai: &AiConfig,
    ) -> Arc<Self> {
        let extractor = ContentExtractor::new(ocr, upload_dir, grading.min_extracted_chars);
        let evaluator = EvaluationClient::new(model, Arc::clone(&storage), ai);
        let reconciler = GradeReconciler::new(Arc::clone(&storage));
        let dispatcher = SyncDispatcher::new(
            Arc::clone(&storage),
            factory,
            RetryPolicy::new(
                grading.max_sync_retries,
                grading.backoff_base_ms,
                grading.backoff_cap_ms,
            ),
        );

        Arc::new(Self {
            extractor,
            evaluator,
            reconciler,
            dispatcher,
            extraction_policy: RetryPolicy::new(
                grading.max_extraction_retries,
                grading.backoff_base_ms,
                grading.backoff_cap_ms,
            ),
            evaluation_policy: RetryPolicy::new(
                grading.max_evaluation_retries,
                grading.backoff_base_ms,
                grading.backoff_cap_ms,
            ),
            max_score: ai.max_score,
            storage,
            locks: DashMap::new(),
        })
    }

    /// 异步驱动一个提交走完流水线
    pub fn spawn(self: &Arc<Self>, submission_id: i64) {
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = runner.run(submission_id).await {
                tracing::error!(submission_id, error = %e, "流水线执行出错");
            }
        });
    }

    /// 从提交的当前状态继续推进，直到终止状态或被取消
    pub async fn run(&self, submission_id: i64) -> Result<()> {
        let Some(submission) = self.storage.get_submission_by_id(submission_id).await? else {
            return Ok(());
        };
        match submission.status {
            SubmissionStatus::New | SubmissionStatus::Extracting => {
                self.run_extraction(submission).await
            }
            SubmissionStatus::Extracted | SubmissionStatus::Evaluating => {
                self.run_evaluation(submission).await
            }
            SubmissionStatus::Evaluated => self.run_reconcile(submission).await,
            SubmissionStatus::Graded => self.run_dispatch(submission).await,
            _ => Ok(()),
        }
    }

    /// 重启后恢复所有未完成的提交
    pub async fn resume_unfinished(self: &Arc<Self>) -> Result<usize> {
        let pending = self.storage.list_unfinished_submissions().await?;
        let count = pending.len();
        for submission in &pending {
            self.spawn(submission.id);
        }
        if count > 0 {
            tracing::info!(count, "恢复未完成的提交");
        }
        Ok(count)
    }

    /// 教师人工评分/覆盖
    ///
    /// 只写 Grade，不改提交生命周期状态。提交之前同步过的，
    /// 重新分发同步任务让外部 LMS 拿到新分数。
    pub async fn apply_manual_override(
        &self,
        submission_id: i64,
        req: &ManualGradeRequest,
    ) -> Result<Grade> {
        req.validate(self.max_score)?;

        let lock = self.lock_for(submission_id);
        let guard = lock.lock().await;

        let submission = self
            .storage
            .get_submission_by_id(submission_id)
            .await?
            .ok_or_else(|| LearnboardError::not_found(format!("提交 {submission_id} 不存在")))?;

        if !submission.status.allows_manual_override() {
            return Err(LearnboardError::invalid_transition(format!(
                "状态 {} 不允许人工评分",
                submission.status.as_str()
            )));
        }

        let grade = self.reconciler.reconcile_manual(submission_id, req).await?;
        drop(guard);

        if submission.status == SubmissionStatus::Synced {
            self.dispatcher
                .redispatch_after_regrade(&submission, &grade)
                .await?;
        }
        Ok(grade)
    }

    /// 取消一个尚未评分的提交
    pub async fn cancel(&self, submission_id: i64) -> Result<Submission> {
        let lock = self.lock_for(submission_id);
        let _guard = lock.lock().await;

        let submission = self
            .storage
            .get_submission_by_id(submission_id)
            .await?
            .ok_or_else(|| LearnboardError::not_found(format!("提交 {submission_id} 不存在")))?;

        if !submission.status.is_cancellable() {
            return Err(LearnboardError::invalid_transition(format!(
                "状态 {} 不允许取消",
                submission.status.as_str()
            )));
        }

        self.storage
            .update_submission_status(submission_id, SubmissionStatus::Cancelled, None)
            .await?
            .ok_or_else(|| LearnboardError::not_found(format!("提交 {submission_id} 不存在")))
    }

    /// 把终止失败的提交重置回对应阶段的入口；调用方负责重新 spawn
    pub async fn retry_failed(&self, submission_id: i64) -> Result<Submission> {
        let lock = self.lock_for(submission_id);
        let _guard = lock.lock().await;

        let submission = self
            .storage
            .get_submission_by_id(submission_id)
            .await?
            .ok_or_else(|| LearnboardError::not_found(format!("提交 {submission_id} 不存在")))?;

        let updated = match submission.status {
            SubmissionStatus::ExtractionFailed => {
                self.storage.reset_extraction_attempts(submission_id).await?;
                self.storage
                    .update_submission_status(submission_id, SubmissionStatus::New, None)
                    .await?
            }
            SubmissionStatus::EvaluationFailed => {
                self.storage
                    .update_submission_status(submission_id, SubmissionStatus::Extracted, None)
                    .await?
            }
            other => {
                return Err(LearnboardError::invalid_transition(format!(
                    "状态 {} 不允许重试",
                    other.as_str()
                )));
            }
        };

        updated.ok_or_else(|| LearnboardError::not_found(format!("提交 {submission_id} 不存在")))
    }

    /// 手动重试一条 failed 的同步任务
    pub async fn retry_sync_job(&self, job_id: i64) -> Result<SyncJob> {
        let job = self
            .storage
            .get_sync_job_by_id(job_id)
            .await?
            .ok_or_else(|| LearnboardError::not_found(format!("同步任务 {job_id} 不存在")))?;
        self.dispatcher.retry_job(&job).await
    }

    // ---- 各阶段 ----

    async fn run_extraction(&self, submission: Submission) -> Result<()> {
        let id = submission.id;
        let Some(submission) = self
            .transition_if(
                id,
                &[SubmissionStatus::New, SubmissionStatus::Extracting],
                SubmissionStatus::Extracting,
            )
            .await?
        else {
            return Ok(());
        };

        loop {
            let attempts = self.storage.increment_extraction_attempts(id).await? as u32;
            match self.extractor.extract(&submission).await {
                Ok(text) => {
                    let lock = self.lock_for(id);
                    let guard = lock.lock().await;
                    let Some(current) = self.storage.get_submission_by_id(id).await? else {
                        return Ok(());
                    };
                    if current.status != SubmissionStatus::Extracting {
                        return Ok(());
                    }
                    let Some(updated) = self.storage.set_extracted_text(id, &text).await? else {
                        return Ok(());
                    };
                    drop(guard);
                    return self.run_evaluation(updated).await;
                }
                Err(failure)
                    if failure.is_retryable() && !self.extraction_policy.exhausted(attempts) =>
                {
                    tracing::warn!(submission_id = id, attempts, error = %failure, "提取失败，退避后重试");
                    tokio::time::sleep(self.extraction_policy.jittered_delay(attempts - 1)).await;
                    if self.is_abandoned(id, SubmissionStatus::Extracting).await? {
                        return Ok(());
                    }
                }
                Err(failure) => {
                    tracing::warn!(submission_id = id, attempts, error = %failure, "提取终止失败");
                    self.fail_if(
                        id,
                        SubmissionStatus::Extracting,
                        SubmissionStatus::ExtractionFailed,
                        failure.reason(),
                    )
                    .await?;
                    return Ok(());
                }
            }
        }
    }

    async fn run_evaluation(&self, submission: Submission) -> Result<()> {
        let id = submission.id;
        let Some(submission) = self
            .transition_if(
                id,
                &[SubmissionStatus::Extracted, SubmissionStatus::Evaluating],
                SubmissionStatus::Evaluating,
            )
            .await?
        else {
            return Ok(());
        };

        let text = submission
            .extracted_text
            .clone()
            .ok_or_else(|| LearnboardError::validation(format!("提交 {id} 缺少提取文本")))?;

        let mut transient: u32 = 0;
        let mut strict = false;
        loop {
            let eval = self.evaluator.evaluate_once(id, &text, strict).await?;
            match eval.outcome {
                EvaluationOutcome::Success => {
                    let Some(updated) = self
                        .transition_if(
                            id,
                            &[SubmissionStatus::Evaluating],
                            SubmissionStatus::Evaluated,
                        )
                        .await?
                    else {
                        return Ok(());
                    };
                    return self.run_reconcile(updated).await;
                }
                EvaluationOutcome::TransientFailure => {
                    transient += 1;
                    if self.evaluation_policy.exhausted(transient) {
                        self.fail_if(
                            id,
                            SubmissionStatus::Evaluating,
                            SubmissionStatus::EvaluationFailed,
                            FailureReason::ModelUnavailable,
                        )
                        .await?;
                        return Ok(());
                    }
                    tokio::time::sleep(self.evaluation_policy.jittered_delay(transient - 1)).await;
                    if self.is_abandoned(id, SubmissionStatus::Evaluating).await? {
                        return Ok(());
                    }
                }
                EvaluationOutcome::Rejected => {
                    // 格式不合规只给一次更严格提示词的机会
                    if strict {
                        self.fail_if(
                            id,
                            SubmissionStatus::Evaluating,
                            SubmissionStatus::EvaluationFailed,
                            FailureReason::ModelRejected,
                        )
                        .await?;
                        return Ok(());
                    }
                    strict = true;
                    if self.is_abandoned(id, SubmissionStatus::Evaluating).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn run_reconcile(&self, submission: Submission) -> Result<()> {
        let id = submission.id;
        let Some(eval) = self.storage.get_active_evaluation(id).await? else {
            return Err(LearnboardError::validation(format!(
                "提交 {id} 缺少成功的评估结果"
            )));
        };
        self.reconciler.reconcile_auto(&eval).await?;

        let Some(submission) = self
            .transition_if(id, &[SubmissionStatus::Evaluated], SubmissionStatus::Graded)
            .await?
        else {
            return Ok(());
        };
        self.run_dispatch(submission).await
    }

    async fn run_dispatch(&self, submission: Submission) -> Result<()> {
        let id = submission.id;
        let Some(grade) = self.storage.get_grade_by_submission_id(id).await? else {
            return Ok(());
        };

        let jobs = self.dispatcher.dispatch(&submission, &grade).await?;
        if jobs.is_empty() {
            // 课程没有配置集成，graded 即终点
            return Ok(());
        }

        self.transition_if(id, &[SubmissionStatus::Graded], SubmissionStatus::Synced)
            .await?;
        Ok(())
    }

    // ---- 状态迁移 ----

    fn lock_for(&self, submission_id: i64) -> Arc<Mutex<()>> {
        self.locks.entry(submission_id).or_default().clone()
    }

    /// 持锁迁移；当前状态不在 from 中时放弃并返回 None
    async fn transition_if(
        &self,
        id: i64,
        from: &[SubmissionStatus],
        to: SubmissionStatus,
    ) -> Result<Option<Submission>> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;
        let Some(current) = self.storage.get_submission_by_id(id).await? else {
            return Ok(None);
        };
        if !from.contains(&current.status) {
            return Ok(None);
        }
        self.storage.update_submission_status(id, to, None).await
    }

    /// 持锁写入终止失败状态与原因
    async fn fail_if(
        &self,
        id: i64,
        expected: SubmissionStatus,
        to: SubmissionStatus,
        reason: FailureReason,
    ) -> Result<()> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;
        let Some(current) = self.storage.get_submission_by_id(id).await? else {
            return Ok(());
        };
        if current.status != expected {
            return Ok(());
        }
        self.storage
            .update_submission_status(id, to, Some(reason))
            .await?;
        Ok(())
    }

    /// 退避等待后检查提交是否已被取消或被别的写者改走
    async fn is_abandoned(&self, id: i64, expected: SubmissionStatus) -> Result<bool> {
        Ok(match self.storage.get_submission_by_id(id).await? {
            Some(current) => current.status != expected,
            None => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{
        MemoryStorage, StubConnector, StubConnectorFactory, StubModel, StubOcr,
    };
    use super::*;
    use crate::clients::model::ModelTransportError;
    use crate::clients::ocr::OcrError;
    use crate::models::grades::entities::GradeSource;
    use crate::models::integrations::requests::CreateIntegrationRequest;
    use crate::models::submissions::requests::CreateSubmissionRequest;
    use crate::models::sync::entities::SyncJobStatus;

    fn grading(max_ext: u32, max_eval: u32, max_sync: u32) -> GradingConfig {
        GradingConfig {
            max_extraction_retries: max_ext,
            max_evaluation_retries: max_eval,
            max_sync_retries: max_sync,
            backoff_base_ms: 1,
            backoff_cap_ms: 2,
            min_extracted_chars: 5,
        }
    }

    fn ai_config() -> AiConfig {
        AiConfig {
            api_key: String::new(),
            api_url: String::new(),
            model: "stub-model".to_string(),
            timeout: 5,
            max_score: 100.0,
        }
    }

    fn make_runner(
        storage: &Arc<dyn Storage>,
        ocr: Arc<dyn OcrEngine>,
        model: Arc<dyn EvaluationModel>,
        factory: Arc<dyn ConnectorFactory>,
        grading: &GradingConfig,
    ) -> Arc<PipelineRunner> {
        PipelineRunner::new(
            Arc::clone(storage),
            ocr,
            model,
            factory,
            std::env::temp_dir().to_string_lossy().to_string(),
            grading,
            &ai_config(),
        )
    }

    fn text_request(text: &str) -> CreateSubmissionRequest {
        CreateSubmissionRequest {
            student_id: 1,
            assignment_id: 2,
            course_id: 3,
            text_content: Some(text.to_string()),
            image_ref: None,
        }
    }

    fn canvas_integration() -> CreateIntegrationRequest {
        CreateIntegrationRequest {
            course_id: 3,
            lms_type: "canvas".to_string(),
            api_url: "https://lms.example.edu".to_string(),
            api_key: "token".to_string(),
            external_course_id: "C-100".to_string(),
        }
    }

    fn scored_reply(score: f64) -> String {
        format!(r#"{{"score": {score}, "feedback": [{{"category": "general", "comment": "ok"}}]}}"#)
    }

    #[tokio::test]
    async fn test_text_submission_reaches_graded_without_integrations() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let model = Arc::new(StubModel::new(vec![Ok(scored_reply(72.0))]));
        let connector = Arc::new(StubConnector::new(0));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            model,
            Arc::new(StubConnectorFactory::new(Arc::clone(&connector))),
            &grading(1, 1, 1),
        );

        let submission = storage
            .create_submission(text_request("The cat   sat on\nthe mat."))
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::Graded);
        assert_eq!(
            current.extracted_text.as_deref(),
            Some("The cat sat on the mat.")
        );

        let grade = storage
            .get_grade_by_submission_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grade.score, 72.0);
        assert_eq!(grade.source, GradeSource::Ai);
        assert!(storage
            .list_sync_jobs_by_grade(grade.id)
            .await
            .unwrap()
            .is_empty());
        assert!(connector.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_illegible_text_fails_and_accepts_manual_grade() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            Arc::new(StubModel::new(vec![])),
            Arc::new(StubConnectorFactory::new(Arc::new(StubConnector::new(0)))),
            &grading(1, 1, 1),
        );

        let submission = storage.create_submission(text_request("hi")).await.unwrap();
        runner.run(submission.id).await.unwrap();

        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::ExtractionFailed);
        assert_eq!(current.failure_reason, Some(FailureReason::Illegible));

        let grade = runner
            .apply_manual_override(
                submission.id,
                &ManualGradeRequest {
                    grader_id: 9,
                    score: 60.0,
                    feedback: Some("Graded from the paper copy.".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(grade.score, 60.0);
        assert_eq!(grade.source, GradeSource::Manual);

        // 人工评分不改提交状态
        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::ExtractionFailed);
    }

    #[tokio::test]
    async fn test_ocr_transient_failure_retries_then_succeeds() {
        let dir = std::env::temp_dir();
        let file_name = format!("learnboard-test-{}.png", std::process::id());
        tokio::fs::write(dir.join(&file_name), b"fake image bytes")
            .await
            .unwrap();

        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let ocr = Arc::new(StubOcr::new(vec![
            Err(OcrError::EngineUnavailable("503".to_string())),
            Ok("Recognized handwriting text.".to_string()),
        ]));
        let model = Arc::new(StubModel::new(vec![Ok(scored_reply(81.0))]));
        let runner = make_runner(
            &storage,
            ocr,
            model,
            Arc::new(StubConnectorFactory::new(Arc::new(StubConnector::new(0)))),
            &grading(2, 1, 1),
        );

        let submission = storage
            .create_submission(CreateSubmissionRequest {
                student_id: 1,
                assignment_id: 2,
                course_id: 3,
                text_content: None,
                image_ref: Some(file_name),
            })
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::Graded);
        assert_eq!(current.extraction_attempts, 2);
        assert_eq!(
            current.extracted_text.as_deref(),
            Some("Recognized handwriting text.")
        );
    }

    #[tokio::test]
    async fn test_transient_evaluation_failures_exhaust_retries() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let model = Arc::new(StubModel::new(vec![
            Err(ModelTransportError("timeout".to_string())),
            Err(ModelTransportError("timeout".to_string())),
            Err(ModelTransportError("timeout".to_string())),
        ]));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            model,
            Arc::new(StubConnectorFactory::new(Arc::new(StubConnector::new(0)))),
            &grading(1, 2, 1),
        );

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::EvaluationFailed);
        assert_eq!(current.failure_reason, Some(FailureReason::ModelUnavailable));

        // 尝试序号严格递增，失败历史完整保留
        let history = storage
            .list_evaluations_by_submission(submission.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
        for (i, eval) in history.iter().enumerate() {
            assert_eq!(eval.attempt_number, i as i32 + 1);
            assert_eq!(eval.outcome, EvaluationOutcome::TransientFailure);
        }
    }

    #[tokio::test]
    async fn test_rejected_reply_retries_once_with_strict_prompt() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let model = Arc::new(StubModel::new(vec![
            Ok("I would give this a 72.".to_string()),
            Ok(scored_reply(88.0)),
        ]));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            Arc::clone(&model) as Arc<dyn EvaluationModel>,
            Arc::new(StubConnectorFactory::new(Arc::new(StubConnector::new(0)))),
            &grading(1, 1, 1),
        );

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        let grade = storage
            .get_grade_by_submission_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grade.score, 88.0);

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains("IMPORTANT"));
        assert!(prompts[1].contains("IMPORTANT"));
    }

    #[tokio::test]
    async fn test_second_rejection_is_terminal() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let model = Arc::new(StubModel::new(vec![
            Ok("not json".to_string()),
            Ok("still not json".to_string()),
        ]));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            model,
            Arc::new(StubConnectorFactory::new(Arc::new(StubConnector::new(0)))),
            &grading(1, 5, 1),
        );

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::EvaluationFailed);
        assert_eq!(current.failure_reason, Some(FailureReason::ModelRejected));
        assert_eq!(
            storage
                .list_evaluations_by_submission(submission.id)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_submission_syncs_to_configured_integration() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let connector = Arc::new(StubConnector::new(0));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            Arc::new(StubModel::new(vec![Ok(scored_reply(72.0))])),
            Arc::new(StubConnectorFactory::new(Arc::clone(&connector))),
            &grading(1, 1, 1),
        );
        storage.create_integration(canvas_integration()).await.unwrap();

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::Synced);

        let grade = storage
            .get_grade_by_submission_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        let jobs = storage.list_sync_jobs_by_grade(grade.id).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, SyncJobStatus::Sent);
        assert_eq!(jobs[0].attempt_count, 1);

        let pushes = connector.pushes();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].score, 72.0);
        assert_eq!(pushes[0].external_course_id, "C-100");
        assert_eq!(pushes[0].external_student_id, "1");
    }

    #[tokio::test]
    async fn test_sync_failure_isolated_from_submission_and_grade() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let connector = Arc::new(StubConnector::new(u32::MAX));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            Arc::new(StubModel::new(vec![Ok(scored_reply(72.0))])),
            Arc::new(StubConnectorFactory::new(Arc::clone(&connector))),
            &grading(1, 1, 1),
        );
        storage.create_integration(canvas_integration()).await.unwrap();

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        let grade = storage
            .get_grade_by_submission_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grade.score, 72.0);

        let jobs = storage.list_sync_jobs_by_grade(grade.id).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, SyncJobStatus::Failed);
        assert!(jobs[0].last_error.is_some());
        // 初次尝试 + max_sync_retries 次重试
        assert_eq!(jobs[0].attempt_count, 2);

        // 投递失败不回写提交和评分
        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::Synced);
        assert_eq!(current.failure_reason, None);
    }

    #[tokio::test]
    async fn test_failed_sync_job_manual_retry() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let connector = Arc::new(StubConnector::new(2));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            Arc::new(StubModel::new(vec![Ok(scored_reply(72.0))])),
            Arc::new(StubConnectorFactory::new(Arc::clone(&connector))),
            &grading(1, 1, 0),
        );
        storage.create_integration(canvas_integration()).await.unwrap();

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        let grade = storage
            .get_grade_by_submission_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        let jobs = storage.list_sync_jobs_by_grade(grade.id).await.unwrap();
        assert_eq!(jobs[0].status, SyncJobStatus::Failed);

        // 第一次手动重试仍失败，第二次成功
        let job = runner.retry_sync_job(jobs[0].id).await.unwrap();
        assert_eq!(job.status, SyncJobStatus::Failed);
        let job = runner.retry_sync_job(jobs[0].id).await.unwrap();
        assert_eq!(job.status, SyncJobStatus::Sent);
        assert_eq!(connector.pushes().len(), 1);
    }

    #[tokio::test]
    async fn test_manual_override_after_sync_redispatches() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let connector = Arc::new(StubConnector::new(0));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            Arc::new(StubModel::new(vec![Ok(scored_reply(72.0))])),
            Arc::new(StubConnectorFactory::new(Arc::clone(&connector))),
            &grading(1, 1, 1),
        );
        storage.create_integration(canvas_integration()).await.unwrap();

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        let grade = runner
            .apply_manual_override(
                submission.id,
                &ManualGradeRequest {
                    grader_id: 9,
                    score: 90.0,
                    feedback: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(grade.score, 90.0);
        // 存在成功的自动评估，来源记为覆盖
        assert_eq!(grade.source, GradeSource::AiOverridden);

        let pushes = connector.pushes();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[1].score, 90.0);

        let jobs = storage.list_sync_jobs_by_grade(grade.id).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].status, SyncJobStatus::Sent);
        assert_eq!(jobs[0].attempt_count, 2);

        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::Synced);
    }

    #[tokio::test]
    async fn test_manual_grade_not_overwritten_by_later_auto_result() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let model = Arc::new(StubModel::new(vec![Ok(scored_reply(40.0))]));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            model,
            Arc::new(StubConnectorFactory::new(Arc::new(StubConnector::new(0)))),
            &grading(1, 1, 1),
        );

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        // 评估进行中教师先行评分的情形：评分先落库，自动结果后到
        storage
            .update_submission_status(submission.id, SubmissionStatus::EvaluationFailed, None)
            .await
            .unwrap();
        runner
            .apply_manual_override(
                submission.id,
                &ManualGradeRequest {
                    grader_id: 9,
                    score: 95.0,
                    feedback: None,
                },
            )
            .await
            .unwrap();

        storage
            .update_submission_status(submission.id, SubmissionStatus::Extracted, None)
            .await
            .unwrap();
        storage
            .set_extracted_text(submission.id, "The cat sat on the mat.")
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();

        // 自动结果进了评估历史，但 Grade 仍是人工的
        let grade = storage
            .get_grade_by_submission_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grade.score, 95.0);
        assert_eq!(grade.source, GradeSource::Manual);
        assert_eq!(
            storage
                .list_evaluations_by_submission(submission.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_cancellation_rules() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            Arc::new(StubModel::new(vec![Ok(scored_reply(72.0))])),
            Arc::new(StubConnectorFactory::new(Arc::new(StubConnector::new(0)))),
            &grading(1, 1, 1),
        );

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        let cancelled = runner.cancel(submission.id).await.unwrap();
        assert_eq!(cancelled.status, SubmissionStatus::Cancelled);

        // 已取消的不能再取消
        assert!(runner.cancel(submission.id).await.is_err());
        // 取消后流水线不再推进
        runner.run(submission.id).await.unwrap();
        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::Cancelled);

        // 已评分的不能取消
        let graded = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        runner.run(graded.id).await.unwrap();
        assert!(runner.cancel(graded.id).await.is_err());
    }

    #[tokio::test]
    async fn test_manual_override_rejected_mid_pipeline() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            Arc::new(StubModel::new(vec![])),
            Arc::new(StubConnectorFactory::new(Arc::new(StubConnector::new(0)))),
            &grading(1, 1, 1),
        );

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        storage
            .update_submission_status(submission.id, SubmissionStatus::Evaluating, None)
            .await
            .unwrap();

        let result = runner
            .apply_manual_override(
                submission.id,
                &ManualGradeRequest {
                    grader_id: 9,
                    score: 50.0,
                    feedback: None,
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(LearnboardError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_retry_failed_resets_stage_entry() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let model = Arc::new(StubModel::new(vec![
            Err(ModelTransportError("503".to_string())),
            Ok(scored_reply(64.0)),
        ]));
        let runner = make_runner(
            &storage,
            Arc::new(StubOcr::new(vec![])),
            model,
            Arc::new(StubConnectorFactory::new(Arc::new(StubConnector::new(0)))),
            &grading(1, 0, 1),
        );

        let submission = storage
            .create_submission(text_request("The cat sat on the mat."))
            .await
            .unwrap();
        runner.run(submission.id).await.unwrap();
        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::EvaluationFailed);

        let reset = runner.retry_failed(submission.id).await.unwrap();
        assert_eq!(reset.status, SubmissionStatus::Extracted);
        assert_eq!(reset.failure_reason, None);

        runner.run(submission.id).await.unwrap();
        let current = storage
            .get_submission_by_id(submission.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, SubmissionStatus::Graded);
    }
}
