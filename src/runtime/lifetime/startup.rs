use std::sync::Arc;

use tracing::warn;

use crate::clients::lms::HttpConnectorFactory;
use crate::clients::model::{EvaluationModel, HttpEvaluationModel};
use crate::clients::ocr::{HttpOcrEngine, OcrEngine};
use crate::config::AppConfig;
use crate::pipeline::PipelineRunner;
use crate::storage::Storage;

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub runner: Arc<PipelineRunner>,
}

/// 确保图片上传目录存在
async fn ensure_upload_dir(dir: &str) {
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        warn!("Failed to create upload directory {}: {}", dir, e);
    }
}

/// 准备服务器启动的上下文
/// 包括存储、外部客户端和流水线执行器
pub async fn prepare_server_startup() -> StartupContext {
    let config = AppConfig::get();

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    ensure_upload_dir(&config.upload.dir).await;

    let ocr: Arc<dyn OcrEngine> = Arc::new(HttpOcrEngine::new(&config.ocr));
    let model: Arc<dyn EvaluationModel> = Arc::new(HttpEvaluationModel::new(&config.ai));
    let factory = Arc::new(HttpConnectorFactory::new());

    let runner = PipelineRunner::new(
        storage.clone(),
        ocr,
        model,
        factory,
        config.upload.dir.clone(),
        &config.grading,
        &config.ai,
    );
    warn!("Grading pipeline initialized (model: {})", config.ai.model);

    // 重启恢复：把中断的提交重新送入流水线
    match runner.resume_unfinished().await {
        Ok(0) => {}
        Ok(count) => warn!("Resumed {} unfinished submission(s)", count),
        Err(e) => warn!("Failed to resume unfinished submissions: {}", e),
    }

    StartupContext { storage, runner }
}
