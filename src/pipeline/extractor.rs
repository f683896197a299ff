//! 内容提取器
//!
//! 把文本或图片提交统一变成规范化的纯文本。
//! 文本提交只做规范化；图片提交读文件后交给 OCR 引擎。

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::clients::ocr::{OcrEngine, OcrError};
use crate::models::submissions::entities::{FailureReason, Submission, SubmissionInputKind};

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// 提取失败分类，决定重试去留
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    // 规范化后内容过短，无法辨认
    Illegible,
    // OCR 引擎不可用，可重试
    EngineUnavailable(String),
    // 图片缺失或损坏，不可重试
    BadInput(String),
}

impl ExtractionFailure {
    pub fn reason(&self) -> FailureReason {
        match self {
            ExtractionFailure::Illegible => FailureReason::Illegible,
            ExtractionFailure::EngineUnavailable(_) => FailureReason::EngineUnavailable,
            ExtractionFailure::BadInput(_) => FailureReason::BadInput,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractionFailure::EngineUnavailable(_))
    }
}

impl std::fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionFailure::Illegible => write!(f, "内容无法辨认"),
            ExtractionFailure::EngineUnavailable(msg) => write!(f, "OCR 引擎不可用: {msg}"),
            ExtractionFailure::BadInput(msg) => write!(f, "图片输入无效: {msg}"),
        }
    }
}

/// 把原始文本收敛成流水线内部的规范形式：
/// 去控制字符、压缩空白、去首尾空白。
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    WHITESPACE_RE.replace_all(&cleaned, " ").trim().to_string()
}

pub struct ContentExtractor {
    ocr: Arc<dyn OcrEngine>,
    upload_dir: String,
    min_chars: usize,
}

impl ContentExtractor {
    pub fn new(ocr: Arc<dyn OcrEngine>, upload_dir: String, min_chars: usize) -> Self {
        Self {
            ocr,
            upload_dir,
            min_chars,
        }
    }

    /// 提取一个提交的文本内容
    pub async fn extract(&self, submission: &Submission) -> Result<String, ExtractionFailure> {
        let raw = match submission.input_type {
            SubmissionInputKind::Text => submission.text_content.clone().ok_or_else(|| {
                ExtractionFailure::BadInput("文本提交缺少 text_content".to_string())
            })?,
            SubmissionInputKind::Image => {
                let image_ref = submission.image_ref.as_deref().ok_or_else(|| {
                    ExtractionFailure::BadInput("图片提交缺少 image_ref".to_string())
                })?;
                self.recognize_image(image_ref).await?
            }
        };

        let text = normalize(&raw);
        if text.chars().count() < self.min_chars {
            return Err(ExtractionFailure::Illegible);
        }
        Ok(text)
    }

    async fn recognize_image(&self, image_ref: &str) -> Result<String, ExtractionFailure> {
        // image_ref 只允许指向上传目录内的文件
        let ref_path = Path::new(image_ref);
        if ref_path.is_absolute()
            || ref_path
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(ExtractionFailure::BadInput(format!(
                "非法的图片引用: {image_ref}"
            )));
        }

        let full_path = Path::new(&self.upload_dir).join(ref_path);
        let bytes = tokio::fs::read(&full_path)
            .await
            .map_err(|e| ExtractionFailure::BadInput(format!("读取图片失败: {e}")))?;

        self.ocr.recognize(&bytes).await.map_err(|e| match e {
            OcrError::EngineUnavailable(msg) => ExtractionFailure::EngineUnavailable(msg),
            OcrError::BadInput(msg) => ExtractionFailure::BadInput(msg),
        })
    }
}
