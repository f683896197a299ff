//! OCR 引擎客户端

use serde::Deserialize;
use std::time::Duration;

use crate::config::OcrConfig;

/// OCR 调用失败分类
///
/// 引擎不可用可重试；输入损坏不可重试。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrError {
    EngineUnavailable(String),
    BadInput(String),
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::EngineUnavailable(msg) => write!(f, "OCR engine unavailable: {msg}"),
            OcrError::BadInput(msg) => write!(f, "OCR bad input: {msg}"),
        }
    }
}

#[async_trait::async_trait]
pub trait OcrEngine: Send + Sync {
    /// 识别图片中的文字
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    text: String,
}

/// HTTP OCR 引擎客户端
pub struct HttpOcrEngine {
    client: reqwest::Client,
    api_url: String,
}

impl HttpOcrEngine {
    pub fn new(config: &OcrConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url: config.api_url.clone(),
        }
    }
}

#[async_trait::async_trait]
impl OcrEngine for HttpOcrEngine {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        let url = format!("{}/recognize", self.api_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .body(image_bytes.to_vec())
            .send()
            .await
            .map_err(|e| OcrError::EngineUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            // 4xx 表示引擎认为图片本身不可处理
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::BadInput(format!("{status}: {body}")));
        }
        if !status.is_success() {
            return Err(OcrError::EngineUnavailable(format!("HTTP {status}")));
        }

        let parsed: OcrResponse = response
            .json()
            .await
            .map_err(|e| OcrError::EngineUnavailable(format!("响应解析失败: {e}")))?;
        Ok(parsed.text)
    }
}
