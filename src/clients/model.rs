//! AI 评估模型客户端
//!
//! 请求携带提交文本和固定评分标准，响应按防御式解析：
//! 任何形状不符的输出都归为 Malformed，不会让流水线崩溃。

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::AiConfig;
use crate::models::evaluations::entities::FeedbackItem;

/// 模型调用的传输层失败（网络/超时/限流），可重试
#[derive(Debug, Clone)]
pub struct ModelTransportError(pub String);

impl std::fmt::Display for ModelTransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "model transport error: {}", self.0)
    }
}

#[async_trait::async_trait]
pub trait EvaluationModel: Send + Sync {
    /// 发送提示词，返回模型的原始文本输出
    async fn evaluate(&self, prompt: &str) -> Result<String, ModelTransportError>;

    /// 模型标识（记录在每条评估结果上）
    fn model_version(&self) -> &str;
}

/// 防御式解析后的模型输出
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Scored {
        score: f64,
        clamped: bool,
        feedback: Vec<FeedbackItem>,
    },
    Malformed {
        detail: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawReply {
    score: f64,
    #[serde(default)]
    feedback: Vec<FeedbackItem>,
}

/// 构造评估提示词；strict 模式用于 rejected 后的唯一一次重试
pub fn build_prompt(text: &str, strict: bool) -> String {
    let strict_note = if strict {
        "\nIMPORTANT: Your previous reply could not be parsed. Reply with ONLY the raw JSON object, no prose, no markdown."
    } else {
        ""
    };
    format!(
        r#"You are an experienced teacher. Analyze the following student submission:

"{text}"

Provide the output strictly in valid JSON format with the following keys:
- score: a number between 0 and 100 representing the quality.
- feedback: a list of objects, each with "category" (grammar, vocabulary or general) and "comment" (a specific observation).

Do not use markdown formatting (like ```json). Just return the raw JSON object.{strict_note}"#
    )
}

/// 将模型原始输出解析为类型化结果
///
/// 越界分数收敛到 [0, max_score] 并打标记，而不是原样信任。
pub fn parse_model_reply(raw: &str, max_score: f64) -> ModelReply {
    // 容忍模型仍然包了 markdown 代码块
    let cleaned = raw.trim().replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let parsed: RawReply = match serde_json::from_str(cleaned) {
        Ok(r) => r,
        Err(e) => {
            return ModelReply::Malformed {
                detail: format!("JSON 解析失败: {e}"),
            };
        }
    };

    if !parsed.score.is_finite() {
        return ModelReply::Malformed {
            detail: "score 不是有限数值".to_string(),
        };
    }

    let clamped = parsed.score < 0.0 || parsed.score > max_score;
    let score = parsed.score.clamp(0.0, max_score);

    ModelReply::Scored {
        score,
        clamped,
        feedback: parsed.feedback,
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

/// generateContent 风格的 HTTP 模型客户端
pub struct HttpEvaluationModel {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpEvaluationModel {
    pub fn new(config: &AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait::async_trait]
impl EvaluationModel for HttpEvaluationModel {
    async fn evaluate(&self, prompt: &str) -> Result<String, ModelTransportError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.api_url.trim_end_matches('/'),
            self.model,
            self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelTransportError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // 限流和服务端错误都按瞬时失败处理，由重试策略决定去留
            return Err(ModelTransportError(format!("HTTP {status}")));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelTransportError(format!("响应解析失败: {e}")))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();
        Ok(text)
    }

    fn model_version(&self) -> &str {
        &self.model
    }
}
