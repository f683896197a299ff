use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub upload: UploadConfig,
    pub grading: GradingConfig,
    pub ocr: OcrConfig,
    pub ai: AiConfig,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub unix_socket_path: String,
    pub workers: usize,
    pub max_workers: usize,
    pub timeouts: TimeoutConfig,
    pub limits: LimitConfig,
}

/// 超时配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub client_request: u64,
    pub client_disconnect: u64,
    pub keep_alive: u64,
}

/// 限制配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    pub max_payload_size: usize,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,    // 数据库连接 URL（从 scheme 自动推断类型）
    pub pool_size: u32, // 连接池大小
    pub timeout: u64,   // 连接超时 (秒)
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub max_age: usize,
}

/// 上传配置（图片提交的存放目录）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String, // 图片文件目录，提交中的 image_ref 相对于该目录
}

/// 评分流水线配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    pub max_extraction_retries: u32, // 提取阶段瞬时失败的最大重试次数
    pub max_evaluation_retries: u32, // 评估阶段瞬时失败的最大重试次数
    pub max_sync_retries: u32,       // 每个 SyncJob 的最大重试次数
    pub backoff_base_ms: u64,        // 指数退避基础间隔
    pub backoff_cap_ms: u64,         // 退避间隔上限
    pub min_extracted_chars: usize,  // 低于该字符数的提取结果按无法辨认处理
}

/// OCR 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    pub api_url: String,
    pub timeout: u64, // 单次调用超时 (秒)
}

/// AI 评估模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout: u64, // 单次调用超时 (秒)
    pub max_score: f64,
}
