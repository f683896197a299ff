use serde::Deserialize;

/// 注册 LMS 集成请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIntegrationRequest {
    pub course_id: i64,
    pub lms_type: String,
    pub api_url: String,
    pub api_key: String,
    pub external_course_id: String,
}
