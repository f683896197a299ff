//! LMS 连接器
//!
//! 每种 LMS 一个实现，按集成配置的类型标签选择；
//! 调度器只依赖 `LmsConnector` 接口。

mod blackboard;
mod canvas;
mod moodle;

pub use blackboard::BlackboardConnector;
pub use canvas::CanvasConnector;
pub use moodle::MoodleConnector;

use std::sync::Arc;
use std::time::Duration;

use crate::errors::Result;
use crate::models::integrations::entities::{LmsIntegration, LmsType};

// 每次成绩推送的请求超时
pub const PUSH_TIMEOUT_SECS: u64 = 10;

/// 一次成绩投递的全部参数
#[derive(Debug, Clone)]
pub struct GradeDelivery {
    pub external_course_id: String,
    pub external_student_id: String,
    pub external_assignment_id: String,
    pub score: f64,
}

#[async_trait::async_trait]
pub trait LmsConnector: Send + Sync {
    fn lms_type(&self) -> LmsType;

    /// 推送一条成绩；错误统一归为同步失败，由调度器重试
    async fn push_grade(&self, delivery: &GradeDelivery) -> Result<()>;
}

/// 连接器工厂，调度器通过它换取具体实现（测试时可替换）
pub trait ConnectorFactory: Send + Sync {
    fn connector_for(&self, integration: &LmsIntegration) -> Arc<dyn LmsConnector>;
}

/// 按集成配置的类型标签构造 HTTP 连接器
pub struct HttpConnectorFactory {
    client: reqwest::Client,
}

impl HttpConnectorFactory {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PUSH_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpConnectorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorFactory for HttpConnectorFactory {
    fn connector_for(&self, integration: &LmsIntegration) -> Arc<dyn LmsConnector> {
        match integration.lms_type {
            LmsType::Canvas => Arc::new(CanvasConnector::new(
                self.client.clone(),
                integration.api_url.clone(),
                integration.api_key.clone(),
            )),
            LmsType::Moodle => Arc::new(MoodleConnector::new(
                self.client.clone(),
                integration.api_url.clone(),
                integration.api_key.clone(),
            )),
            LmsType::Blackboard => Arc::new(BlackboardConnector::new(
                self.client.clone(),
                integration.api_url.clone(),
                integration.api_key.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integration(lms_type: LmsType) -> LmsIntegration {
        LmsIntegration {
            id: 1,
            course_id: 1,
            lms_type,
            api_url: "https://lms.example.edu".to_string(),
            api_key: "token".to_string(),
            external_course_id: "C-100".to_string(),
            is_active: true,
            sync_enabled: true,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_factory_selects_by_type_tag() {
        let factory = HttpConnectorFactory::new();
        for t in [LmsType::Canvas, LmsType::Moodle, LmsType::Blackboard] {
            assert_eq!(factory.connector_for(&integration(t)).lms_type(), t);
        }
    }
}
