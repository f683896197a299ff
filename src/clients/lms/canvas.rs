//! Canvas 连接器

use serde_json::json;

use super::{GradeDelivery, LmsConnector};
use crate::errors::{LearnboardError, Result};
use crate::models::integrations::entities::LmsType;

pub struct CanvasConnector {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl CanvasConnector {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl LmsConnector for CanvasConnector {
    fn lms_type(&self) -> LmsType {
        LmsType::Canvas
    }

    async fn push_grade(&self, delivery: &GradeDelivery) -> Result<()> {
        // Canvas API: PUT /api/v1/courses/:course_id/assignments/:assignment_id/submissions/:user_id
        let url = format!(
            "{}/api/v1/courses/{}/assignments/{}/submissions/{}",
            self.api_url.trim_end_matches('/'),
            delivery.external_course_id,
            delivery.external_assignment_id,
            delivery.external_student_id
        );
        let body = json!({
            "submission": { "posted_grade": delivery.score }
        });

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LearnboardError::lms_connector(format!("Canvas 请求失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LearnboardError::lms_connector(format!(
                "Canvas API error: {status} - {text}"
            )));
        }
        Ok(())
    }
}
