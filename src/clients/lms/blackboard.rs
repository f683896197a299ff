//! Blackboard 连接器

use serde_json::json;

use super::{GradeDelivery, LmsConnector};
use crate::errors::{LearnboardError, Result};
use crate::models::integrations::entities::LmsType;

pub struct BlackboardConnector {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl BlackboardConnector {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl LmsConnector for BlackboardConnector {
    fn lms_type(&self) -> LmsType {
        LmsType::Blackboard
    }

    async fn push_grade(&self, delivery: &GradeDelivery) -> Result<()> {
        // Blackboard Learn REST API: gradebook column per assignment
        let url = format!(
            "{}/learn/api/public/v1/courses/{}/gradebook/columns/{}/users/{}",
            self.api_url.trim_end_matches('/'),
            delivery.external_course_id,
            delivery.external_assignment_id,
            delivery.external_student_id
        );
        let body = json!({ "score": delivery.score });

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LearnboardError::lms_connector(format!("Blackboard 请求失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LearnboardError::lms_connector(format!(
                "Blackboard API error: {status} - {text}"
            )));
        }
        Ok(())
    }
}
