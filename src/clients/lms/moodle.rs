//! Moodle 连接器

use serde_json::Value;

use super::{GradeDelivery, LmsConnector};
use crate::errors::{LearnboardError, Result};
use crate::models::integrations::entities::LmsType;

pub struct MoodleConnector {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl MoodleConnector {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl LmsConnector for MoodleConnector {
    fn lms_type(&self) -> LmsType {
        LmsType::Moodle
    }

    async fn push_grade(&self, delivery: &GradeDelivery) -> Result<()> {
        // Moodle Web Services: core_grades_update_grades
        let url = format!(
            "{}/webservice/rest/server.php",
            self.api_url.trim_end_matches('/')
        );
        let score = delivery.score.to_string();
        let params = [
            ("wstoken", self.api_key.as_str()),
            ("wsfunction", "core_grades_update_grades"),
            ("moodlewsrestformat", "json"),
            ("source", "external"),
            ("courseid", delivery.external_course_id.as_str()),
            ("component", "mod_assign"),
            ("activityid", delivery.external_assignment_id.as_str()),
            ("itemnumber", "0"),
            ("grades[0][studentid]", delivery.external_student_id.as_str()),
            ("grades[0][grade]", score.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| LearnboardError::lms_connector(format!("Moodle 请求失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LearnboardError::lms_connector(format!(
                "Moodle API error: {status}"
            )));
        }

        // Moodle 对业务错误返回 200 + warnings
        let body: Value = response
            .json()
            .await
            .map_err(|e| LearnboardError::lms_connector(format!("Moodle 响应解析失败: {e}")))?;
        if let Some(warnings) = body.get("warnings")
            && warnings.as_array().is_some_and(|w| !w.is_empty())
        {
            return Err(LearnboardError::lms_connector(format!(
                "Moodle API warning: {warnings}"
            )));
        }
        Ok(())
    }
}
