pub mod detail;
pub mod manual;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::grades::requests::ManualGradeRequest;
use crate::pipeline::PipelineRunner;
use crate::storage::Storage;

pub struct GradeService {
    storage: Option<Arc<dyn Storage>>,
}

impl GradeService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            super::storage_from_request(request)
        }
    }

    pub(crate) fn get_runner(&self, request: &HttpRequest) -> Arc<PipelineRunner> {
        super::runner_from_request(request)
    }

    pub async fn get_grade(
        &self,
        request: &HttpRequest,
        submission_id: i64,
    ) -> ActixResult<HttpResponse> {
        detail::get_grade(self, request, submission_id).await
    }

    pub async fn override_grade(
        &self,
        request: &HttpRequest,
        submission_id: i64,
        req: ManualGradeRequest,
    ) -> ActixResult<HttpResponse> {
        manual::override_grade(self, request, submission_id, req).await
    }
}
