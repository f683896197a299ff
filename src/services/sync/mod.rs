pub mod list;
pub mod retry;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::pipeline::PipelineRunner;
use crate::storage::Storage;

pub struct SyncService {
    storage: Option<Arc<dyn Storage>>,
}

impl SyncService {
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

    pub async fn list_sync_jobs(
        &self,
        request: &HttpRequest,
        grade_id: i64,
    ) -> ActixResult<HttpResponse> {
        list::list_sync_jobs(self, request, grade_id).await
    }

    pub async fn retry_sync_job(
        &self,
        request: &HttpRequest,
        job_id: i64,
    ) -> ActixResult<HttpResponse> {
        retry::retry_sync_job(self, request, job_id).await
    }
}
