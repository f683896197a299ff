pub mod grades;
pub mod integrations;
pub mod submissions;
pub mod sync;

pub use grades::GradeService;
pub use integrations::IntegrationService;
pub use submissions::SubmissionService;
pub use sync::SyncService;

use actix_web::HttpRequest;
use std::sync::Arc;

use crate::pipeline::PipelineRunner;
use crate::storage::Storage;

/// 从请求的 app_data 取出存储实例
pub(crate) fn storage_from_request(request: &HttpRequest) -> Arc<dyn Storage> {
    request
        .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
        .expect("Storage not found in app data")
        .get_ref()
        .clone()
}

/// 从请求的 app_data 取出流水线执行器
pub(crate) fn runner_from_request(request: &HttpRequest) -> Arc<PipelineRunner> {
    request
        .app_data::<actix_web::web::Data<Arc<PipelineRunner>>>()
        .expect("Pipeline runner not found in app data")
        .get_ref()
        .clone()
}
