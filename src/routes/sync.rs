use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::services::SyncService;
use crate::utils::SafeIDI64;

// 懒加载的全局 SyncService 实例
static SYNC_SERVICE: Lazy<SyncService> = Lazy::new(SyncService::new_lazy);

// 列出某评分的同步任务
pub async fn list_sync_jobs(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    SYNC_SERVICE.list_sync_jobs(&req, path.0).await
}

// 手动重试 failed 的同步任务
pub async fn retry_sync_job(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    SYNC_SERVICE.retry_sync_job(&req, path.0).await
}

// 配置路由
pub fn configure_sync_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/grades")
            .service(web::resource("/{id}/sync-jobs").route(web::get().to(list_sync_jobs))),
    );
    cfg.service(
        web::scope("/api/v1/sync-jobs")
            .service(web::resource("/{id}/retry").route(web::post().to(retry_sync_job))),
    );
}
