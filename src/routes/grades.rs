use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::grades::requests::ManualGradeRequest;
use crate::services::GradeService;
use crate::utils::SafeIDI64;

// 懒加载的全局 GradeService 实例
static GRADE_SERVICE: Lazy<GradeService> = Lazy::new(GradeService::new_lazy);

// 查询某提交的评分
pub async fn get_grade(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    GRADE_SERVICE.get_grade(&req, path.0).await
}

// 教师人工评分/覆盖
pub async fn override_grade(
    req: HttpRequest,
    path: SafeIDI64,
    body: web::Json<ManualGradeRequest>,
) -> ActixResult<HttpResponse> {
    GRADE_SERVICE
        .override_grade(&req, path.0, body.into_inner())
        .await
}

// 配置路由（评分挂在提交资源下）
pub fn configure_grades_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions/{id}/grade").service(
            web::resource("")
                .route(web::get().to(get_grade))
                .route(web::put().to(override_grade)),
        ),
    );
}
