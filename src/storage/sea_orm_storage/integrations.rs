//! LMS 集成配置存储操作

use super::SeaOrmStorage;
use crate::entity::lms_integrations::{ActiveModel, Column, Entity as LmsIntegrations};
use crate::errors::{LearnboardError, Result};
use crate::models::integrations::{
    entities::{LmsIntegration, LmsType},
    requests::CreateIntegrationRequest,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 注册集成
    pub async fn create_integration_impl(
        &self,
        req: CreateIntegrationRequest,
    ) -> Result<LmsIntegration> {
        // 先校验类型标签，拒绝未知 LMS
        let lms_type = LmsType::parse(&req.lms_type)?;

        let model = ActiveModel {
            course_id: Set(req.course_id),
            lms_type: Set(lms_type.as_str().to_string()),
            api_url: Set(req.api_url),
            api_key: Set(req.api_key),
            external_course_id: Set(req.external_course_id),
            is_active: Set(true),
            sync_enabled: Set(true),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("注册集成失败: {e}")))?;

        result.into_integration()
    }

    /// 通过 ID 获取集成
    pub async fn get_integration_by_id_impl(&self, id: i64) -> Result<Option<LmsIntegration>> {
        let result = LmsIntegrations::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询集成失败: {e}")))?;

        result.map(|m| m.into_integration()).transpose()
    }

    /// 列出某课程的集成
    pub async fn list_integrations_by_course_impl(
        &self,
        course_id: i64,
        active_only: bool,
    ) -> Result<Vec<LmsIntegration>> {
        let mut select = LmsIntegrations::find().filter(Column::CourseId.eq(course_id));

        if active_only {
            select = select
                .filter(Column::IsActive.eq(true))
                .filter(Column::SyncEnabled.eq(true));
        }

        let models = select
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询集成列表失败: {e}")))?;

        models
            .into_iter()
            .map(|m| m.into_integration())
            .collect::<Result<Vec<_>>>()
    }
}
