//! LMS 集成配置实体
//!
//! 每个课程可配置多个独立的集成；流水线只读，不修改配置。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lms_integrations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub lms_type: String,
    pub api_url: String,
    pub api_key: String,
    pub external_course_id: String,
    pub is_active: bool,
    pub sync_enabled: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sync_jobs::Entity")]
    SyncJobs,
}

impl Related<super::sync_jobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SyncJobs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
