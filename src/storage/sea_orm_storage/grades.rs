//! 评分存储操作

use super::SeaOrmStorage;
use crate::entity::grades::{ActiveModel, Column, Entity as Grades};
use crate::errors::{LearnboardError, Result};
use crate::models::grades::entities::{Grade, GradeUpsert};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

impl SeaOrmStorage {
    /// 创建或覆盖更新评分（每个提交至多一条）
    pub async fn upsert_grade_impl(&self, rec: GradeUpsert) -> Result<Grade> {
        let now = chrono::Utc::now().timestamp();

        let existing = Grades::find()
            .filter(Column::SubmissionId.eq(rec.submission_id))
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询评分失败: {e}")))?;

        let result = match existing {
            Some(found) => {
                let model = ActiveModel {
                    id: Set(found.id),
                    score: Set(rec.score),
                    source: Set(rec.source.as_str().to_string()),
                    feedback: Set(rec.feedback),
                    grader_id: Set(rec.grader_id),
                    updated_at: Set(now),
                    ..Default::default()
                };
                model.update(&self.db).await.map_err(|e| {
                    LearnboardError::database_operation(format!("更新评分失败: {e}"))
                })?
            }
            None => {
                let model = ActiveModel {
                    submission_id: Set(rec.submission_id),
                    score: Set(rec.score),
                    source: Set(rec.source.as_str().to_string()),
                    feedback: Set(rec.feedback),
                    grader_id: Set(rec.grader_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                model.insert(&self.db).await.map_err(|e| {
                    LearnboardError::database_operation(format!("创建评分失败: {e}"))
                })?
            }
        };

        result.into_grade()
    }

    /// 通过 ID 获取评分
    pub async fn get_grade_by_id_impl(&self, grade_id: i64) -> Result<Option<Grade>> {
        let result = Grades::find_by_id(grade_id)
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询评分失败: {e}")))?;

        result.map(|m| m.into_grade()).transpose()
    }

    /// 通过提交 ID 获取评分
    pub async fn get_grade_by_submission_id_impl(
        &self,
        submission_id: i64,
    ) -> Result<Option<Grade>> {
        let result = Grades::find()
            .filter(Column::SubmissionId.eq(submission_id))
            .one(&self.db)
            .await
            .map_err(|e| LearnboardError::database_operation(format!("查询评分失败: {e}")))?;

        result.map(|m| m.into_grade()).transpose()
    }
}
