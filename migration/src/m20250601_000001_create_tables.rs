use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建提交表
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submissions::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::InputType).string().not_null())
                    .col(ColumnDef::new(Submissions::TextContent).text().null())
                    .col(ColumnDef::new(Submissions::ImageRef).string().null())
                    .col(ColumnDef::new(Submissions::ExtractedText).text().null())
                    .col(ColumnDef::new(Submissions::Status).string().not_null())
                    .col(ColumnDef::new(Submissions::FailureReason).string().null())
                    .col(
                        ColumnDef::new(Submissions::ExtractionAttempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Submissions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建评估结果表
        manager
            .create_table(
                Table::create()
                    .table(EvaluationResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EvaluationResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(EvaluationResults::SubmissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationResults::AttemptNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationResults::Outcome)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EvaluationResults::Score).double().null())
                    .col(
                        ColumnDef::new(EvaluationResults::ScoreClamped)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(EvaluationResults::Feedback).text().null())
                    .col(
                        ColumnDef::new(EvaluationResults::ModelVersion)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EvaluationResults::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(EvaluationResults::Table, EvaluationResults::SubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一提交的尝试序号不可重复
        manager
            .create_index(
                Index::create()
                    .name("idx_evaluation_results_submission_attempt")
                    .table(EvaluationResults::Table)
                    .col(EvaluationResults::SubmissionId)
                    .col(EvaluationResults::AttemptNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建评分表
        manager
            .create_table(
                Table::create()
                    .table(Grades::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Grades::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Grades::SubmissionId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Grades::Score).double().not_null())
                    .col(ColumnDef::new(Grades::Source).string().not_null())
                    .col(ColumnDef::new(Grades::Feedback).text().null())
                    .col(ColumnDef::new(Grades::GraderId).big_integer().null())
                    .col(ColumnDef::new(Grades::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Grades::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Grades::Table, Grades::SubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建 LMS 集成配置表
        manager
            .create_table(
                Table::create()
                    .table(LmsIntegrations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LmsIntegrations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LmsIntegrations::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LmsIntegrations::LmsType).string().not_null())
                    .col(ColumnDef::new(LmsIntegrations::ApiUrl).string().not_null())
                    .col(ColumnDef::new(LmsIntegrations::ApiKey).string().not_null())
                    .col(
                        ColumnDef::new(LmsIntegrations::ExternalCourseId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LmsIntegrations::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LmsIntegrations::SyncEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(LmsIntegrations::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lms_integrations_course")
                    .table(LmsIntegrations::Table)
                    .col(LmsIntegrations::CourseId)
                    .to_owned(),
            )
            .await?;

        // 创建同步任务表
        manager
            .create_table(
                Table::create()
                    .table(SyncJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncJobs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SyncJobs::GradeId).big_integer().not_null())
                    .col(
                        ColumnDef::new(SyncJobs::IntegrationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SyncJobs::Status).string().not_null())
                    .col(
                        ColumnDef::new(SyncJobs::AttemptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(SyncJobs::LastError).string().null())
                    .col(ColumnDef::new(SyncJobs::LastAttemptedAt).big_integer().null())
                    .col(ColumnDef::new(SyncJobs::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(SyncJobs::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(SyncJobs::Table, SyncJobs::GradeId)
                            .to(Grades::Table, Grades::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(SyncJobs::Table, SyncJobs::IntegrationId)
                            .to(LmsIntegrations::Table, LmsIntegrations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sync_jobs_grade_integration")
                    .table(SyncJobs::Table)
                    .col(SyncJobs::GradeId)
                    .col(SyncJobs::IntegrationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LmsIntegrations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Grades::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EvaluationResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Submissions {
    Table,
    Id,
    StudentId,
    AssignmentId,
    CourseId,
    InputType,
    TextContent,
    ImageRef,
    ExtractedText,
    Status,
    FailureReason,
    ExtractionAttempts,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EvaluationResults {
    Table,
    Id,
    SubmissionId,
    AttemptNumber,
    Outcome,
    Score,
    ScoreClamped,
    Feedback,
    ModelVersion,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Grades {
    Table,
    Id,
    SubmissionId,
    Score,
    Source,
    Feedback,
    GraderId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LmsIntegrations {
    Table,
    Id,
    CourseId,
    LmsType,
    ApiUrl,
    ApiKey,
    ExternalCourseId,
    IsActive,
    SyncEnabled,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SyncJobs {
    Table,
    Id,
    GradeId,
    IntegrationId,
    Status,
    AttemptCount,
    LastError,
    LastAttemptedAt,
    CreatedAt,
    UpdatedAt,
}
