pub use super::evaluation_results::Entity as EvaluationResults;
pub use super::grades::Entity as Grades;
pub use super::lms_integrations::Entity as LmsIntegrations;
pub use super::submissions::Entity as Submissions;
pub use super::sync_jobs::Entity as SyncJobs;
