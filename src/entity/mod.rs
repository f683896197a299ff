pub mod evaluation_results;
pub mod grades;
pub mod lms_integrations;
pub mod prelude;
pub mod submissions;
pub mod sync_jobs;
