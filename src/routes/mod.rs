pub mod grades;

pub mod integrations;

pub mod submissions;

pub mod sync;

pub use grades::configure_grades_routes;
pub use integrations::configure_integrations_routes;
pub use submissions::configure_submissions_routes;
pub use sync::configure_sync_routes;
