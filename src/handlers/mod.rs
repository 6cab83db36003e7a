pub mod application_handlers;
pub mod extract;
pub mod health_handlers;
pub mod job_handlers;
pub mod news_handlers;
pub mod upload_handlers;

pub use application_handlers::{
    get_application_handler, list_applications_handler, update_status_handler,
};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use health_handlers::health_handler;
pub use job_handlers::{
    apply_handler, create_job_handler, delete_job_handler, get_job_handler, list_jobs_handler,
};
pub use news_handlers::{create_news_handler, list_news_handler};
pub use upload_handlers::get_upload_handler;
