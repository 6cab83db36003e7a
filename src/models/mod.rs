pub mod application;
pub mod job;
pub mod news;
pub mod user;

pub use application::{Application, ApplicationDetail, ApplicationStatus, NewApplication};
pub use job::{CreateJobRequest, Job, NewJob};
pub use news::{CreateNewsRequest, News};
pub use user::{Role, User, UserSummary};
