pub mod application_service;
pub mod auth_service;
pub mod blob_store;
pub mod job_service;
pub mod match_scorer;
pub mod status_workflow;
pub mod token_service;
pub mod user_service;

pub use application_service::{ApplicationService, ResumeUpload};
pub use auth_service::{AuthService, LoginRequest};
pub use blob_store::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use job_service::JobService;
pub use token_service::{IssuedToken, TokenService};
pub use user_service::{CreateUserRequest, UserService};
