pub mod handlers;
pub mod middleware;

pub use middleware::{extract_bearer_token, require_auth, AuthUser, MaybeAuthUser};
