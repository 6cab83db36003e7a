use crate::models::user::User;
use crate::repositories::{RepositoryError, UserRepository};
use crate::services::token_service::{IssuedToken, TokenError, TokenService};
use crate::services::user_service::verify_password;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

/// Hash verified when the email is unknown, so a miss costs as much as a wrong password.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"dummy-password-for-timing", &salt)
        .map(|hash| hash.to_string())
        .unwrap_or_default()
});

pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self {
            user_repository,
            tokens,
        }
    }

    /// Check credentials and issue a session token.
    pub async fn authenticate(
        &self,
        request: LoginRequest,
    ) -> Result<(User, IssuedToken), AuthServiceError> {
        let user = self
            .user_repository
            .find_by_email(request.email.trim())
            .await?;

        let user = match user {
            Some(user) if verify_password(&request.password, &user.password_hash) => user,
            Some(user) => {
                warn!(user_id = user.id, "Rejected login: wrong password");
                return Err(AuthServiceError::InvalidCredentials);
            }
            None => {
                verify_password(&request.password, &DUMMY_HASH);
                warn!("Rejected login: unknown email");
                return Err(AuthServiceError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    /// Resolve a bearer token to the user it was issued for.
    pub async fn identify(&self, token: &str) -> Result<User, AuthServiceError> {
        let user_id = self.tokens.verify(token)?;
        self.get_user_by_id(user_id).await
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<User, AuthServiceError> {
        self.user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }
}
