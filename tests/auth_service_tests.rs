use jobboard::{
    config::TokenConfig,
    repositories::user_repository::SqliteUserRepository,
    services::{
        auth_service::{AuthService, AuthServiceError, LoginRequest},
        token_service::{TokenError, TokenService},
        user_service::{CreateUserRequest, UserService},
    },
    test_utils::test_helpers,
};
use std::sync::Arc;

async fn services() -> (UserService, AuthService) {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let tokens = Arc::new(TokenService::new(&test_helpers::test_token_config()));
    (
        UserService::new(repository.clone()),
        AuthService::new(repository, tokens),
    )
}

async fn register(user_service: &UserService, email: &str, password: &str) -> i64 {
    user_service
        .create_user(CreateUserRequest {
            email: email.to_string(),
            password: password.to_string(),
            role: None,
            name: None,
        })
        .await
        .unwrap()
        .id
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_authenticate_success() {
    let (user_service, auth_service) = services().await;
    let id = register(&user_service, "auth@example.com", "correctpassword").await;

    let (user, issued) = auth_service
        .authenticate(login("auth@example.com", "correctpassword"))
        .await
        .unwrap();

    assert_eq!(user.id, id);
    assert!(!issued.token.is_empty());
    assert!(issued.expires_at > chrono::Utc::now());

    // The token resolves back to the same identity
    let identified = auth_service.identify(&issued.token).await.unwrap();
    assert_eq!(identified.id, id);
}

#[tokio::test]
async fn test_authenticate_email_case_insensitive() {
    let (user_service, auth_service) = services().await;
    let id = register(&user_service, "Alice@Example.com", "pw123").await;

    let (user, _) = auth_service
        .authenticate(login("alice@example.com", "pw123"))
        .await
        .unwrap();
    assert_eq!(user.id, id);
}

#[tokio::test]
async fn test_authenticate_wrong_password() {
    let (user_service, auth_service) = services().await;
    register(&user_service, "auth@example.com", "correctpassword").await;

    let result = auth_service
        .authenticate(login("auth@example.com", "wrongpassword"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn test_authenticate_unknown_email() {
    let (_, auth_service) = services().await;

    let result = auth_service
        .authenticate(login("nobody@example.com", "whatever"))
        .await;
    assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let (user_service, auth_service) = services().await;
    let id = register(&user_service, "auth@example.com", "pw").await;

    let foreign = TokenService::new(&TokenConfig {
        secret: vec![7u8; 64],
        ttl: chrono::Duration::hours(1),
    });
    let issued = foreign.issue(id).unwrap();

    let result = auth_service.identify(&issued.token).await;
    assert!(matches!(
        result,
        Err(AuthServiceError::Token(TokenError::InvalidSignature))
    ));
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let user_service = UserService::new(repository.clone());
    let mut config = test_helpers::test_token_config();
    config.ttl = chrono::Duration::seconds(-60);
    let auth_service = AuthService::new(repository, Arc::new(TokenService::new(&config)));

    register(&user_service, "late@example.com", "pw").await;
    let (_, issued) = auth_service
        .authenticate(login("late@example.com", "pw"))
        .await
        .unwrap();

    assert!(matches!(
        auth_service.identify(&issued.token).await,
        Err(AuthServiceError::Token(TokenError::Expired))
    ));
}
