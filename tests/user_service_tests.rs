use jobboard::{
    models::user::Role,
    repositories::user_repository::SqliteUserRepository,
    services::user_service::{CreateUserRequest, UserService, UserServiceError},
    test_utils::test_helpers,
};
use std::sync::Arc;

fn request(email: &str, password: &str) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: password.to_string(),
        role: None,
        name: None,
    }
}

#[tokio::test]
async fn test_create_user_success() {
    // Create isolated test database
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool));
    let service = UserService::new(repository);

    let user = service
        .create_user(request("test@example.com", "password123"))
        .await
        .unwrap();

    assert_eq!(user.email, "test@example.com");
    assert_eq!(user.role, Role::Candidate);
    assert_eq!(user.name, "test");
    assert_ne!(user.password_hash, "password123");
    assert!(service.verify_password("password123", &user.password_hash));
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let service = UserService::new(repository);

    service
        .create_user(request("duplicate@example.com", "password123"))
        .await
        .unwrap();

    // Same address with different case is the same identity
    let result = service
        .create_user(request("Duplicate@Example.com", "password456"))
        .await;
    assert!(matches!(result, Err(UserServiceError::EmailTaken)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_create_user_with_role_and_name() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let service = UserService::new(Arc::new(SqliteUserRepository::new(pool)));

    let user = service
        .create_user(CreateUserRequest {
            email: "  hr@acme.test ".to_string(),
            password: "secret".to_string(),
            role: Some("Employer".to_string()),
            name: Some("Acme HR".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(user.email, "hr@acme.test");
    assert_eq!(user.role, Role::Employer);
    assert_eq!(user.name, "Acme HR");
}

#[tokio::test]
async fn test_create_user_rejects_bad_input() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let service = UserService::new(Arc::new(SqliteUserRepository::new(pool)));

    assert!(matches!(
        service.create_user(request("not-an-email", "pw")).await,
        Err(UserServiceError::InvalidEmail)
    ));
    assert!(matches!(
        service.create_user(request("a@b.test", "")).await,
        Err(UserServiceError::EmptyPassword)
    ));

    let mut bad_role = request("a@b.test", "pw");
    bad_role.role = Some("recruiter".to_string());
    assert!(matches!(
        service.create_user(bad_role).await,
        Err(UserServiceError::InvalidRole(role)) if role == "recruiter"
    ));
}

#[tokio::test]
async fn test_find_user_by_email_ignores_case() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let service = UserService::new(Arc::new(SqliteUserRepository::new(pool)));

    let created = service
        .create_user(request("alice@example.com", "pw123"))
        .await
        .unwrap();

    let found = service
        .find_user_by_email("ALICE@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, created.id);

    assert!(service
        .find_user_by_email("nobody@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_set_password() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let service = UserService::new(Arc::new(SqliteUserRepository::new(pool)));

    service
        .create_user(request("reset@example.com", "old-password"))
        .await
        .unwrap();

    service
        .set_password("reset@example.com", "new-password")
        .await
        .unwrap();

    let user = service
        .find_user_by_email("reset@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(service.verify_password("new-password", &user.password_hash));
    assert!(!service.verify_password("old-password", &user.password_hash));

    assert!(matches!(
        service.set_password("ghost@example.com", "x").await,
        Err(UserServiceError::UserNotFound)
    ));
}

#[tokio::test]
async fn test_list_users_paginates() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let service = UserService::new(Arc::new(SqliteUserRepository::new(pool)));

    for i in 0..5 {
        service
            .create_user(request(&format!("user{}@example.com", i), "pw"))
            .await
            .unwrap();
    }

    let all = service.list_users(None, None).await.unwrap();
    assert_eq!(all.len(), 5);

    let page = service.list_users(Some(2), Some(1)).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, all[1].id);
}
