//! Registration and login against a real database.

use chrono::Utc;

use buildify_core::auth::{self, AuthError, NewAccount};
use buildify_core::token::{self, TokenConfig};
use buildify_db::queries::users;
use buildify_test_utils::{create_test_db, drop_test_db};

fn tokens() -> TokenConfig {
    TokenConfig::new(b"auth-test-secret".to_vec()).unwrap()
}

fn account<'a>(username: &'a str, email: &'a str, password: &'a str) -> NewAccount<'a> {
    NewAccount {
        username,
        email,
        password,
    }
}

#[tokio::test]
async fn register_stores_hash_not_plaintext() {
    let (pool, db_name) = create_test_db().await;

    let user = auth::register(&pool, &account("ada", "ada@example.com", "s3cret!"))
        .await
        .unwrap();
    assert_ne!(user.password_hash, "s3cret!");
    assert!(user.password_hash.starts_with("$argon2id$"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn second_registration_with_same_email_conflicts() {
    let (pool, db_name) = create_test_db().await;

    let first = auth::register(&pool, &account("ada", "ada@example.com", "one"))
        .await
        .unwrap();
    let err = auth::register(&pool, &account("ada2", "ada@example.com", "two"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Conflict), "got {err:?}");

    let stored = users::get_user_by_email(&pool, "ada@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.username, "ada");
    assert_eq!(stored.password_hash, first.password_hash);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let (pool, db_name) = create_test_db().await;

    auth::register(&pool, &account("ada", "ada@example.com", "one"))
        .await
        .unwrap();
    let err = auth::register(&pool, &account("ada", "other@example.com", "two"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Conflict), "got {err:?}");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn register_requires_fields() {
    let (pool, db_name) = create_test_db().await;

    let err = auth::register(&pool, &account("", "a@example.com", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn login_issues_token_for_user() {
    let (pool, db_name) = create_test_db().await;
    let config = tokens();

    let user = auth::register(&pool, &account("grace", "grace@example.com", "hopper"))
        .await
        .unwrap();
    let now = Utc::now();
    let outcome = auth::login(&pool, &config, "grace@example.com", "hopper", now)
        .await
        .unwrap();

    assert_eq!(outcome.user.id, user.id);
    assert_eq!(outcome.user.username, "grace");
    let claims = token::validate_token(&config, &outcome.token, now).unwrap();
    assert_eq!(claims.user_id, user.id);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn login_distinguishes_unknown_email_from_bad_password() {
    let (pool, db_name) = create_test_db().await;
    let config = tokens();

    auth::register(&pool, &account("grace", "grace@example.com", "hopper"))
        .await
        .unwrap();

    let unknown = auth::login(&pool, &config, "nobody@example.com", "hopper", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(unknown, AuthError::NotFound));

    let wrong = auth::login(&pool, &config, "grace@example.com", "wrong", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(wrong, AuthError::InvalidCredentials));

    pool.close().await;
    drop_test_db(&db_name).await;
}
