use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::Request;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use marketplace_api::{
    config::AppConfig,
    db::MemStore,
    dto::{
        auth::{Claims, LoginRequest, ProfileUpdateRequest, RegisterRequest},
        principals::StaffRegisterRequest,
    },
    error::AppError,
    middleware::auth::AuthPrincipal,
    models::Role,
    services::auth_service,
    state::AppState,
};

const SECRET: &str = "test-secret";

#[tokio::test]
async fn register_hashes_password_and_rejects_duplicates() -> anyhow::Result<()> {
    let state = test_state();

    let resp = auth_service::register_customer(&state, register_request("ana@example.com")).await?;
    assert_eq!(resp.message, "User registered successfully");
    let user = resp.data.unwrap();
    assert!(user.password_hash.starts_with("$argon2"));

    // Same email again, same role.
    let err = auth_service::register_customer(&state, register_request("ana@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(msg) if msg == "User already exists"));

    // Same phone under a fresh email collides too.
    let mut request = register_request("other@example.com");
    request.phone = register_request("ana@example.com").phone;
    let err = auth_service::register_customer(&state, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(msg) if msg == "User already exists"));

    Ok(())
}

#[tokio::test]
async fn same_email_may_exist_under_different_roles() -> anyhow::Result<()> {
    let state = test_state();

    auth_service::register_customer(&state, register_request("dual@example.com")).await?;
    let resp = auth_service::register_admin(&state, RegisterRequest {
        name: "Dual".to_string(),
        email: "dual@example.com".to_string(),
        phone: "+15550199".to_string(),
        password: "secret123".to_string(),
    })
    .await?;
    assert_eq!(resp.message, "Admin registered successfully");

    Ok(())
}

#[tokio::test]
async fn login_mints_a_decodable_token() -> anyhow::Result<()> {
    let state = test_state();
    let user = auth_service::register_customer(&state, register_request("bo@example.com"))
        .await?
        .data
        .unwrap();

    let resp = auth_service::login(&state, Role::Customer, LoginRequest {
        email: "bo@example.com".to_string(),
        password: "secret123".to_string(),
    })
    .await?;
    assert_eq!(resp.message, "Login successful");
    let login = resp.data.unwrap();
    assert_eq!(login.user.id, user.id);

    let decoded = decode::<Claims>(
        &login.token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &Validation::default(),
    )?;
    assert_eq!(decoded.claims.sub, user.id.to_string());
    assert_eq!(decoded.claims.role, "customer");
    assert_eq!(decoded.claims.store_id, None);

    Ok(())
}

#[tokio::test]
async fn login_failures_distinguish_unknown_from_wrong_password() -> anyhow::Result<()> {
    let state = test_state();
    auth_service::register_customer(&state, register_request("cara@example.com")).await?;

    let err = auth_service::login(&state, Role::Customer, LoginRequest {
        email: "nobody@example.com".to_string(),
        password: "secret123".to_string(),
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "User not found"));

    let err = auth_service::login(&state, Role::Customer, LoginRequest {
        email: "cara@example.com".to_string(),
        password: "wrong".to_string(),
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    // Role-scoped lookup: a customer cannot log in through the admin door.
    let err = auth_service::login(&state, Role::Admin, LoginRequest {
        email: "cara@example.com".to_string(),
        password: "secret123".to_string(),
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "Admin not found"));

    Ok(())
}

#[tokio::test]
async fn staff_registration_requires_store_and_binds_token() -> anyhow::Result<()> {
    let state = test_state();

    let err = auth_service::register_staff(&state, Role::StoreManager, StaffRegisterRequest {
        name: "Mia".to_string(),
        email: "mia@example.com".to_string(),
        phone: "+15550150".to_string(),
        password: "secret123".to_string(),
        store_id: None,
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg == "Store ID is required"));

    let store = Uuid::new_v4();
    let resp = auth_service::register_staff(&state, Role::StoreManager, StaffRegisterRequest {
        name: "Mia".to_string(),
        email: "mia@example.com".to_string(),
        phone: "+15550150".to_string(),
        password: "secret123".to_string(),
        store_id: Some(store),
    })
    .await?;
    assert_eq!(resp.message, "Store Manager registered successfully");

    let login = auth_service::login(&state, Role::StoreManager, LoginRequest {
        email: "mia@example.com".to_string(),
        password: "secret123".to_string(),
    })
    .await?
    .data
    .unwrap();

    let decoded = decode::<Claims>(
        &login.token,
        &DecodingKey::from_secret(SECRET.as_bytes()),
        &Validation::default(),
    )?;
    assert_eq!(decoded.claims.role, "store_manager");
    assert_eq!(decoded.claims.store_id, Some(store.to_string()));

    Ok(())
}

#[tokio::test]
async fn bearer_extractor_accepts_minted_tokens() -> anyhow::Result<()> {
    let state = test_state();
    let store = Uuid::new_v4();
    let manager = auth_service::register_staff(&state, Role::DeliveryPerson, StaffRegisterRequest {
        name: "Dex".to_string(),
        email: "dex@example.com".to_string(),
        phone: "+15550151".to_string(),
        password: "secret123".to_string(),
        store_id: Some(store),
    })
    .await?
    .data
    .unwrap();

    let token = auth_service::issue_token(&state.config, &manager)?;
    let request = Request::builder()
        .uri("/")
        .header("Authorization", format!("Bearer {token}"))
        .body(())?;
    let (mut parts, _) = request.into_parts();

    let principal = AuthPrincipal::from_request_parts(&mut parts, &state)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(principal.id, manager.id);
    assert_eq!(principal.role, Role::DeliveryPerson);
    assert_eq!(principal.store_id, Some(store));

    Ok(())
}

#[tokio::test]
async fn bearer_extractor_rejects_bad_headers() -> anyhow::Result<()> {
    let state = test_state();

    let request = Request::builder().uri("/").body(())?;
    let (mut parts, _) = request.into_parts();
    let err = AuthPrincipal::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Missing Authorization header"));

    let request = Request::builder()
        .uri("/")
        .header("Authorization", "Basic abc")
        .body(())?;
    let (mut parts, _) = request.into_parts();
    let err = AuthPrincipal::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Invalid Authorization scheme"));

    let request = Request::builder()
        .uri("/")
        .header("Authorization", "Bearer not-a-jwt")
        .body(())?;
    let (mut parts, _) = request.into_parts();
    let err = AuthPrincipal::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Invalid or expired token"));

    Ok(())
}

#[tokio::test]
async fn bearer_extractor_rejects_expired_and_foreign_tokens() -> anyhow::Result<()> {
    let state = test_state();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        role: "customer".to_string(),
        store_id: None,
        exp: (Utc::now() - Duration::hours(2)).timestamp() as usize,
    };

    let expired = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )?;
    let request = Request::builder()
        .uri("/")
        .header("Authorization", format!("Bearer {expired}"))
        .body(())?;
    let (mut parts, _) = request.into_parts();
    let err = AuthPrincipal::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Invalid or expired token"));

    // Valid lifetime but signed with someone else's key.
    let claims = Claims {
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        ..claims
    };
    let foreign = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"another-secret"),
    )?;
    let request = Request::builder()
        .uri("/")
        .header("Authorization", format!("Bearer {foreign}"))
        .body(())?;
    let (mut parts, _) = request.into_parts();
    let err = AuthPrincipal::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Invalid or expired token"));

    Ok(())
}

#[tokio::test]
async fn profile_update_rehashes_password_and_guards_phone() -> anyhow::Result<()> {
    let state = test_state();
    let ana = auth_service::register_customer(&state, register_request("ana@example.com"))
        .await?
        .data
        .unwrap();
    let mut other = register_request("zoe@example.com");
    other.phone = "+15550160".to_string();
    auth_service::register_customer(&state, other).await?;

    // Taking another customer's phone is a conflict.
    let err = auth_service::update_profile(&state, ana.id, ProfileUpdateRequest {
        phone: Some("+15550160".to_string()),
        ..Default::default()
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(msg) if msg == "User already exists"));

    // Keeping your own phone is not.
    let resp = auth_service::update_profile(&state, ana.id, ProfileUpdateRequest {
        phone: Some(ana.phone.clone()),
        name: Some("Ana Maria".to_string()),
        password: Some("rotated456".to_string()),
        address: Some("12 Elm St".to_string()),
        ..Default::default()
    })
    .await?;
    assert_eq!(resp.message, "Profile updated successfully");
    let updated = resp.data.unwrap();
    assert_eq!(updated.name, "Ana Maria");
    assert_ne!(updated.password_hash, ana.password_hash);

    // The rotated password is the one that logs in now.
    let login = auth_service::login(&state, Role::Customer, LoginRequest {
        email: "ana@example.com".to_string(),
        password: "rotated456".to_string(),
    })
    .await?;
    assert_eq!(login.message, "Login successful");

    Ok(())
}

#[tokio::test]
async fn delete_profile_removes_the_account() -> anyhow::Result<()> {
    let state = test_state();
    let user = auth_service::register_customer(&state, register_request("gone@example.com"))
        .await?
        .data
        .unwrap();

    let resp = auth_service::delete_profile(&state, user.id).await?;
    assert_eq!(resp.message, "User deleted successfully");

    let err = auth_service::get_profile(&state, user.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "User not found"));

    let err = auth_service::delete_profile(&state, user.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(msg) if msg == "User not found"));

    Ok(())
}

#[tokio::test]
async fn register_and_login_leave_an_audit_trail() -> anyhow::Result<()> {
    let store = Arc::new(MemStore::new());
    let state = AppState::new(store.clone(), test_config());

    let user = auth_service::register_customer(&state, register_request("trail@example.com"))
        .await?
        .data
        .unwrap();
    auth_service::login(&state, Role::Customer, LoginRequest {
        email: "trail@example.com".to_string(),
        password: "secret123".to_string(),
    })
    .await?;

    let entries = store.audit_entries().await;
    let actions: Vec<&str> = entries.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["principal_register", "principal_login"]);
    assert!(entries.iter().all(|e| e.principal_id == Some(user.id)));

    Ok(())
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: SECRET.to_string(),
        session_ttl_hours: 168,
    }
}

fn test_state() -> AppState {
    AppState::new(Arc::new(MemStore::new()), test_config())
}

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Ana".to_string(),
        email: email.to_string(),
        phone: format!("+1555{:07}", email.len()),
        password: "secret123".to_string(),
    }
}
