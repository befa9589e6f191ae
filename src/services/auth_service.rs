use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    config::AppConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse, ProfileUpdateRequest, RegisterRequest},
    dto::principals::{PrincipalList, StaffRegisterRequest},
    error::{AppError, AppResult},
    models::{CustomerProfile, Principal, Role, RoleData, StaffProfile},
    response::{ApiResponse, Meta},
    state::AppState,
};
use crate::db::{PrincipalPatch, ProfilePatch};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(config: &AppConfig, principal: &Principal) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.session_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: principal.id.to_string(),
        role: principal.data.role().as_str().to_owned(),
        store_id: principal.data.store_id().map(|id| id.to_string()),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

async fn ensure_unique(state: &AppState, role: Role, email: &str, phone: &str) -> AppResult<()> {
    if state.db.principal_by_email(role, email).await?.is_some()
        || state.db.principal_by_phone(role, phone).await?.is_some()
    {
        return Err(AppError::Conflict(format!(
            "{} already exists",
            role.display_name()
        )));
    }
    Ok(())
}

async fn register(
    state: &AppState,
    name: String,
    email: String,
    phone: String,
    password: String,
    data: RoleData,
) -> AppResult<ApiResponse<Principal>> {
    let role = data.role();
    ensure_unique(state, role, &email, &phone).await?;

    let password_hash = hash_password(&password)?;
    let now = Utc::now();
    let principal = Principal {
        id: Uuid::new_v4(),
        name,
        email,
        phone,
        password_hash,
        data,
        created_at: now,
        updated_at: now,
    };
    let principal = state.db.insert_principal(principal).await?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(principal.id),
        "principal_register",
        Some("principals"),
        Some(serde_json::json!({ "role": role.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        format!("{} registered successfully", role.display_name()),
        principal,
        Some(Meta::empty()),
    ))
}

pub async fn register_customer(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Principal>> {
    let RegisterRequest {
        name,
        email,
        phone,
        password,
    } = payload;
    let data = RoleData::Customer(CustomerProfile::default());
    register(state, name, email, phone, password, data).await
}

pub async fn register_admin(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Principal>> {
    let RegisterRequest {
        name,
        email,
        phone,
        password,
    } = payload;
    register(state, name, email, phone, password, RoleData::Admin).await
}

/// Staff registration requires the store binding up front; the token minted
/// at login carries it so store-scoped endpoints can check it.
pub async fn register_staff(
    state: &AppState,
    role: Role,
    payload: StaffRegisterRequest,
) -> AppResult<ApiResponse<Principal>> {
    let StaffRegisterRequest {
        name,
        email,
        phone,
        password,
        store_id,
    } = payload;
    let store_id =
        store_id.ok_or_else(|| AppError::Validation("Store ID is required".to_string()))?;

    let staff = StaffProfile { store_id };
    let data = match role {
        Role::StoreManager => RoleData::StoreManager(staff),
        Role::DeliveryPerson => RoleData::DeliveryPerson(staff),
        _ => return Err(AppError::Internal(anyhow::anyhow!("not a staff role"))),
    };
    register(state, name, email, phone, password, data).await
}

pub async fn login(
    state: &AppState,
    role: Role,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let principal = state
        .db
        .principal_by_email(role, &email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", role.display_name())))?;

    if !verify_password(&password, &principal.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(&state.config, &principal)?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(principal.id),
        "principal_login",
        Some("principals"),
        Some(serde_json::json!({ "role": role.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Login successful",
        LoginResponse {
            token,
            user: principal,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Principal>> {
    let principal = state
        .db
        .principal_by_id(Role::Customer, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(ApiResponse::success("OK", principal, None))
}

pub async fn list_profiles(state: &AppState) -> AppResult<ApiResponse<PrincipalList>> {
    let items = state.db.list_principals(Role::Customer, None).await?;
    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("OK", PrincipalList { items }, Some(meta)))
}

pub async fn update_profile(
    state: &AppState,
    id: Uuid,
    payload: ProfileUpdateRequest,
) -> AppResult<ApiResponse<Principal>> {
    let ProfileUpdateRequest {
        name,
        phone,
        password,
        address,
        profile_picture,
        saved_addresses,
        favorite_stores,
        payment_methods,
        notification_preferences,
        location,
    } = payload;

    if let Some(phone) = phone.as_deref() {
        if let Some(existing) = state.db.principal_by_phone(Role::Customer, phone).await? {
            if existing.id != id {
                return Err(AppError::Conflict("User already exists".to_string()));
            }
        }
    }

    let password_hash = password.as_deref().map(hash_password).transpose()?;
    let patch = PrincipalPatch {
        name,
        phone,
        password_hash,
        profile: Some(ProfilePatch {
            address,
            profile_picture,
            saved_addresses,
            favorite_stores,
            payment_methods,
            notification_preferences,
            location,
        }),
    };

    let principal = state
        .db
        .update_principal(Role::Customer, id, None, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(principal.id),
        "profile_update",
        Some("principals"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Profile updated successfully",
        principal,
        Some(Meta::empty()),
    ))
}

pub async fn delete_profile(
    state: &AppState,
    principal_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let deleted = state
        .db
        .delete_principal(Role::Customer, principal_id, None)
        .await?;
    if !deleted {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(principal_id),
        "profile_delete",
        Some("principals"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "User deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
