use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::PrincipalPatch,
    dto::principals::{PrincipalList, StaffUpdateRequest},
    error::{AppError, AppResult},
    models::{Principal, Role},
    response::{ApiResponse, Meta},
    services::auth_service::hash_password,
    state::AppState,
};

/// Directory listing for one principal kind, optionally narrowed to one
/// store's staff.
pub async fn list_directory(
    state: &AppState,
    role: Role,
    store_id: Option<Uuid>,
) -> AppResult<ApiResponse<PrincipalList>> {
    let items = state.db.list_principals(role, store_id).await?;
    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("OK", PrincipalList { items }, Some(meta)))
}

pub async fn update_directory_entry(
    state: &AppState,
    role: Role,
    id: Uuid,
    store_id: Option<Uuid>,
    payload: StaffUpdateRequest,
) -> AppResult<ApiResponse<Principal>> {
    let StaffUpdateRequest {
        name,
        phone,
        password,
    } = payload;

    if let Some(phone) = phone.as_deref() {
        if let Some(existing) = state.db.principal_by_phone(role, phone).await? {
            if existing.id != id {
                return Err(AppError::Conflict(format!(
                    "{} already exists",
                    role.display_name()
                )));
            }
        }
    }

    let password_hash = password.as_deref().map(hash_password).transpose()?;
    let patch = PrincipalPatch {
        name,
        phone,
        password_hash,
        profile: None,
    };

    let principal = state
        .db
        .update_principal(role, id, store_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", role.display_name())))?;

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(principal.id),
        "principal_update",
        Some("principals"),
        Some(serde_json::json!({ "role": role.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        format!("{} updated successfully", role.display_name()),
        principal,
        Some(Meta::empty()),
    ))
}

pub async fn delete_directory_entry(
    state: &AppState,
    role: Role,
    id: Uuid,
    store_id: Option<Uuid>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let deleted = state.db.delete_principal(role, id, store_id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!(
            "{} not found",
            role.display_name()
        )));
    }

    if let Err(err) = log_audit(
        state.db.as_ref(),
        Some(id),
        "principal_delete",
        Some("principals"),
        Some(serde_json::json!({ "role": role.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        format!("{} deleted successfully", role.display_name()),
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
