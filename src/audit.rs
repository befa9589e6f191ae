use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::db::{AuditEntry, Datastore};
use crate::error::AppResult;

pub async fn log_audit(
    db: &dyn Datastore,
    principal_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let entry = AuditEntry {
        id: Uuid::new_v4(),
        principal_id,
        action: action.to_owned(),
        resource: resource.map(str::to_owned),
        metadata,
        created_at: Utc::now(),
    };
    db.append_audit(entry).await
}
