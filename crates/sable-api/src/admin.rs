use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    response::IntoResponse,
};
use serde_json::{Value, json};
use tracing::info;

use sable_types::admin::{
    AdminVerifyResponse, AuditEntry, AuditQuery, Flag, ResolveFlagRequest, SetRoleRequest,
};

use crate::auth::{AppState, normalize_wallet};
use crate::error::ApiError;
use crate::middleware::AdminContext;

const MAX_AUDIT_LIMIT: u32 = 200;

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// GET /api/admin/verify — reaching here means the admin gate passed.
pub async fn verify(Extension(ctx): Extension<AdminContext>) -> impl IntoResponse {
    Json(AdminVerifyResponse {
        is_admin: true,
        wallet_address: ctx.wallet,
    })
}

/// GET /api/admin/flags
pub async fn list_flags(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
) -> Result<Json<Vec<Flag>>, ApiError> {
    let flags: Vec<Flag> = state
        .backend
        .query("admin:listFlags", json!({}), Some(ctx.token.as_str()))
        .await?;
    Ok(Json(flags))
}

/// POST /api/admin/flags/{flag_id}/resolve — body `{"action": "dismiss" | "remove"}`.
pub async fn resolve_flag(
    State(state): State<AppState>,
    Path(flag_id): Path<String>,
    Extension(ctx): Extension<AdminContext>,
    payload: Result<Json<ResolveFlagRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    state
        .backend
        .mutation::<Value>(
            "admin:resolveFlag",
            json!({ "flagId": flag_id, "action": req.action }),
            Some(ctx.token.as_str()),
        )
        .await?;

    info!("flag {} resolved ({:?}) by {:?}", flag_id, req.action, ctx.wallet);
    Ok(success())
}

/// DELETE /api/admin/posts/{post_id}
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(ctx): Extension<AdminContext>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .backend
        .mutation::<Value>("admin:deletePost", json!({ "postId": post_id }), Some(ctx.token.as_str()))
        .await?;

    info!("post {} deleted by {:?}", post_id, ctx.wallet);
    Ok(success())
}

/// PUT /api/admin/users/{wallet}/role — body `{"role": "admin" | "moderator" | "user"}`.
pub async fn set_role(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
    Extension(ctx): Extension<AdminContext>,
    payload: Result<Json<SetRoleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let target = normalize_wallet(&wallet);
    if target.is_empty() {
        return Err(ApiError::BadRequest("Wallet address is required".into()));
    }

    state
        .backend
        .mutation::<Value>(
            "admin:setRole",
            json!({ "walletAddress": target, "role": req.role }),
            Some(ctx.token.as_str()),
        )
        .await?;

    info!("role of {} set to {:?} by {:?}", target, req.role, ctx.wallet);
    Ok(success())
}

/// GET /api/admin/audit-log?limit=N — newest first, limit clamped to 200.
pub async fn audit_log(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let Query(query) = query?;
    let limit = query.limit.clamp(1, MAX_AUDIT_LIMIT);

    let entries: Vec<AuditEntry> = state
        .backend
        .query("admin:auditLog", json!({ "limit": limit }), Some(ctx.token.as_str()))
        .await?;
    Ok(Json(entries))
}
