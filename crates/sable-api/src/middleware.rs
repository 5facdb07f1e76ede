use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::{AppState, normalize_wallet};
use crate::error::ApiError;

/// Optional header naming the caller's wallet, checked against the allow-list.
pub const WALLET_HEADER: &str = "x-wallet-address";

/// Caller identity attached to admin requests.
#[derive(Debug, Clone)]
pub struct AdminContext {
    /// Raw bearer token, forwarded to the backend on every call.
    pub token: String,
    pub wallet: Option<String>,
}

/// Admin gate: bearer token, optional wallet allow-list, then the backend's
/// own role check with the forwarded token.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Missing or invalid authorization header".into()))?
        .to_string();

    let wallet = req
        .headers()
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(normalize_wallet)
        .filter(|w| !w.is_empty());

    if state.admin_wallets.is_some() {
        let Some(w) = wallet.as_deref() else {
            return Err(ApiError::BadRequest(format!("Missing {WALLET_HEADER} header")));
        };
        if !state.wallet_allowed(w) {
            warn!("admin request from wallet {} outside allow-list", w);
            return Err(ApiError::Forbidden("Wallet is not allowed".into()));
        }
    }

    let is_admin: bool = state
        .backend
        .query("admin:isAdmin", json!({ "walletAddress": wallet }), Some(token.as_str()))
        .await?;
    if !is_admin {
        warn!("admin request denied for wallet {:?}", wallet);
        return Err(ApiError::Forbidden("Admin access required".into()));
    }

    debug!("admin request authorized for wallet {:?}", wallet);
    req.extensions_mut().insert(AdminContext { token, wallet });
    Ok(next.run(req).await)
}
