use std::collections::HashSet;
use std::net::SocketAddr;

use anyhow::{Context, Result};

use sable_api::auth::parse_wallet_list;

pub struct Config {
    pub backend_url: String,
    pub addr: SocketAddr,
    pub admin_wallets: Option<HashSet<String>>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend_url = get("SABLE_BACKEND_URL")
            .filter(|v| !v.trim().is_empty())
            .context("SABLE_BACKEND_URL must point at the managed backend deployment")?;
        let host = get("SABLE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = get("SABLE_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("SABLE_PORT is not a valid port")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;
        let admin_wallets = get("SABLE_ADMIN_WALLETS").and_then(|raw| parse_wallet_list(&raw));

        Ok(Self {
            backend_url,
            addr,
            admin_wallets,
        })
    }
}
