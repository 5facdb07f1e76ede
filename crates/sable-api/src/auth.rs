use std::collections::HashSet;
use std::sync::Arc;

use sable_client::BackendClient;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub backend: BackendClient,
    /// Wallets allowed to reach admin routes. `None` means no allow-list:
    /// the backend's own role check is the only gate.
    pub admin_wallets: Option<HashSet<String>>,
}

impl AppStateInner {
    pub fn new(backend: BackendClient, admin_wallets: Option<HashSet<String>>) -> Self {
        Self { backend, admin_wallets }
    }

    pub fn wallet_allowed(&self, wallet: &str) -> bool {
        match &self.admin_wallets {
            Some(list) => list.contains(&normalize_wallet(wallet)),
            None => true,
        }
    }
}

/// Hex (`0x…`) addresses compare case-insensitively; anything else (e.g.
/// base58) is case-sensitive and only trimmed.
pub fn normalize_wallet(addr: &str) -> String {
    let addr = addr.trim();
    if addr.len() > 2 && addr.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("0x")) {
        addr.to_ascii_lowercase()
    } else {
        addr.to_string()
    }
}

/// Parses a comma-separated allow-list. Blank input means no allow-list.
pub fn parse_wallet_list(raw: &str) -> Option<HashSet<String>> {
    let set: HashSet<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(normalize_wallet)
        .collect();
    (!set.is_empty()).then_some(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_wallet() {
        assert_eq!(normalize_wallet(" 0xAbC123 "), "0xabc123");
        assert_eq!(normalize_wallet("0XABC"), "0xabc");
        assert_eq!(normalize_wallet("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"), "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU");
    }

    #[test]
    fn test_parse_wallet_list() {
        assert!(parse_wallet_list("").is_none());
        assert!(parse_wallet_list(" , ,").is_none());

        let set = parse_wallet_list("0xAAA, SoLWallet1 ,").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("0xaaa"));
        assert!(set.contains("SoLWallet1"));
    }

    #[test]
    fn test_wallet_allowed() {
        let backend = BackendClient::new("http://127.0.0.1:1").unwrap();
        let open = AppStateInner::new(backend.clone(), None);
        assert!(open.wallet_allowed("anything"));

        let gated = AppStateInner::new(backend, parse_wallet_list("0xAAA"));
        assert!(gated.wallet_allowed("0xaaa"));
        assert!(gated.wallet_allowed("0XAAA"));
        assert!(!gated.wallet_allowed("0xbbb"));
    }
}
