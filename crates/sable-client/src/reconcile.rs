use chrono::{DateTime, Utc};
use uuid::Uuid;

use sable_types::models::{ChatMessage, Role};

/// A reply that is streaming in but has not been seen in a backend snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    pub placeholder: ChatMessage,
    pub requested_at: DateTime<Utc>,
}

impl PendingReply {
    /// Empty assistant placeholder for a request sent at `requested_at`.
    pub fn new(chat_id: impl Into<String>, requested_at: DateTime<Utc>) -> Self {
        Self {
            placeholder: ChatMessage {
                id: format!("streaming-{}", Uuid::new_v4()),
                chat_id: chat_id.into(),
                role: Role::Assistant,
                content: String::new(),
                created_at: requested_at,
                model: None,
            },
            requested_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// Nothing was pending.
    Idle,
    /// Still waiting for the persisted reply.
    Pending(PendingReply),
    /// The persisted reply arrived; the placeholder is gone.
    Cleared { persisted_id: String },
}

impl Reconciled {
    pub fn into_pending(self) -> Option<PendingReply> {
        match self {
            Self::Pending(p) => Some(p),
            _ => None,
        }
    }
}

/// Drops the placeholder once the snapshot holds an assistant message
/// created at or after the request time.
///
/// No timeout: if the backend never persists a reply the placeholder stays.
pub fn reconcile(pending: Option<PendingReply>, snapshot: &[ChatMessage]) -> Reconciled {
    let Some(pending) = pending else {
        return Reconciled::Idle;
    };

    match snapshot
        .iter()
        .find(|m| m.role == Role::Assistant && m.created_at >= pending.requested_at)
    {
        Some(persisted) => Reconciled::Cleared {
            persisted_id: persisted.id.clone(),
        },
        None => Reconciled::Pending(pending),
    }
}

/// Messages to render: the snapshot, then the placeholder if one is pending.
pub fn merge_visible(snapshot: &[ChatMessage], pending: Option<&PendingReply>) -> Vec<ChatMessage> {
    let mut out = snapshot.to_vec();
    if let Some(p) = pending {
        out.push(p.placeholder.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn msg(id: &str, role: Role, at: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id: id.into(),
            chat_id: "c1".into(),
            role,
            content: format!("{id} body"),
            created_at: at,
            model: None,
        }
    }

    #[test]
    fn test_nothing_pending() {
        let now = Utc::now();
        assert_eq!(reconcile(None, &[msg("a", Role::Assistant, now)]), Reconciled::Idle);
    }

    #[test]
    fn test_older_assistant_does_not_clear() {
        let t0 = Utc::now();
        let pending = PendingReply::new("c1", t0);
        let snapshot = vec![
            msg("old", Role::Assistant, t0 - Duration::seconds(5)),
            msg("q", Role::User, t0 + Duration::milliseconds(1)),
        ];
        let out = reconcile(Some(pending.clone()), &snapshot);
        assert_eq!(out, Reconciled::Pending(pending));
    }

    #[test]
    fn test_equal_timestamp_clears() {
        let t0 = Utc::now();
        let pending = PendingReply::new("c1", t0);
        let out = reconcile(Some(pending), &[msg("r", Role::Assistant, t0)]);
        assert_eq!(out, Reconciled::Cleared { persisted_id: "r".into() });
    }

    #[test]
    fn test_cleared_never_reappears() {
        let t0 = Utc::now();
        let snapshot = vec![msg("r", Role::Assistant, t0 + Duration::seconds(1))];

        let first = reconcile(Some(PendingReply::new("c1", t0)), &snapshot);
        assert!(matches!(first, Reconciled::Cleared { .. }));

        // Later snapshots for the same request find nothing to restore.
        let pending = first.into_pending();
        assert!(pending.is_none());
        assert_eq!(reconcile(pending, &snapshot), Reconciled::Idle);
        assert_eq!(reconcile(None, &[]), Reconciled::Idle);
    }

    #[test]
    fn test_merge_visible_appends_placeholder() {
        let t0 = Utc::now();
        let mut pending = PendingReply::new("c1", t0);
        pending.placeholder.content = "typing".into();
        let snapshot = vec![msg("q", Role::User, t0)];

        let visible = merge_visible(&snapshot, Some(&pending));
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[1].content, "typing");
        assert!(visible[1].id.starts_with("streaming-"));

        assert_eq!(merge_visible(&snapshot, None), snapshot);
    }
}
