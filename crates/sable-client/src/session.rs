use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use sable_types::api::StreamChatRequest;
use sable_types::models::ChatMessage;

use crate::error::ClientError;
use crate::reconcile::{PendingReply, Reconciled, merge_visible, reconcile};
use crate::transport::ChatTransport;

#[derive(Debug, Clone, Default)]
pub struct TurnOptions {
    pub model: Option<String>,
    pub use_reasoning: bool,
}

/// Emitted while a turn runs. `Failed` carries the message to toast.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Streaming { text: String },
    Reconciled { persisted_id: String },
    Failed { message: String },
}

/// Ephemeral client state for one chat.
///
/// Holds the draft, the latest backend snapshot and at most one pending
/// reply. Nothing here is durable.
#[derive(Debug, Clone)]
pub struct ChatSession {
    chat_id: String,
    wallet_address: String,
    draft: String,
    snapshot: Vec<ChatMessage>,
    pending: Option<PendingReply>,
}

impl ChatSession {
    pub fn new(chat_id: impl Into<String>, wallet_address: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            wallet_address: wallet_address.into(),
            draft: String::new(),
            snapshot: Vec::new(),
            pending: None,
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn take_draft(&mut self) -> String {
        std::mem::take(&mut self.draft)
    }

    pub fn request(&self, content: &str, options: &TurnOptions) -> StreamChatRequest {
        StreamChatRequest {
            chat_id: self.chat_id.clone(),
            wallet_address: self.wallet_address.clone(),
            content: content.to_string(),
            model: options.model.clone(),
            use_reasoning: options.use_reasoning.then_some(true),
        }
    }

    /// Records the request time and shows an empty assistant placeholder.
    pub fn begin(&mut self, now: DateTime<Utc>) {
        if self.pending.is_some() {
            debug!("chat {}: replacing placeholder of an earlier request", self.chat_id);
        }
        self.pending = Some(PendingReply::new(self.chat_id.clone(), now));
    }

    /// Replaces the placeholder text with the latest accumulated reply.
    /// Ignored once the placeholder has been reconciled away.
    pub fn apply(&mut self, text: &str) {
        if let Some(p) = self.pending.as_mut() {
            p.placeholder.content.clear();
            p.placeholder.content.push_str(text);
        }
    }

    /// Stores a snapshot and reconciles against it. Returns the id of the
    /// persisted reply if this snapshot cleared the placeholder.
    pub fn observe(&mut self, snapshot: Vec<ChatMessage>) -> Option<String> {
        let outcome = reconcile(self.pending.take(), &snapshot);
        self.snapshot = snapshot;
        match outcome {
            Reconciled::Cleared { persisted_id } => {
                debug!("chat {}: placeholder replaced by {}", self.chat_id, persisted_id);
                Some(persisted_id)
            }
            Reconciled::Pending(p) => {
                self.pending = Some(p);
                None
            }
            Reconciled::Idle => None,
        }
    }

    /// Marks the feed's latest value seen and reconciles against it.
    pub fn observe_latest(
        &mut self,
        snapshots: &mut watch::Receiver<Option<Vec<ChatMessage>>>,
    ) -> Option<String> {
        let latest = snapshots.borrow_and_update().clone();
        latest.and_then(|snapshot| self.observe(snapshot))
    }

    /// Keeps reconciling after the stream has ended, since the backend
    /// usually persists the reply only once streaming finishes.
    ///
    /// Returns `true` once no placeholder is left, `false` if the feed
    /// closed first. There is no timeout; drop the future to stop waiting.
    pub async fn settle(
        &mut self,
        snapshots: &mut watch::Receiver<Option<Vec<ChatMessage>>>,
        events: &mpsc::UnboundedSender<SessionEvent>,
    ) -> bool {
        while self.pending.is_some() {
            if snapshots.changed().await.is_err() {
                debug!("chat {}: snapshot feed closed with a reply pending", self.chat_id);
                return false;
            }
            if let Some(persisted_id) = self.observe_latest(snapshots) {
                let _ = events.send(SessionEvent::Reconciled { persisted_id });
            }
        }
        true
    }

    /// Drops the placeholder without waiting for the backend.
    pub fn abandon(&mut self) {
        self.pending = None;
    }

    pub fn pending(&self) -> Option<&PendingReply> {
        self.pending.as_ref()
    }

    pub fn snapshot(&self) -> &[ChatMessage] {
        &self.snapshot
    }

    pub fn visible(&self) -> Vec<ChatMessage> {
        merge_visible(&self.snapshot, self.pending.as_ref())
    }

    /// Sends `content` and streams the reply into the placeholder, folding in
    /// snapshot updates as they arrive. Returns the final streamed text.
    /// A reply persisted after the stream ends is picked up by [`settle`](Self::settle)
    /// or by calling [`observe_latest`](Self::observe_latest) on later updates.
    ///
    /// A rejected request clears the placeholder. An error mid-stream keeps
    /// the partial placeholder, since the backend may still persist the
    /// reply. Either way a `Failed` event is emitted and nothing is retried.
    pub async fn run_turn(
        &mut self,
        transport: &ChatTransport,
        content: &str,
        options: &TurnOptions,
        snapshots: &mut watch::Receiver<Option<Vec<ChatMessage>>>,
        events: &mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<String, ClientError> {
        let req = self.request(content, options);
        self.begin(Utc::now());

        let mut stream = match transport.stream_chat(&req).await {
            Ok(s) => s,
            Err(e) => {
                self.abandon();
                let _ = events.send(SessionEvent::Failed { message: e.to_string() });
                return Err(e);
            }
        };

        let mut last_text = String::new();
        let mut feed_open = true;

        loop {
            tokio::select! {
                item = stream.next() => match item {
                    Some(Ok(text)) => {
                        self.apply(&text);
                        let _ = events.send(SessionEvent::Streaming { text: text.clone() });
                        last_text = text;
                    }
                    Some(Err(e)) => {
                        warn!("chat {}: stream failed: {}", self.chat_id, e);
                        let _ = events.send(SessionEvent::Failed { message: e.to_string() });
                        return Err(e);
                    }
                    None => break,
                },
                changed = snapshots.changed(), if feed_open => {
                    if changed.is_err() {
                        feed_open = false;
                        continue;
                    }
                    if let Some(persisted_id) = self.observe_latest(snapshots) {
                        let _ = events.send(SessionEvent::Reconciled { persisted_id });
                    }
                }
            }
        }

        info!("chat {}: reply streamed ({} bytes)", self.chat_id, last_text.len());
        Ok(last_text)
    }
}
