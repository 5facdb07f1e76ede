use std::io::Write;

use tokio::sync::mpsc;

use sable_client::SessionEvent;

/// Turns accumulated snapshots back into the suffix not yet printed.
#[derive(Debug, Default)]
pub struct DeltaPrinter {
    printed: String,
}

impl DeltaPrinter {
    /// Returns the new tail of `text`. If `text` no longer extends what was
    /// printed, the whole text is returned.
    pub fn delta<'a>(&mut self, text: &'a str) -> &'a str {
        let tail = match text.strip_prefix(self.printed.as_str()) {
            Some(tail) => tail,
            None => text,
        };
        self.printed.clear();
        self.printed.push_str(text);
        tail
    }
}

/// Prints one turn's events until the sender is dropped.
pub async fn print_turn(mut events: mpsc::UnboundedReceiver<SessionEvent>) {
    let mut printer = DeltaPrinter::default();
    let mut stdout = std::io::stdout();

    while let Some(ev) = events.recv().await {
        match ev {
            SessionEvent::Streaming { text } => {
                let _ = stdout.write_all(printer.delta(&text).as_bytes());
                let _ = stdout.flush();
            }
            SessionEvent::Reconciled { persisted_id } => {
                tracing::debug!("reply persisted as {}", persisted_id);
            }
            SessionEvent::Failed { message } => {
                eprintln!("\n[error] {}", message);
            }
        }
    }
}
