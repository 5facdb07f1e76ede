mod render;

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use sable_client::milestones::MilestoneWatcher;
use sable_client::{BackendClient, ChatSession, ChatTransport, TurnOptions};
use sable_types::models::{ChatMessage, SubscriptionStatus};

#[derive(Debug, Parser)]
#[command(name = "sable-chat", version, about = "Chat with a Sable assistant from the terminal")]
struct Cli {
    /// Managed backend deployment (query/mutation endpoints).
    #[arg(long, env = "SABLE_BACKEND_URL")]
    backend_url: String,

    /// Host serving `/stream-chat`; defaults to the backend URL.
    #[arg(long, env = "SABLE_SITE_URL")]
    site_url: Option<String>,

    #[arg(long)]
    chat_id: String,

    #[arg(long, env = "SABLE_WALLET")]
    wallet: String,

    /// Bearer token forwarded to the backend.
    #[arg(long, env = "SABLE_AUTH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    reasoning: bool,

    /// How often to refresh the message list, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    poll_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // stdout carries the conversation; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sable_chat=info,sable_client=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let backend = BackendClient::new(&cli.backend_url).context("invalid --backend-url")?;
    let site_url = cli.site_url.as_deref().unwrap_or(&cli.backend_url);
    let mut transport = ChatTransport::new(site_url).context("invalid --site-url")?;
    if let Some(token) = &cli.token {
        transport = transport.with_auth_token(token.clone());
    }

    let mut snapshots = backend.watch_query::<Vec<ChatMessage>>(
        "messages:list",
        json!({ "chatId": cli.chat_id }),
        cli.token.clone(),
        Duration::from_millis(cli.poll_ms.max(100)),
    );

    let options = TurnOptions {
        model: cli.model.clone(),
        use_reasoning: cli.reasoning,
    };
    let mut session = ChatSession::new(cli.chat_id.clone(), cli.wallet.clone());
    let mut milestones = MilestoneWatcher::new();

    info!("chat {} as {} via {}", cli.chat_id, cli.wallet, transport.endpoint());
    eprintln!("Type a message and press Enter. /reset-usage re-arms usage notices, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut feed_open = true;
    loop {
        // The backend usually persists a reply after its stream ends, so
        // snapshots keep being reconciled between turns.
        let line = tokio::select! {
            line = lines.next_line() => line?,
            changed = snapshots.changed(), if feed_open => {
                if changed.is_err() {
                    warn!("message feed closed");
                    feed_open = false;
                } else if let Some(persisted_id) = session.observe_latest(&mut snapshots) {
                    info!("reply persisted as {}", persisted_id);
                }
                continue;
            }
        };
        let Some(line) = line else { break };

        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/reset-usage" => {
                milestones.reset();
                eprintln!("[usage] notices re-armed");
                continue;
            }
            text => session.set_draft(text),
        }
        let content = session.take_draft();

        let (tx, rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(render::print_turn(rx));
        let result = session
            .run_turn(&transport, &content, &options, &mut snapshots, &tx)
            .await;
        drop(tx);
        let _ = printer.await;
        println!();
        let _ = std::io::stdout().flush();

        // Failures were already shown; the user retries by sending again.
        if result.is_err() {
            continue;
        }

        match backend
            .query::<SubscriptionStatus>(
                "subscriptions:status",
                json!({ "walletAddress": cli.wallet }),
                cli.token.as_deref(),
            )
            .await
        {
            Ok(status) => {
                for notice in milestones.observe(&status) {
                    eprintln!("[usage] {}", notice.message());
                }
            }
            Err(e) => warn!("could not load subscription status: {}", e),
        }
    }

    Ok(())
}
