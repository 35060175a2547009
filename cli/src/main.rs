mod terminal;

use std::io::Stdout;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use client::config::{SyncConfig, parse_base_url};
use client::net::api::{HttpChatApi, MessagesApi, Session};
use client::net::types::{MessageId, OlderQuery, PollDraft};
use client::render::Renderer;
use client::{ChatComposer, ChatSyncEngine, ChatView, EngineOptions, OlderOutcome, SharedSink, SyncError};
use tracing::{debug, info};

use crate::terminal::{StderrNotifier, TerminalSink};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("failed to wait for ctrl-c: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "obsidian-chat", about = "ObsidianTime chat from the terminal")]
struct Cli {
    #[arg(long, env = "OBSIDIAN_BASE_URL")]
    base_url: Option<String>,

    /// Value of the portal's `sessionid` cookie.
    #[arg(long, env = "OBSIDIAN_SESSION_ID")]
    session_id: Option<String>,

    #[arg(long, env = "OBSIDIAN_CSRF_TOKEN")]
    csrf_token: Option<String>,

    /// Your portal username; your own messages are marked with `*`.
    #[arg(long, env = "CHAT_USERNAME")]
    username: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the latest messages, then follow new ones until Ctrl-C.
    Tail {
        /// Older pages to load before following.
        #[arg(long, default_value_t = 0)]
        history: u32,
    },
    /// Print the latest messages plus older pages, then exit.
    History {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    Send {
        content: String,
    },
    Poll {
        question: String,
        #[arg(long = "option", required = true)]
        options: Vec<String>,
        #[arg(long, default_value_t = false)]
        multiple: bool,
    },
    /// Toggle your vote on a poll option.
    Vote {
        poll_id: i64,
        option_id: i64,
    },
}

type Terminal = Arc<tokio::sync::Mutex<TerminalSink<Stdout>>>;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let session = Session { session_id: cli.session_id.clone(), csrf_token: cli.csrf_token.clone() };
    let api = Arc::new(HttpChatApi::new(&config, &session)?);

    match cli.command {
        Command::Tail { history } => run_tail(api, &config, history).await,
        Command::History { pages } => run_history(api, &config, pages).await,
        Command::Send { content } => run_send(api, &content).await,
        Command::Poll { question, options, multiple } => {
            let draft = PollDraft { question, multiple_choice: multiple, options };
            run_poll(api, &draft).await
        }
        Command::Vote { poll_id, option_id } => run_vote(api, poll_id, option_id).await,
    }
}

fn load_config(cli: &Cli) -> Result<SyncConfig, SyncError> {
    let mut config = SyncConfig::from_env()?;
    if let Some(raw) = cli.base_url.as_deref() {
        config.base_url = parse_base_url(Some(raw))?;
    }
    if let Some(name) = cli.username.as_deref().map(str::trim).filter(|name| !name.is_empty()) {
        config.username = Some(name.to_owned());
    }
    Ok(config)
}

// =============================================================================
// READING
// =============================================================================

async fn run_tail(api: Arc<HttpChatApi>, config: &SyncConfig, history: u32) -> Result<(), CliError> {
    let (engine, terminal) = open_session(api, config, history).await?;
    {
        let mut terminal = terminal.lock().await;
        terminal.print_all();
        terminal.go_live();
    }
    info!("following chat; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    engine.stop();
    Ok(())
}

async fn run_history(api: Arc<HttpChatApi>, config: &SyncConfig, pages: u32) -> Result<(), CliError> {
    let (engine, terminal) = open_session(api, config, pages).await?;
    engine.stop();
    terminal.lock().await.print_all();
    Ok(())
}

/// Seed the view with the newest page, start the engine from it, and load `pages` older pages.
async fn open_session(
    api: Arc<HttpChatApi>,
    config: &SyncConfig,
    pages: u32,
) -> Result<(ChatSyncEngine, Terminal), SyncError> {
    let terminal: Terminal = Arc::new(tokio::sync::Mutex::new(TerminalSink::new(std::io::stdout())));
    let sink: SharedSink = terminal.clone();
    let renderer = Renderer::new(config.username.clone());
    seed_latest(api.as_ref(), &sink, &renderer).await?;

    let engine = ChatSyncEngine::new(api, sink, Arc::new(StderrNotifier), EngineOptions::from(config));
    let cursor = engine.initial_cursor().await;
    engine.initialize(cursor).await;

    for _ in 0..pages {
        match engine.load_older().await {
            OlderOutcome::Merged { has_more: true, .. } => {}
            outcome => {
                debug!(?outcome, "history paging finished");
                break;
            }
        }
    }
    Ok((engine, terminal))
}

/// The portal renders the newest page server-side; fetching everything
/// below the largest id gives the same page. It goes through the same
/// prepend path the engine uses for older pages.
async fn seed_latest(api: &dyn MessagesApi, sink: &SharedSink, renderer: &Renderer) -> Result<(), SyncError> {
    let page = api.fetch_older(OlderQuery { page: 1, before: Some(MessageId::MAX) }).await?;
    let mut sink = sink.lock().await;
    let inserted = renderer.prepend_page(&mut *sink, &page.items);
    sink.scroll_to_bottom();
    debug!(inserted, "seeded view with latest page");
    Ok(())
}

// =============================================================================
// WRITING
// =============================================================================

fn composer(api: Arc<HttpChatApi>) -> ChatComposer {
    let sink: SharedSink = Arc::new(tokio::sync::Mutex::new(ChatView::default()));
    ChatComposer::new(api, sink, Arc::new(StderrNotifier))
}

async fn run_send(api: Arc<HttpChatApi>, content: &str) -> Result<(), CliError> {
    let response = composer(api).send_message(content).await?;
    if let Some(id) = response.message_id {
        println!("{id}");
    }
    Ok(())
}

async fn run_poll(api: Arc<HttpChatApi>, draft: &PollDraft) -> Result<(), CliError> {
    let response = composer(api).create_poll(draft).await?;
    if let Some(id) = response.poll_id {
        println!("{id}");
    }
    Ok(())
}

async fn run_vote(api: Arc<HttpChatApi>, poll_id: i64, option_id: i64) -> Result<(), CliError> {
    let tally = composer(api).vote(poll_id, option_id).await?;
    println!("{} votes", tally.total_votes);
    for option in &tally.options {
        let mark = if option.user_voted { "x" } else { " " };
        println!("[{mark}] {}: {} ({:.0}%)", option.id, option.vote_count, option.vote_percentage);
    }
    Ok(())
}
