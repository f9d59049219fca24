use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use order_stream::client::DEFAULT_BASE_URL;
use order_stream::csv::write_orders;
use order_stream::replay::read_events;
use order_stream::session::{CustomerSession, SessionStore};
use order_stream::{ApiClient, ClientConfig, OrderBoard, StoreSlug, StreamConnector};

const HISTORY_PAGE_SIZE: u32 = 20;

/// Follow a store's orders in real time.
#[derive(Debug, Parser)]
#[command(name = "order-stream", version)]
struct Cli {
    /// Backend base URL, including the API prefix
    #[arg(long, env = "ORDER_STREAM_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Timeout for REST calls, in seconds
    #[arg(long, env = "ORDER_STREAM_TIMEOUT", default_value_t = 30, global = true)]
    timeout: u64,

    /// Timeout for establishing connections, in seconds
    #[arg(long, default_value_t = 10, global = true)]
    connect_timeout: u64,

    /// Directory holding the customer session
    #[arg(long, env = "ORDER_STREAM_DATA_DIR", default_value = ".", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply a recorded event stream and print the resulting board as csv
    Replay { file: PathBuf },

    /// Follow a store's live order stream ('r' + enter reconnects, 'q' quits)
    Watch {
        store: StoreSlug,

        /// Number of past orders to load before following the stream
        #[arg(long, default_value_t = 50)]
        history: usize,
    },

    /// Show, set or clear the stored customer session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Debug, Subcommand)]
enum SessionAction {
    Show,
    Set {
        #[arg(long)]
        id: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        name: String,
    },
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(cli.base_url)
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout));

    let result = match cli.command {
        Command::Replay { file } => replay(file).await,
        Command::Watch { store, history } => watch(config, store, history).await,
        Command::Session { action } => session(SessionStore::new(cli.data_dir), action),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn replay(file: PathBuf) -> anyhow::Result<()> {
    let events = read_events(file)?;
    let mut board = OrderBoard::new();
    let (event_sender, event_receiver) = mpsc::channel(16);

    let producer = tokio::spawn(async move {
        for result in events {
            match result {
                Ok(event) => {
                    if event_sender.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    board.run(ReceiverStream::new(event_receiver)).await;
    producer.await?;

    write_orders(io::stdout().lock(), board.orders())?;
    Ok(())
}

async fn watch(config: ClientConfig, store: StoreSlug, history: usize) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let mut board = OrderBoard::new();

    if history > 0 {
        match client
            .fetch_history(&store, HISTORY_PAGE_SIZE, history)
            .await
        {
            Ok(orders) => {
                board.seed(orders);
            }
            Err(e) => warn!(store = %store, error = %e, "order history unavailable"),
        }
    }

    let (event_sender, mut event_receiver) = mpsc::channel(64);
    let mut connector = StreamConnector::connect(Arc::new(client), store, event_sender);
    let mut state = connector.state();
    let mut commands = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = event_receiver.recv() => {
                if let Ok(change) = board.apply(event) {
                    println!("{change}");
                }
            }
            Ok(()) = state.changed() => {
                println!("# {}", *state.borrow_and_update());
            }
            line = commands.next_line(), if stdin_open => match line {
                Ok(Some(command)) => match command.trim() {
                    "r" | "reconnect" => connector.reconnect().await,
                    "q" | "quit" => break,
                    "" => {}
                    other => warn!(command = other, "unknown command, use 'r' or 'q'"),
                },
                Ok(None) | Err(_) => stdin_open = false,
            },
            _ = &mut shutdown => break,
        }
    }

    connector.close().await;
    write_orders(io::stdout().lock(), board.orders())?;
    Ok(())
}

fn session(store: SessionStore, action: SessionAction) -> anyhow::Result<()> {
    match action {
        SessionAction::Show => match store.load() {
            Some(session) => println!("{}", serde_json::to_string_pretty(&session)?),
            None => println!("no session"),
        },
        SessionAction::Set { id, phone, name } => {
            store.save(&CustomerSession { id, phone, name })?;
        }
        SessionAction::Clear => store.clear()?,
    }
    Ok(())
}
