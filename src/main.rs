mod api;
mod chat;
mod common;
mod config;
mod format;
mod network;
mod ui;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use api::StreamApi;
use chat::ChatSession;
use config::AppConfig;
use network::{NetworkHandle, NetworkSettings, P2PClient, parse_bootstrap_peers};
use ui::ChatApp;

#[derive(Parser)]
#[command(
    name = "live_chat_client",
    version,
    about = "Desktop chat client for live streams"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Open this stream's chat on start
    #[arg(long, value_name = "STREAM_ID")]
    stream: Option<String>,
    /// Name shown next to your messages
    #[arg(long)]
    name: Option<String>,
    /// Stream directory API base URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Run a relay node (no UI): follows every room and publishes viewer counts
    Server,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env();
    if let Some(name) = cli.name.clone() {
        app_config.display_name = name;
    }
    if let Some(url) = cli.api_url.clone() {
        app_config.api_base_url = url;
    }

    if cli.mode == Some(Mode::Server) {
        run_relay_node(&app_config).await;
        return Ok(());
    }

    run_full_client(app_config, cli.config, cli.stream)
}

fn network_settings(app_config: &AppConfig, relay_only: bool) -> NetworkSettings {
    NetworkSettings {
        bootstrap_peers: parse_bootstrap_peers(&app_config.bootstrap_nodes),
        listen_port: if relay_only { app_config.listen_port } else { 0 },
        reconnect_delay: app_config.reconnect_delay(),
        viewer_publish_interval: app_config.viewer_publish_interval(),
        relay_only,
    }
}

async fn run_relay_node(app_config: &AppConfig) {
    let (_cmd_tx, cmd_rx) = mpsc::channel(1);
    let (event_tx, _event_rx) = mpsc::channel(1);

    let client = P2PClient::new(event_tx, cmd_rx, network_settings(app_config, true));
    if let Err(err) = client.run().await {
        log::error!("Relay node terminated unexpectedly: {err}");
    }
}

fn run_full_client(
    app_config: AppConfig,
    config_path: String,
    initial_stream: Option<String>,
) -> Result<(), eframe::Error> {
    let runtime = Handle::current();

    let transport = NetworkHandle::new(runtime.clone(), network_settings(&app_config, false));
    let session = ChatSession::new(transport, app_config.throttle, app_config.display_name.clone())
        .with_max_messages(app_config.max_chat_messages);

    let api = match StreamApi::new(&app_config.api_base_url) {
        Ok(api) => Some(api),
        Err(err) => {
            log::error!("Stream directory unavailable: {err}");
            None
        }
    };

    log::info!(
        "Client started with {} bootstrap peers, API at {}",
        app_config.bootstrap_nodes.len(),
        app_config.api_base_url
    );

    let options = eframe::NativeOptions::default();
    let mut pending = Some((session, api));

    eframe::run_native(
        "Live Chat",
        options,
        Box::new(move |cc| {
            let (session, api) = pending
                .take()
                .expect("ChatApp should only be initialized once");

            Ok(Box::new(ChatApp::new(
                cc,
                session,
                api,
                runtime,
                config_path,
                initial_stream,
            )))
        }),
    )
}
