use std::time::Duration;

use eframe::egui;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::api::StreamApi;
use crate::chat::{ChatSession, ConnectionState};
use crate::common::{Category, Stream};
use crate::config::persist_bootstrap_node;
use crate::format::{format_duration, format_viewer_count, now_millis};
use crate::network::{NetworkHandle, parse_bootstrap_peers};

use super::components::{
    chat_area, debug_panel, input_bar,
    sidebar::{self, SidebarActions},
    warning_banner,
};
use super::state::AppState;

const IDLE_REPAINT: Duration = Duration::from_millis(250);

/// Results of background REST calls.
pub enum ApiEvent {
    StreamsLoaded(Vec<Stream>),
    StreamLoaded(Stream),
    CategoriesLoaded(Vec<Category>),
    Health(bool),
}

pub struct ChatApp {
    state: AppState,
    session: ChatSession<NetworkHandle>,
    api: Option<StreamApi>,
    runtime: Handle,
    api_sender: mpsc::Sender<ApiEvent>,
    api_receiver: mpsc::Receiver<ApiEvent>,
    config_path: String,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        session: ChatSession<NetworkHandle>,
        api: Option<StreamApi>,
        runtime: Handle,
        config_path: String,
        initial_stream: Option<String>,
    ) -> Self {
        let (api_sender, api_receiver) = mpsc::channel(16);
        let mut app = Self {
            state: AppState::new(),
            session,
            api,
            runtime,
            api_sender,
            api_receiver,
            config_path,
        };

        app.check_backend();
        app.refresh_streams();
        if let Some(stream_id) = initial_stream {
            app.open_stream_by_id(&stream_id);
        }
        app
    }

    fn handle_network_events(&mut self) {
        for event in self.session.poll_events() {
            self.state.observe(&event);
        }
    }

    fn handle_api_events(&mut self) {
        while let Ok(event) = self.api_receiver.try_recv() {
            match event {
                ApiEvent::StreamsLoaded(streams) => {
                    self.state.streams = streams;
                    self.state.streams_loading = false;
                }
                ApiEvent::StreamLoaded(stream) => {
                    if self.session.stream_id() == Some(stream.id.as_str()) {
                        self.state.current_stream = Some(stream);
                    }
                }
                ApiEvent::CategoriesLoaded(categories) => {
                    self.state.categories = categories;
                }
                ApiEvent::Health(reachable) => {
                    let message = if reachable {
                        "Stream directory reachable"
                    } else {
                        "Stream directory not reachable"
                    };
                    self.state.add_debug_event("API", None, message.to_string());
                }
            }
        }
    }

    fn check_backend(&self) {
        let Some(api) = self.api.clone() else {
            return;
        };
        let sender = self.api_sender.clone();
        self.runtime.spawn(async move {
            let reachable = api.check_health().await;
            let _ = sender.send(ApiEvent::Health(reachable)).await;
        });
    }

    fn refresh_streams(&mut self) {
        let Some(api) = self.api.clone() else {
            return;
        };
        self.state.streams_loading = true;
        let sender = self.api_sender.clone();
        self.runtime.spawn(async move {
            let streams = api.get_live_streams().await;
            if sender.send(ApiEvent::StreamsLoaded(streams)).await.is_err() {
                log::debug!("UI closed before streams arrived");
                return;
            }
            let categories = api.get_categories().await;
            let _ = sender.send(ApiEvent::CategoriesLoaded(categories)).await;
        });
    }

    fn open_stream(&mut self, stream: Stream) {
        self.session.mount(&stream.id);
        self.state.current_stream = Some(stream);
        self.state.input_text.clear();
        self.state.show_emojis = false;
    }

    fn open_stream_by_id(&mut self, stream_id: &str) {
        self.session.mount(stream_id);
        self.state.current_stream = None;

        let Some(api) = self.api.clone() else {
            return;
        };
        let sender = self.api_sender.clone();
        let stream_id = stream_id.to_string();
        self.runtime.spawn(async move {
            if let Some(stream) = api.get_stream_by_id(&stream_id).await {
                let _ = sender.send(ApiEvent::StreamLoaded(stream)).await;
            }
        });
    }

    fn connect_to_peer(&mut self, address: String) {
        self.session.transport_mut().connect_to_peer(address.clone());
        if !parse_bootstrap_peers(std::slice::from_ref(&address)).is_empty() {
            persist_bootstrap_node(&self.config_path, &address);
        }
    }

    /// Closes the chat view and drops the transport.
    fn leave_stream(&mut self) {
        self.session.unmount();
        self.state.current_stream = None;
        self.state.input_text.clear();
        self.state.show_emojis = false;
        self.state
            .add_debug_event("LEFT", None, "Chat view closed".to_string());
    }

    fn send(&mut self, text: String) {
        if self.session.attempt_send(&text, now_millis()).is_accepted() {
            self.state.input_text.clear();
        }
    }

    /// Returns true when the leave control was clicked.
    fn render_header(&self, ui: &mut egui::Ui) -> bool {
        let mut leave = false;
        ui.horizontal(|ui| {
            let dot = match self.session.connection() {
                ConnectionState::Connected => egui::Color32::GREEN,
                ConnectionState::Connecting => egui::Color32::YELLOW,
                ConnectionState::Disconnected => egui::Color32::GRAY,
            };
            ui.colored_label(dot, "●");

            let title = match (&self.state.current_stream, self.session.stream_id()) {
                (Some(stream), _) => stream.title.clone(),
                (None, Some(stream_id)) => format!("Stream {stream_id}"),
                (None, None) => "Chat".to_string(),
            };
            ui.heading(title);

            if let Some(count) = self.session.viewer_count() {
                ui.label(format!("👁 {}", format_viewer_count(count)));
            }

            let uptime = self
                .state
                .current_stream
                .as_ref()
                .and_then(|stream| stream.started_at.as_deref())
                .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok());
            if let Some(started) = uptime {
                let seconds = chrono::Utc::now()
                    .signed_duration_since(started)
                    .num_seconds()
                    .max(0) as u64;
                ui.label(format!("⏱ {}", format_duration(seconds)));
            }

            if self.session.stream_id().is_some() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Leave").on_hover_text("Close this chat").clicked() {
                        leave = true;
                    }
                });
            }
        });
        leave
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();
        self.handle_api_events();

        let now = now_millis();
        self.session.tick(now);

        let mut sidebar_actions = SidebarActions::default();
        egui::SidePanel::left("stream_sidebar")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                sidebar_actions = sidebar::render(ui, &mut self.state, self.session.stream_id());
            });

        egui::SidePanel::right("debug_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                debug_panel::render(ui, &self.state, self.session.connection());
            });

        let mut input_actions = input_bar::InputActions::default();
        let mut dismissed = false;
        let mut leave = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            leave = self.render_header(ui);
            ui.separator();

            if self.session.stream_id().is_none() {
                ui.label("Pick a live stream to open its chat.");
                return;
            }

            chat_area::render(ui, self.session.messages());

            if let Some(warning) = self.session.warning() {
                dismissed = warning_banner::render(ui, warning);
            }

            ui.separator();
            let can_send = self.session.can_send(&self.state.input_text);
            let placeholder = self.session.input_placeholder();
            input_actions = input_bar::render(
                ui,
                &mut self.state.input_text,
                &mut self.state.show_emojis,
                &placeholder,
                can_send,
            );
        });

        if dismissed {
            self.session.dismiss_warning();
        }
        if input_actions.changed {
            self.session.on_input_changed(&self.state.input_text);
        }
        if let Some(text) = input_actions.send {
            self.send(text);
        }
        if leave {
            self.leave_stream();
        }
        if sidebar_actions.refresh {
            self.refresh_streams();
        }
        if let Some(stream) = sidebar_actions.join_stream {
            self.open_stream(stream);
        }
        if let Some(address) = sidebar_actions.connect_address {
            self.connect_to_peer(address);
        }

        let repaint_in = self
            .session
            .next_tick_deadline()
            .map(|deadline| Duration::from_millis(deadline.saturating_sub(now)))
            .map_or(IDLE_REPAINT, |until_tick| until_tick.min(IDLE_REPAINT));
        ctx.request_repaint_after(repaint_in);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.session.unmount();
        log::info!("Chat window closed");
    }
}
