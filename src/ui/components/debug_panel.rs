use eframe::egui;

use crate::chat::ConnectionState;
use crate::ui::state::AppState;

pub fn render(ui: &mut egui::Ui, state: &AppState, connection: ConnectionState) {
    ui.heading("Debug Info");
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Transport:");
        let (color, text) = match connection {
            ConnectionState::Connected => (egui::Color32::GREEN, "connected"),
            ConnectionState::Connecting => (egui::Color32::YELLOW, "connecting"),
            ConnectionState::Disconnected => (egui::Color32::RED, "disconnected"),
        };
        ui.colored_label(color, text);
    });

    ui.horizontal(|ui| {
        ui.label("Active Peers:");
        ui.label(format!("{}", state.peers.len()));
    });

    ui.separator();

    for peer_id in &state.peers {
        ui.horizontal(|ui| {
            ui.label(format!("✓ {}", short_id(peer_id)));
            if let Some(last_seen) = state.peer_last_seen.get(peer_id) {
                let elapsed = chrono::Utc::now().signed_duration_since(*last_seen);
                ui.label(format!(
                    "since {:.0}s",
                    elapsed.num_milliseconds() as f64 / 1000.0
                ));
            }
        });
    }

    ui.separator();

    ui.label("Recent Events:");
    egui::ScrollArea::vertical()
        .max_height(200.0)
        .show(ui, |ui| {
            for event in state.debug_events.iter().rev().take(20) {
                let color = match event.event_type.as_str() {
                    "PEER_CONNECTED" | "CONNECTED" => egui::Color32::GREEN,
                    "PEER_DISCONNECTED" | "DISCONNECTED" => egui::Color32::RED,
                    _ => egui::Color32::WHITE,
                };

                ui.horizontal(|ui| {
                    ui.colored_label(color, format!("[{}]", event.timestamp.format("%H:%M:%S")));
                    if let Some(peer_id) = &event.peer_id {
                        ui.monospace(short_id(peer_id));
                    }
                    ui.label(&event.message);
                });
            }
        });
}

fn short_id(peer_id: &str) -> &str {
    peer_id.get(..8).unwrap_or(peer_id)
}
