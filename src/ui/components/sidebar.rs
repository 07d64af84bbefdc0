use eframe::egui;

use crate::common::Stream;
use crate::format::{format_relative_str, format_viewer_count};
use crate::ui::state::AppState;

#[derive(Default)]
pub struct SidebarActions {
    pub join_stream: Option<Stream>,
    pub refresh: bool,
    pub connect_address: Option<String>,
}

pub fn render(ui: &mut egui::Ui, state: &mut AppState, current: Option<&str>) -> SidebarActions {
    let mut actions = SidebarActions::default();

    ui.horizontal(|ui| {
        ui.heading("Live");
        if ui
            .add_enabled(!state.streams_loading, egui::Button::new("⟳"))
            .on_hover_text("Refresh")
            .clicked()
        {
            actions.refresh = true;
        }
    });
    if !state.categories.is_empty() {
        let selected_text = state
            .category_filter
            .clone()
            .unwrap_or_else(|| "All categories".to_string());
        egui::ComboBox::from_id_salt("category_filter")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut state.category_filter, None, "All categories");
                for category in &state.categories {
                    ui.selectable_value(
                        &mut state.category_filter,
                        Some(category.name.clone()),
                        category.name.as_str(),
                    );
                }
            });
    }
    ui.separator();

    if state.streams_loading {
        ui.spinner();
    } else if state.streams.is_empty() {
        ui.label("No live streams");
    }

    egui::ScrollArea::vertical()
        .max_height((ui.available_height() - 120.0).max(60.0))
        .show(ui, |ui| {
            let now = chrono::Utc::now();
            for stream in state.visible_streams() {
                let selected = current == Some(stream.id.as_str());
                let owner = stream
                    .user
                    .as_ref()
                    .map(|user| user.username.as_str())
                    .unwrap_or("unknown");
                let since = stream
                    .started_at
                    .as_deref()
                    .map(|raw| format_relative_str(raw, now))
                    .unwrap_or_else(|| "unknown".to_string());
                let label = format!(
                    "{}\n{} · {} · {} viewers · {}",
                    stream.title,
                    owner,
                    stream.category,
                    format_viewer_count(stream.viewer_count),
                    since
                );
                if ui.selectable_label(selected, label).clicked() && !selected {
                    actions.join_stream = Some(stream.clone());
                }
            }
        });

    ui.separator();
    ui.label("Connect to peer");
    ui.text_edit_singleline(&mut state.peer_address_input);
    if ui.button("Connect").clicked() {
        let address = state.peer_address_input.trim().to_string();
        if !address.is_empty() {
            actions.connect_address = Some(address);
            state.peer_address_input.clear();
        }
    }

    actions
}
