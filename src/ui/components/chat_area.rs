use eframe::egui;

use crate::common::ChatMessage;
use crate::format::chat_time;

pub fn render<'a>(ui: &mut egui::Ui, messages: impl Iterator<Item = &'a ChatMessage>) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .max_height((ui.available_height() - 90.0).max(60.0))
        .show(ui, |ui| {
            for message in messages {
                ui.horizontal_wrapped(|ui| {
                    if let Some(badge) = message.badge {
                        ui.label(egui::RichText::new(badge.label()).small().strong());
                    }
                    ui.label(
                        egui::RichText::new(&message.user)
                            .strong()
                            .color(user_color(&message.color)),
                    );
                    ui.label(egui::RichText::new(chat_time(message.timestamp)).weak().small());
                    ui.label(&message.message);
                });
            }
        });
}

fn user_color(hex: &str) -> egui::Color32 {
    egui::Color32::from_hex(hex).unwrap_or(egui::Color32::WHITE)
}
