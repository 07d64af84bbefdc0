use eframe::egui;

const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(250, 204, 21);

/// Returns true when the user dismissed the warning.
pub fn render(ui: &mut egui::Ui, warning: &str) -> bool {
    let mut dismissed = false;
    egui::Frame::new()
        .fill(egui::Color32::from_rgba_unmultiplied(234, 179, 8, 25))
        .inner_margin(egui::Margin::symmetric(8, 4))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(WARNING_COLOR, warning);
                if ui.small_button("✕").clicked() {
                    dismissed = true;
                }
            });
        });
    dismissed
}
