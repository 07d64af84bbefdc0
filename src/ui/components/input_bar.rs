use eframe::egui;

pub const EMOJIS: [&str; 10] = ["😀", "😂", "❤️", "🔥", "👍", "🎮", "⚡", "💎", "👑", "🏆"];

#[derive(Default)]
pub struct InputActions {
    /// Text the user asked to send; the caller clears the input on success.
    pub send: Option<String>,
    pub changed: bool,
}

/// `can_send` comes from the chat session and gates both the button and Enter.
pub fn render(
    ui: &mut egui::Ui,
    input_text: &mut String,
    show_emojis: &mut bool,
    placeholder: &str,
    can_send: bool,
) -> InputActions {
    let mut actions = InputActions::default();

    if *show_emojis {
        ui.horizontal_wrapped(|ui| {
            for emoji in EMOJIS {
                if ui.button(emoji).clicked() {
                    input_text.push_str(emoji);
                    actions.changed = true;
                }
            }
        });
    }

    ui.horizontal(|ui| {
        if ui.button("☺").on_hover_text("Emojis").clicked() {
            *show_emojis = !*show_emojis;
        }

        let response = ui.add(
            egui::TextEdit::singleline(input_text)
                .hint_text(placeholder)
                .desired_width(ui.available_width() - 60.0),
        );
        if response.changed() {
            actions.changed = true;
        }

        let clicked = ui.add_enabled(can_send, egui::Button::new("Send")).clicked();
        let submitted =
            response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        if clicked || (submitted && can_send) {
            actions.send = Some(input_text.clone());
            response.request_focus();
        }
    });

    actions
}
