use eframe::egui;

use super::state::GraviApp;

impl GraviApp {
    pub(crate) fn ui_header_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let collapse_label = if self.sidebar_collapsed { "»" } else { "«" };
                if ui
                    .button(collapse_label)
                    .on_hover_text("Toggle channel list")
                    .clicked()
                {
                    self.sidebar_collapsed = !self.sidebar_collapsed;
                }

                ui.heading("GraviTV");
                ui.separator();

                // Stream status indicator
                let (dot, text) = if self.poll_error.is_some() {
                    (
                        egui::RichText::new("●").color(egui::Color32::RED),
                        "Streams: unavailable",
                    )
                } else if self.streams.is_empty() && self.offlines.is_empty() {
                    (
                        egui::RichText::new("●").color(egui::Color32::GRAY),
                        "Streams: checking…",
                    )
                } else {
                    (
                        egui::RichText::new("●").color(egui::Color32::GREEN),
                        "Streams: up to date",
                    )
                };
                ui.label(dot);
                let label = ui.label(text);
                if let Some(err) = self.poll_error.as_deref() {
                    label.on_hover_text(err.to_string());
                }

                // Right side actions
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let theme_label = if self.local.dark_mode {
                        "Light mode"
                    } else {
                        "Dark mode"
                    };
                    if ui.button(theme_label).clicked() {
                        self.local.dark_mode = !self.local.dark_mode;
                        self.save_local();
                        super::apply_theme(ctx, self.local.dark_mode);
                    }

                    if ui.button("Refresh").clicked() {
                        self.force_poll();
                    }
                });
            });
        });
    }
}
