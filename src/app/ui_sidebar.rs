use eframe::egui;

use super::state::GraviApp;
use crate::models::StreamData;

/// Shown for channels whose avatar lookup has not succeeded (yet). Never
/// written to the cache.
const PLACEHOLDER_AVATAR_URL: &str =
    "https://static-cdn.jtvnw.net/user-default-pictures-uv/ebe4cd89-b4f4-4cd9-adac-2f30151b4209-profile_image-70x70.png";

impl GraviApp {
    pub(crate) fn ui_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                let resp = ui.add(
                    egui::TextEdit::singleline(&mut self.channel_to_add)
                        .hint_text("e.g. shroud")
                        .desired_width(140.0),
                );
                let submitted =
                    resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Add").clicked() || submitted {
                    self.add_channel();
                }
            });

            if let Some(err) = self.poll_error.clone() {
                ui.add_space(4.0);
                ui.colored_label(ui.visuals().error_fg_color, err);
            }

            ui.add_space(4.0);
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                if !self.streams.is_empty() {
                    ui.label(egui::RichText::new("LIVE").small().strong());
                }
                for stream in self.streams.clone() {
                    self.ui_channel_row(ui, &stream.user_name, Some(&stream));
                }

                if !self.offlines.is_empty() {
                    ui.add_space(8.0);
                    ui.label(egui::RichText::new("OFFLINE").small().strong());
                }
                for name in self.offlines.clone() {
                    self.ui_channel_row(ui, &name, None);
                }
            });
        });
    }

    fn ui_channel_row(&mut self, ui: &mut egui::Ui, name: &str, live: Option<&StreamData>) {
        ui.horizontal(|ui| {
            let avatar = self
                .local
                .avatars
                .get(&name.to_lowercase())
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER_AVATAR_URL.to_string());
            ui.add(
                egui::Image::from_uri(avatar)
                    .fit_to_exact_size(egui::vec2(24.0, 24.0))
                    .rounding(egui::Rounding::same(12.0)),
            );

            let dot = if live.is_some() {
                egui::RichText::new("●").color(egui::Color32::GREEN)
            } else {
                egui::RichText::new("●").color(egui::Color32::GRAY)
            };
            ui.label(dot);

            let selected = self.selected.eq_ignore_ascii_case(name);
            let label = match live {
                Some(s) => format!("{} ({})", name, s.viewer_count),
                None => name.to_string(),
            };
            let mut resp = ui.selectable_label(selected, label);
            if let Some(s) = live {
                if !s.title.is_empty() {
                    resp = resp.on_hover_text(s.title.clone());
                }
            }
            if resp.clicked() {
                match live {
                    Some(s) => self.select_live(name, &s.title),
                    None => self.select_offline(name),
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Remove").clicked() {
                    self.remove_channel(name);
                }
            });
        });
    }
}
