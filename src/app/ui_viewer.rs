use eframe::egui;

use super::state::GraviApp;
use crate::preview;

impl GraviApp {
    pub(crate) fn ui_viewer(&mut self, ui: &mut egui::Ui) {
        if self.selected.is_empty() {
            ui.heading("GraviTV");
            ui.label("Add a channel in the sidebar to get started.");
            ui.add_space(8.0);
            ui.weak(self.status.clone());
            return;
        }

        let offline = self.selected_is_offline();
        if offline {
            ui.heading(format!("{} (Offline)", self.selected));
        } else {
            ui.heading(self.selected.clone());
        }

        if !self.stream_title.is_empty() {
            ui.label(self.stream_title.clone());
        }
        if let Some(row) = self
            .streams
            .iter()
            .find(|s| s.user_name.eq_ignore_ascii_case(&self.selected))
        {
            ui.label(format!("{} viewers", row.viewer_count));
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Open player").clicked() {
                let url = preview::player_url(&self.selected);
                match preview::open_preview(&url, &format!("GraviTV - {}", self.selected)) {
                    Ok(()) => self.status = "Opened player window.".to_string(),
                    Err(e) => self.status = format!("Player failed: {e:#}"),
                }
            }
            if ui.button("Open on Twitch").clicked() {
                let url = format!(
                    "https://www.twitch.tv/{}",
                    urlencoding::encode(&self.selected.to_lowercase())
                );
                match webbrowser::open(&url) {
                    Ok(_) => self.status = "Opened channel page.".to_string(),
                    Err(e) => self.status = format!("Open failed: {e}"),
                }
            }
        });

        ui.add_space(12.0);
        ui.weak(self.status.clone());
    }
}
