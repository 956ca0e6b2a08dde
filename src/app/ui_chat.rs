use eframe::egui;

use super::{state::GraviApp, types::ChatPane};
use crate::chat::{split_links, ChatMessage, ChatOrigin, MessageSegment};
use crate::preview;

impl GraviApp {
    pub(crate) fn ui_chat_panel(&mut self, ctx: &egui::Context) {
        if self.selected.is_empty() {
            return;
        }

        egui::SidePanel::right("chat")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    ui.label(format!("Chat: {}", self.selected));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let twitch = self.chat.pane == ChatPane::Twitch;
                        if ui.selectable_label(!twitch, "Custom").clicked() {
                            self.chat.pane = ChatPane::Custom;
                        }
                        if ui.selectable_label(twitch, "Twitch").clicked() {
                            self.chat.pane = ChatPane::Twitch;
                        }
                    });
                });
                ui.separator();

                match self.chat.pane {
                    ChatPane::Twitch => self.ui_twitch_chat(ui),
                    ChatPane::Custom => self.ui_custom_chat(ui),
                }
            });
    }

    fn ui_twitch_chat(&mut self, ui: &mut egui::Ui) {
        ui.label("Twitch's own chat opens in a separate window.");
        ui.add_space(4.0);
        if ui.button("Open Twitch chat").clicked() {
            let url = preview::popout_chat_url(&self.selected, self.local.dark_mode);
            match preview::open_preview(&url, &format!("Chat - {}", self.selected)) {
                Ok(()) => self.status = "Opened chat window.".to_string(),
                Err(e) => self.status = format!("Chat failed: {e:#}"),
            }
        }
    }

    fn ui_custom_chat(&mut self, ui: &mut egui::Ui) {
        let display_name = self.chat_display_name();

        if self.chat.editing_name {
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.chat.name_draft)
                        .hint_text("Display name")
                        .desired_width(140.0),
                );
                if ui.button("Save").clicked() {
                    let name = self.chat.name_draft.trim().to_string();
                    if !name.is_empty() {
                        self.local.chat_username = Some(name);
                        self.save_local();
                    }
                    self.chat.editing_name = false;
                }
            });
        } else {
            ui.horizontal(|ui| {
                ui.label("Chatting as");
                if ui
                    .button(display_name.clone())
                    .on_hover_text("Change display name")
                    .clicked()
                {
                    self.chat.name_draft = display_name.clone();
                    self.chat.editing_name = true;
                }
            });
        }
        ui.separator();

        let input_height = 32.0;
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .max_height(ui.available_height() - input_height)
            .show(ui, |ui| {
                if self.chat.messages().is_empty() {
                    ui.weak("Connecting to chat... Messages will appear here.");
                }
                for msg in self.chat.messages() {
                    ui_chat_message(ui, msg);
                }
            });

        ui.horizontal(|ui| {
            let resp = ui.add(
                egui::TextEdit::singleline(&mut self.chat.draft)
                    .hint_text("Send a message")
                    .desired_width(ui.available_width() - 56.0),
            );
            let submitted = resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Send").clicked() || submitted {
                self.chat.send_local(&display_name);
            }
        });
    }
}

fn ui_chat_message(ui: &mut egui::Ui, msg: &ChatMessage) {
    let author_color = match msg.origin {
        ChatOrigin::Local => egui::Color32::from_rgb(0xFF, 0x8A, 0x00),
        ChatOrigin::Remote => egui::Color32::from_rgb(0x91, 0x47, 0xFF),
    };

    // Message ids keep widget ids stable when authors repeat.
    ui.push_id(&msg.id, |ui| {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(&msg.author)
                    .color(author_color)
                    .strong(),
            );
            ui.label(
                egui::RichText::new(msg.timestamp.format("%H:%M").to_string())
                    .small()
                    .weak(),
            );
        });
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            for segment in split_links(&msg.body) {
                match segment {
                    MessageSegment::Text(text) => {
                        ui.label(text);
                    }
                    MessageSegment::Link { label, href } => {
                        ui.hyperlink_to(label, href);
                    }
                }
            }
        });
        ui.add_space(4.0);
    });
}
