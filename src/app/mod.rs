use anyhow::Result;

mod actions;
mod state;
pub(crate) mod types;
mod ui_chat;
mod ui_header;
mod ui_sidebar;
mod ui_viewer;

use crate::storage::Storage;
use state::GraviApp;

pub fn run_app(initial_channel: Option<String>) -> Result<()> {
    let storage = Storage::default_dir().unwrap_or_else(|e| {
        tracing::warn!(error = ?e, "no user data directory, keeping state in temp dir");
        Storage::at(std::env::temp_dir().join("gravitv"))
    });

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "GraviTV",
        native_options,
        Box::new(move |cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            let app = GraviApp::new(storage, initial_channel);
            apply_theme(&cc.egui_ctx, app.local.dark_mode);
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!(e.to_string()))
}

pub(crate) fn apply_theme(ctx: &egui::Context, dark_mode: bool) {
    let accent = egui::Color32::from_rgb(0xFF, 0x8A, 0x00); // #ff8a00
    let accent2 = egui::Color32::from_rgb(0x91, 0x47, 0xFF); // #9147ff

    let mut style = (*ctx.style()).clone();
    style.visuals = if dark_mode {
        let bg = egui::Color32::from_rgb(0x0E, 0x0E, 0x10); // #0e0e10
        let panel = egui::Color32::from_rgb(0x18, 0x18, 0x1B); // #18181b

        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = bg;
        visuals.window_fill = panel;
        visuals.faint_bg_color = panel;
        visuals.widgets.noninteractive.bg_fill = panel;
        visuals.widgets.noninteractive.fg_stroke.color =
            egui::Color32::from_rgb(0xEF, 0xEF, 0xF1);
        visuals
    } else {
        let mut visuals = egui::Visuals::light();
        visuals.panel_fill = egui::Color32::from_rgb(0xF7, 0xF7, 0xF8); // #f7f7f8
        visuals.widgets.noninteractive.fg_stroke.color =
            egui::Color32::from_rgb(0x0E, 0x0E, 0x10);
        visuals
    };

    style.visuals.widgets.inactive.rounding = egui::Rounding::same(6.0);
    style.visuals.widgets.hovered.rounding = egui::Rounding::same(6.0);
    style.visuals.widgets.active.rounding = egui::Rounding::same(6.0);

    style.visuals.selection.bg_fill = accent.linear_multiply(0.55);
    style.visuals.selection.stroke.color = accent;
    style.visuals.hyperlink_color = accent2;
    style.visuals.error_fg_color = egui::Color32::from_rgb(0xFF, 0x4D, 0x6D);

    ctx.set_style(style);
}
