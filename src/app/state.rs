use eframe::egui;
use std::time::Instant;

use crate::{
    chat::ChatPanel,
    models::{LocalClientState, StreamData},
    storage::Storage,
};

pub(crate) struct GraviApp {
    pub(crate) storage: Storage,
    pub(crate) local: LocalClientState,
    pub(crate) status: String,

    /// Live rows from the latest poll, in response order.
    pub(crate) streams: Vec<StreamData>,
    /// Tracked names absent from the latest poll response.
    pub(crate) offlines: Vec<String>,
    /// Set on poll failure, cleared on the next success.
    pub(crate) poll_error: Option<String>,

    /// Currently selected channel; empty means none.
    pub(crate) selected: String,
    pub(crate) stream_title: String,

    pub(crate) channel_to_add: String,
    pub(crate) sidebar_collapsed: bool,
    window_title: String,

    pub(crate) poll_task: Option<tokio::task::JoinHandle<Result<Vec<StreamData>, String>>>,
    pub(crate) last_poll_started: Option<Instant>,
    pub(crate) added_check_task: Option<(String, tokio::task::JoinHandle<Result<Vec<StreamData>, String>>)>,
    pub(crate) avatar_task: Option<tokio::task::JoinHandle<Vec<(String, String)>>>,
    pub(crate) avatars_dirty: bool,

    pub(crate) chat: ChatPanel,

    pub(crate) rt: tokio::runtime::Runtime,
}

impl GraviApp {
    pub(crate) fn new(storage: Storage, initial_channel: Option<String>) -> Self {
        let local = storage.load().unwrap_or_else(|e| {
            tracing::warn!(error = ?e, "failed to load local state, starting fresh");
            LocalClientState::default()
        });
        let status = format!("Local state: {}", storage.state_path().display());

        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");

        let mut app = Self {
            storage,
            local,
            status,
            streams: vec![],
            offlines: vec![],
            poll_error: None,
            selected: String::new(),
            stream_title: String::new(),
            channel_to_add: String::new(),
            sidebar_collapsed: false,
            window_title: String::new(),
            poll_task: None,
            last_poll_started: None,
            added_check_task: None,
            avatar_task: None,
            avatars_dirty: false,
            chat: ChatPanel::new(),
            rt,
        };

        // Avatars for any tracked channels loaded from disk.
        app.request_avatars();

        if let Some(name) = initial_channel {
            app.apply_startup_channel(&name);
        }

        app
    }

    /// The name chat messages are sent under. Generated and persisted on
    /// first use, like the rest of the preferences.
    pub(crate) fn chat_display_name(&mut self) -> String {
        if let Some(name) = self.local.chat_username.clone() {
            return name;
        }
        let name = format!("user{}", rand::random::<u16>() % 10000);
        self.local.chat_username = Some(name.clone());
        self.save_local();
        name
    }

    pub(crate) fn save_local(&mut self) {
        match self.storage.save(&self.local) {
            Ok(path) => self.status = format!("Local state: {}", path.display()),
            Err(e) => self.status = format!("Save local state failed: {e:#}"),
        }
    }

    pub(crate) fn sync_window_title(&mut self, ctx: &egui::Context) {
        let want = if self.selected.is_empty() {
            "GraviTV".to_string()
        } else if self.selected_is_offline() {
            format!("GraviTV - {} (Offline)", self.selected)
        } else {
            format!("GraviTV - {}", self.selected)
        };
        if want != self.window_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(want.clone()));
            self.window_title = want;
        }
    }

    pub(crate) fn selected_is_offline(&self) -> bool {
        self.offlines
            .iter()
            .any(|n| n.eq_ignore_ascii_case(&self.selected))
    }
}

impl eframe::App for GraviApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.tick_streams();
        self.tick_avatars();

        let selected = self.selected.clone();
        self.chat.sync_channel(&self.rt, &selected);
        self.chat.drain_events();

        self.sync_window_title(ctx);

        self.ui_header_bar(ctx);
        if !self.sidebar_collapsed {
            self.ui_sidebar(ctx);
        }
        self.ui_chat_panel(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.ui_viewer(ui));

        // Background tasks and the poll clock are harvested from the frame
        // loop, so keep frames coming even when the user is idle.
        ctx.request_repaint_after(std::time::Duration::from_millis(500));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.chat.shutdown();
    }
}
