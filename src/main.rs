#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

mod app;
mod chat;
mod models;
mod preview;
mod storage;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .init();

    // Optional startup channel, e.g. `gravitv-desktop shroud`.
    let initial_channel = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    app::run_app(initial_channel)
}
