use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};

/// Embed URL for the provider's video player. The player itself is a black
/// box rendered by the helper's webview.
pub(crate) fn player_url(channel: &str) -> String {
    format!(
        "https://player.twitch.tv/?channel={}&parent=localhost&muted=false",
        urlencoding::encode(&channel.to_lowercase())
    )
}

/// Popout URL for the provider's own chat.
pub(crate) fn popout_chat_url(channel: &str, dark_mode: bool) -> String {
    let mut url = format!(
        "https://www.twitch.tv/popout/{}/chat",
        urlencoding::encode(&channel.to_lowercase())
    );
    if dark_mode {
        url.push_str("?darkpopout");
    }
    url
}

/// Open `url` in the out-of-process webview helper.
pub(crate) fn open_preview(url: &str, title: &str) -> Result<()> {
    let current_exe = std::env::current_exe().context("get current exe")?;
    let exe_dir = current_exe
        .parent()
        .context("resolve exe directory")?
        .to_path_buf();

    let helper_name = if std::env::consts::OS == "windows" {
        "gravitv-preview.exe"
    } else {
        "gravitv-preview"
    };

    // Release installs place the helper next to the main app.
    let candidate = exe_dir.join(helper_name);
    let helper_exe = if candidate.exists() {
        candidate
    } else {
        // Dev fallback: try cargo-built path
        let mut p = PathBuf::from("target");
        p.push("debug");
        p.push(helper_name);
        p
    };

    if !helper_exe.exists() {
        anyhow::bail!(
            "preview helper not found (expected {}). Reinstall from release zip.",
            helper_exe.display()
        );
    }

    Command::new(helper_exe)
        .arg(url)
        .arg(title)
        .spawn()
        .context("launch preview helper")?;

    Ok(())
}
