use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalClientState {
    pub status_api_url: String,
    pub avatar_api_url: String,

    /// Tracked channel names, sorted; stored as entered, compared
    /// case-insensitively.
    #[serde(default)]
    pub channels: Vec<String>,

    /// Lowercased channel name -> avatar image URL. Only successful lookups
    /// are ever written here.
    #[serde(default)]
    pub avatars: BTreeMap<String, String>,

    pub chat_username: Option<String>,

    #[serde(default = "default_dark_mode")]
    pub dark_mode: bool,
}

fn default_dark_mode() -> bool {
    true
}

impl Default for LocalClientState {
    fn default() -> Self {
        // NOTE: These are not secrets (clients must know where to connect),
        // but env overrides keep deployment details out of the repo.
        let status_api_url = std::env::var("GRAVITV_STATUS_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| option_env!("GRAVITV_STATUS_API_URL").map(|v| v.to_string()))
            .unwrap_or_else(|| "https://api.gravitv.app/twitch/streams".to_string());

        let avatar_api_url = std::env::var("GRAVITV_AVATAR_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| option_env!("GRAVITV_AVATAR_API_URL").map(|v| v.to_string()))
            .unwrap_or_else(|| "https://decapi.me/twitch/avatar".to_string());

        Self {
            status_api_url,
            avatar_api_url,
            channels: Vec::new(),
            avatars: BTreeMap::new(),
            chat_username: None,
            dark_mode: true,
        }
    }
}
