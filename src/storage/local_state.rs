use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use crate::models::LocalClientState;

/// Handle to the on-disk preference store. The base directory is injected so
/// tests can point it at a scratch dir instead of the user's data dir.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn default_dir() -> Result<Self> {
        let proj = ProjectDirs::from("com", "GraviTV", "GraviTV")
            .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;
        Ok(Self {
            dir: proj.data_local_dir().to_path_buf(),
        })
    }

    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join("local-state.json")
    }

    pub fn load(&self) -> Result<LocalClientState> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(LocalClientState::default());
        }
        let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let st = serde_json::from_str::<LocalClientState>(&raw)
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(st)
    }

    pub fn save(&self, st: &LocalClientState) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| format!("create {}", self.dir.display()))?;
        let path = self.state_path();
        let raw = serde_json::to_string_pretty(st)?;
        fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_without_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::at(dir.path());
        let st = storage.load().unwrap();
        assert!(st.channels.is_empty());
        assert!(st.avatars.is_empty());
        assert!(st.dark_mode);
        assert!(!st.status_api_url.is_empty());
        assert!(!st.avatar_api_url.is_empty());
    }

    #[test]
    fn state_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::at(dir.path());

        let mut st = LocalClientState::default();
        st.channels = vec!["alpha".to_string(), "beta".to_string()];
        st.avatars
            .insert("alpha".to_string(), "https://img.example/a.png".to_string());
        st.chat_username = Some("viewer1".to_string());
        st.dark_mode = false;

        storage.save(&st).unwrap();
        let loaded = storage.load().unwrap();

        assert_eq!(loaded.channels, st.channels);
        assert_eq!(
            loaded.avatars.get("alpha").map(String::as_str),
            Some("https://img.example/a.png")
        );
        assert_eq!(loaded.chat_username.as_deref(), Some("viewer1"));
        assert!(!loaded.dark_mode);
    }
}
