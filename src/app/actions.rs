use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::models::{StreamData, StreamsResponse};

use super::state::GraviApp;

/// Fixed delay between status polls. The next request is only scheduled once
/// the previous one has been harvested, so a slow request pushes the next
/// one back instead of stacking.
const POLL_INTERVAL: Duration = Duration::from_secs(30);

impl GraviApp {
    // -------------------------------
    // Channel list
    // -------------------------------

    pub(crate) fn add_channel(&mut self) {
        let name = self.channel_to_add.trim().to_string();
        if !insert_channel(&mut self.local.channels, &name) {
            return;
        }
        self.channel_to_add.clear();
        self.save_local();
        self.request_avatars();

        // One-off check so a live channel can be selected right away,
        // independent of the scheduled poll.
        let url = self.poll_url(&[name.clone()]);
        let handle = self.rt.spawn(fetch_streams(url));
        self.added_check_task = Some((name, handle));
    }

    pub(crate) fn remove_channel(&mut self, name: &str) {
        // Never let the tracked set go empty.
        if self.local.channels.len() <= 1 {
            return;
        }
        let Some(pos) = self
            .local
            .channels
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
        else {
            return;
        };
        self.local.channels.remove(pos);
        self.local.avatars.remove(&name.to_lowercase());
        self.save_local();
        self.request_avatars();

        if self.selected.eq_ignore_ascii_case(name) {
            // First remaining name by sort order; title waits for the poll.
            self.selected = self.local.channels[0].clone();
            self.stream_title.clear();
        }
        self.force_poll();
    }

    pub(crate) fn select_live(&mut self, name: &str, title: &str) {
        self.selected = name.to_string();
        self.stream_title = title.to_string();
    }

    pub(crate) fn select_offline(&mut self, name: &str) {
        self.selected = name.to_string();
        self.stream_title.clear();
    }

    /// Startup routing: a channel named on the command line is added when
    /// unknown, then selected with an empty title pending the first poll.
    pub(crate) fn apply_startup_channel(&mut self, name: &str) {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return;
        }
        if insert_channel(&mut self.local.channels, &name) {
            self.save_local();
            self.request_avatars();
            let url = self.poll_url(&[name.clone()]);
            let handle = self.rt.spawn(fetch_streams(url));
            self.added_check_task = Some((name.clone(), handle));
        }
        self.select_offline(&name);
    }

    // -------------------------------
    // Status polling
    // -------------------------------

    /// Make the next tick poll immediately instead of waiting out the delay.
    pub(crate) fn force_poll(&mut self) {
        self.last_poll_started = None;
    }

    pub(crate) fn tick_streams(&mut self) {
        // 1) Harvest a completed poll.
        if let Some(handle) = self.poll_task.take() {
            if handle.is_finished() {
                match self.rt.block_on(async { handle.await }) {
                    Ok(result) => self.apply_poll_result(result),
                    Err(e) => self.apply_poll_result(Err(format!("{e}"))),
                }
            } else {
                // Put it back if still running.
                self.poll_task = Some(handle);
            }
        }

        // 2) Harvest the one-off check for a just-added channel.
        if let Some((name, handle)) = self.added_check_task.take() {
            if handle.is_finished() {
                let result = self
                    .rt
                    .block_on(async { handle.await })
                    .unwrap_or_else(|e| Err(format!("{e}")));
                self.apply_added_check(&name, result);
            } else {
                self.added_check_task = Some((name, handle));
            }
        }

        // 3) Schedule the next poll if due.
        let due = self
            .last_poll_started
            .map(|t| t.elapsed() >= POLL_INTERVAL)
            .unwrap_or(true);
        if !due || self.poll_task.is_some() || self.local.channels.is_empty() {
            return;
        }

        let url = self.poll_url(&self.local.channels.clone());
        self.last_poll_started = Some(Instant::now());
        self.poll_task = Some(self.rt.spawn(fetch_streams(url)));
    }

    pub(crate) fn apply_poll_result(&mut self, result: Result<Vec<StreamData>, String>) {
        match result {
            Ok(data) => {
                self.poll_error = None;
                self.offlines = offline_channels(&self.local.channels, &data);

                if self.selected.is_empty() {
                    // Nothing selected yet: pick the first live stream.
                    if let Some(first) = data.first() {
                        self.selected = first.user_name.clone();
                        self.stream_title = first.title.clone();
                    }
                } else if let Some(row) = data
                    .iter()
                    .find(|s| s.user_name.eq_ignore_ascii_case(&self.selected))
                {
                    self.stream_title = row.title.clone();
                } else if self.selected_is_offline() {
                    // Selection stays; only the stale title goes.
                    self.stream_title.clear();
                }

                self.streams = data;
            }
            Err(e) => {
                warn!(error = %e, "stream status poll failed");
                self.streams.clear();
                self.offlines = self.local.channels.clone();
                self.poll_error = Some("Failed to fetch stream data".to_string());
            }
        }
    }

    fn apply_added_check(&mut self, name: &str, result: Result<Vec<StreamData>, String>) {
        match result {
            Ok(data) => {
                if let Some(row) = data
                    .iter()
                    .find(|s| s.user_name.eq_ignore_ascii_case(name))
                    .or_else(|| data.first())
                {
                    self.selected = name.to_string();
                    self.stream_title = row.title.clone();
                }
            }
            Err(e) => debug!(channel = %name, error = %e, "status check for new channel failed"),
        }
        // Refresh the full board either way.
        self.force_poll();
    }

    fn poll_url(&self, names: &[String]) -> String {
        let joined = names
            .iter()
            .map(|n| urlencoding::encode(n).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}?names={}", self.local.status_api_url.trim_end_matches('/'), joined)
    }

    // -------------------------------
    // Avatars
    // -------------------------------

    /// Note that the tracked set changed; the next tick fetches whatever is
    /// missing from the cache.
    pub(crate) fn request_avatars(&mut self) {
        self.avatars_dirty = true;
    }

    pub(crate) fn tick_avatars(&mut self) {
        if let Some(handle) = self.avatar_task.take() {
            if handle.is_finished() {
                let found = self
                    .rt
                    .block_on(async { handle.await })
                    .unwrap_or_default();
                if !found.is_empty() {
                    for (name, url) in found {
                        self.local.avatars.insert(name, url);
                    }
                    self.save_local();
                }
            } else {
                self.avatar_task = Some(handle);
            }
        }

        if !self.avatars_dirty || self.avatar_task.is_some() {
            return;
        }
        self.avatars_dirty = false;

        let missing = self
            .local
            .channels
            .iter()
            .filter(|name| !self.local.avatars.contains_key(&name.to_lowercase()))
            .cloned()
            .collect::<Vec<_>>();
        if missing.is_empty() {
            return;
        }

        let base = self.local.avatar_api_url.trim_end_matches('/').to_string();
        self.avatar_task = Some(self.rt.spawn(fetch_avatars(base, missing)));
    }
}

async fn fetch_streams(url: String) -> Result<Vec<StreamData>, String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .map_err(|e| e.to_string())?;
    let resp = client.get(&url).send().await.map_err(|e| e.to_string())?;
    if !resp.status().is_success() {
        return Err(format!("HTTP {}", resp.status()));
    }
    let parsed = resp
        .json::<StreamsResponse>()
        .await
        .map_err(|e| e.to_string())?;
    Ok(parsed.data.unwrap_or_default())
}

/// Fetch avatars for `names` one by one (the lookup service rate-limits),
/// returning only the successful lookups keyed by lowercased name.
async fn fetch_avatars(base: String, names: Vec<String>) -> Vec<(String, String)> {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "build http client for avatar lookup failed");
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    for name in names {
        let url = format!("{}/{}", base, urlencoding::encode(&name));
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => {
                    let body = body.trim();
                    if is_avatar_url(body) {
                        found.push((name.to_lowercase(), body.to_string()));
                    } else {
                        debug!(channel = %name, "avatar lookup returned no usable url");
                    }
                }
                Err(e) => debug!(channel = %name, error = %e, "avatar body read failed"),
            },
            Ok(resp) => debug!(channel = %name, status = %resp.status(), "avatar lookup failed"),
            Err(e) => debug!(channel = %name, error = %e, "avatar request failed"),
        }
    }
    found
}

/// The lookup service answers with either a URL or an error string
/// containing "Error"; anything else is treated as a failure too.
fn is_avatar_url(body: &str) -> bool {
    !body.is_empty() && !body.contains("Error") && body.starts_with("http")
}

/// Insert `name` into the sorted tracked list. Empty names and
/// case-insensitive duplicates are rejected.
fn insert_channel(channels: &mut Vec<String>, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    if channels.iter().any(|c| c.eq_ignore_ascii_case(name)) {
        return false;
    }
    channels.push(name.to_string());
    channels.sort();
    true
}

/// Tracked names absent from the live response, matched case-insensitively.
fn offline_channels(tracked: &[String], live: &[StreamData]) -> Vec<String> {
    tracked
        .iter()
        .filter(|name| !live.iter().any(|s| s.user_name.eq_ignore_ascii_case(name)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;

    fn test_app() -> (GraviApp, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut app = GraviApp::new(Storage::at(dir.path()), None);
        // Keep any stray background request away from real services.
        app.local.status_api_url = "http://127.0.0.1:9".to_string();
        app.local.avatar_api_url = "http://127.0.0.1:9".to_string();
        (app, dir)
    }

    fn live(name: &str, title: &str, viewers: u64) -> StreamData {
        StreamData {
            user_name: name.to_string(),
            title: title.to_string(),
            viewer_count: viewers,
        }
    }

    #[test]
    fn insert_keeps_list_sorted_and_unique() {
        let mut channels = vec!["beta".to_string()];
        assert!(insert_channel(&mut channels, "alpha"));
        assert_eq!(channels, vec!["alpha", "beta"]);

        assert!(!insert_channel(&mut channels, ""));
        assert!(!insert_channel(&mut channels, "ALPHA"));
        assert_eq!(channels.len(), 2);
    }

    #[test]
    fn add_channel_inserts_and_persists() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["beta".to_string()];
        app.channel_to_add = " alpha ".to_string();
        app.add_channel();

        assert_eq!(app.local.channels, vec!["alpha", "beta"]);
        assert!(app.channel_to_add.is_empty());
        assert!(app.storage.state_path().exists());
        assert!(app.added_check_task.is_some());
    }

    #[test]
    fn add_channel_rejects_duplicates_without_clearing_input() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["alpha".to_string()];
        app.channel_to_add = "Alpha".to_string();
        app.add_channel();

        assert_eq!(app.local.channels, vec!["alpha"]);
        assert_eq!(app.channel_to_add, "Alpha");
        assert!(!app.storage.state_path().exists());
    }

    #[test]
    fn remove_refuses_to_empty_the_set() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["solo".to_string()];
        app.remove_channel("solo");

        assert_eq!(app.local.channels, vec!["solo"]);
        // A refused removal writes nothing.
        assert!(!app.storage.state_path().exists());
    }

    #[test]
    fn remove_reselects_first_remaining_and_drops_avatar() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["alpha".to_string(), "beta".to_string()];
        app.local
            .avatars
            .insert("beta".to_string(), "https://img.example/b.png".to_string());
        app.selected = "beta".to_string();
        app.stream_title = "old title".to_string();
        app.last_poll_started = Some(Instant::now());

        app.remove_channel("beta");

        assert_eq!(app.local.channels, vec!["alpha"]);
        assert!(app.local.avatars.get("beta").is_none());
        assert_eq!(app.selected, "alpha");
        assert!(app.stream_title.is_empty());
        // Removal forces the next tick to poll immediately.
        assert!(app.last_poll_started.is_none());
        assert!(app.storage.state_path().exists());
    }

    #[test]
    fn remove_leaves_unrelated_selection_alone() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["alpha".to_string(), "beta".to_string()];
        app.selected = "alpha".to_string();
        app.stream_title = "title".to_string();

        app.remove_channel("beta");

        assert_eq!(app.selected, "alpha");
        assert_eq!(app.stream_title, "title");
    }

    #[test]
    fn poll_partitions_live_and_offline() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["bar".to_string(), "foo".to_string()];

        app.apply_poll_result(Ok(vec![live("foo", "T", 10)]));

        assert_eq!(app.streams.len(), 1);
        assert_eq!(app.streams[0].user_name, "foo");
        assert_eq!(app.offlines, vec!["bar"]);
        assert!(app.poll_error.is_none());
    }

    #[test]
    fn poll_selects_first_live_when_nothing_selected() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["bar".to_string(), "foo".to_string()];

        app.apply_poll_result(Ok(vec![live("foo", "T", 10), live("bar", "U", 5)]));

        assert_eq!(app.selected, "foo");
        assert_eq!(app.stream_title, "T");
    }

    #[test]
    fn poll_refreshes_title_of_selected_live_channel() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["foo".to_string()];
        app.selected = "foo".to_string();
        app.stream_title = "old".to_string();

        app.apply_poll_result(Ok(vec![live("Foo", "new", 1)]));

        assert_eq!(app.selected, "foo");
        assert_eq!(app.stream_title, "new");
    }

    #[test]
    fn poll_clears_title_when_selected_goes_offline() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["bar".to_string(), "foo".to_string()];
        app.selected = "foo".to_string();
        app.stream_title = "T".to_string();

        app.apply_poll_result(Ok(vec![live("bar", "U", 5)]));

        assert_eq!(app.selected, "foo");
        assert!(app.stream_title.is_empty());
    }

    #[test]
    fn poll_failure_marks_everything_offline_but_keeps_selection() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["bar".to_string(), "foo".to_string()];
        app.selected = "foo".to_string();
        app.streams = vec![live("foo", "T", 10)];

        app.apply_poll_result(Err("connection refused".to_string()));

        assert!(app.streams.is_empty());
        assert_eq!(app.offlines, vec!["bar", "foo"]);
        assert!(app.poll_error.is_some());
        assert_eq!(app.selected, "foo");
    }

    #[test]
    fn offline_partition_is_case_insensitive() {
        let tracked = vec!["Foo".to_string(), "bar".to_string()];
        let offlines = offline_channels(&tracked, &[live("foo", "T", 1)]);
        assert_eq!(offlines, vec!["bar"]);
    }

    #[test]
    fn avatar_url_validation() {
        assert!(is_avatar_url("https://img.example/a.png"));
        assert!(!is_avatar_url(""));
        assert!(!is_avatar_url("Error: user not found"));
        assert!(!is_avatar_url("no such user"));
    }

    #[test]
    fn startup_channel_is_added_and_selected() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["alpha".to_string()];

        app.apply_startup_channel("Beta");

        assert_eq!(app.local.channels, vec!["alpha", "beta"]);
        assert_eq!(app.selected, "beta");
        assert!(app.stream_title.is_empty());
        assert!(app.added_check_task.is_some());
    }

    #[test]
    fn added_check_promotes_live_channel_to_selection() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["alpha".to_string(), "beta".to_string()];
        app.selected = "alpha".to_string();
        app.last_poll_started = Some(Instant::now());

        app.apply_added_check("beta", Ok(vec![live("Beta", "fresh", 3)]));

        assert_eq!(app.selected, "beta");
        assert_eq!(app.stream_title, "fresh");
        assert!(app.last_poll_started.is_none());
    }

    #[test]
    fn added_check_for_offline_channel_changes_nothing() {
        let (mut app, _dir) = test_app();
        app.local.channels = vec!["alpha".to_string(), "beta".to_string()];
        app.selected = "alpha".to_string();

        app.apply_added_check("beta", Ok(vec![]));

        assert_eq!(app.selected, "alpha");
    }
}
