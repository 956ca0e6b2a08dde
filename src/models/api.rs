use serde::{Deserialize, Serialize};

/// One live stream as reported by the status service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamData {
    pub user_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewer_count: u64,
}

/// Response of `GET <status-service>?names=a,b,c`.
///
/// A missing or empty `data` array means every queried channel is offline.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamsResponse {
    #[serde(default)]
    pub data: Option<Vec<StreamData>>,
}
