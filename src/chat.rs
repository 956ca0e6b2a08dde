use std::collections::{HashSet, VecDeque};
use std::sync::mpsc;
use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;
use tracing::{debug, warn};
use twitch_irc::login::StaticLoginCredentials;
use twitch_irc::message::ServerMessage;
use twitch_irc::{ClientConfig, SecureTCPTransport, TwitchIRCClient};

use crate::app::types::ChatPane;

/// Duplicate-id memory: once the set holds this many ids, the oldest half is
/// dropped.
const SEEN_IDS_CAP: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChatOrigin {
    Remote,
    Local,
}

#[derive(Debug, Clone)]
pub(crate) struct ChatMessage {
    pub(crate) id: String,
    pub(crate) author: String,
    pub(crate) body: String,
    pub(crate) timestamp: DateTime<Local>,
    pub(crate) origin: ChatOrigin,
}

/// Inbound event from the reader task. Tagged with the channel it belongs to
/// so deliveries from a torn-down session cannot leak into the next one.
#[derive(Debug, Clone)]
pub(crate) enum ChatEvent {
    Message {
        channel: String,
        id: String,
        author: String,
        body: String,
    },
}

type IrcClient = TwitchIRCClient<SecureTCPTransport, StaticLoginCredentials>;

/// One anonymous IRC connection bound to exactly one channel.
pub(crate) struct ChatSession {
    channel: String,
    client: IrcClient,
    reader: tokio::task::JoinHandle<()>,
}

impl ChatSession {
    /// Open a session: construct the client, spawn the inbound reader, join
    /// the channel. The client reconnects on its own; a join failure means no
    /// session and no retry at this layer.
    pub(crate) fn open(
        rt: &tokio::runtime::Runtime,
        channel: &str,
        tx: mpsc::Sender<ChatEvent>,
    ) -> anyhow::Result<Self> {
        let _guard = rt.enter();
        let (mut incoming, client) = IrcClient::new(ClientConfig::default());

        let reader = rt.spawn(async move {
            while let Some(message) = incoming.recv().await {
                if let ServerMessage::Privmsg(msg) = message {
                    let author = if msg.sender.name.is_empty() {
                        msg.sender.login.clone()
                    } else {
                        msg.sender.name.clone()
                    };
                    let ev = ChatEvent::Message {
                        channel: msg.channel_login.clone(),
                        id: remote_dedup_key(
                            &msg.message_id,
                            &msg.channel_login,
                            &msg.sender.login,
                            msg.server_timestamp.timestamp_millis(),
                        ),
                        author,
                        body: msg.message_text.clone(),
                    };
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
            }
        });

        // Twitch channel logins are lowercase regardless of display casing.
        if let Err(e) = client.join(channel.to_lowercase()) {
            reader.abort();
            return Err(e.into());
        }

        Ok(Self {
            channel: channel.to_lowercase(),
            client,
            reader,
        })
    }

    /// Best-effort teardown. Runs on every channel switch, so it must never
    /// panic past this boundary.
    pub(crate) fn close(self) {
        self.reader.abort();
        let _ = self.client.part(self.channel.clone());
        debug!(channel = %self.channel, "chat session closed");
        // Dropping the client terminates its connections.
    }
}

/// Dedup key for a remote delivery: the server-assigned id when present,
/// otherwise a synthesized one.
fn remote_dedup_key(message_id: &str, channel: &str, login: &str, millis: i64) -> String {
    if message_id.is_empty() {
        format!("{}-{}-{}", channel, login, millis)
    } else {
        message_id.to_string()
    }
}

/// Owns the chat pane state: the single active session, the display
/// sequence, and the duplicate-id memory.
pub(crate) struct ChatPanel {
    bound: Option<String>,
    session: Option<ChatSession>,
    messages: Vec<ChatMessage>,
    seen_ids: HashSet<String>,
    seen_order: VecDeque<String>,
    tx: mpsc::Sender<ChatEvent>,
    rx: mpsc::Receiver<ChatEvent>,
    local_seq: u64,

    pub(crate) pane: ChatPane,
    pub(crate) draft: String,
    pub(crate) editing_name: bool,
    pub(crate) name_draft: String,
}

impl ChatPanel {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            bound: None,
            session: None,
            messages: Vec::new(),
            seen_ids: HashSet::new(),
            seen_order: VecDeque::new(),
            tx,
            rx,
            local_seq: 0,
            pane: ChatPane::Twitch,
            draft: String::new(),
            editing_name: false,
            name_draft: String::new(),
        }
    }

    pub(crate) fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Keep the session bound to the selected channel. Only an actual change
    /// of channel clears the sequence and replaces the session; calling this
    /// every frame is free otherwise.
    pub(crate) fn sync_channel(&mut self, rt: &tokio::runtime::Runtime, selected: &str) {
        if !self.rebind(selected) {
            return;
        }
        if selected.is_empty() {
            return;
        }
        match ChatSession::open(rt, selected, self.tx.clone()) {
            Ok(session) => {
                debug!(channel = %selected, "chat session opened");
                self.session = Some(session);
            }
            Err(e) => {
                warn!(channel = %selected, error = ?e, "chat connect failed");
            }
        }
    }

    /// Point the panel at `selected`, tearing down any previous session and
    /// clearing per-channel state. Returns false when nothing changed.
    fn rebind(&mut self, selected: &str) -> bool {
        let next = (!selected.is_empty()).then(|| selected.to_string());
        if self.bound == next {
            return false;
        }
        if let Some(old) = self.session.take() {
            old.close();
        }
        self.messages.clear();
        self.seen_ids.clear();
        self.seen_order.clear();
        self.bound = next;
        true
    }

    /// Drain inbound events into the display sequence. Events tagged with a
    /// channel other than the bound one are leftovers of an old session and
    /// are dropped.
    pub(crate) fn drain_events(&mut self) {
        while let Ok(ev) = self.rx.try_recv() {
            let ChatEvent::Message {
                channel,
                id,
                author,
                body,
            } = ev;
            let matches_bound = self
                .bound
                .as_deref()
                .map(|b| b.eq_ignore_ascii_case(&channel))
                .unwrap_or(false);
            if !matches_bound {
                debug!(channel = %channel, "dropping chat message for unbound channel");
                continue;
            }
            self.push_remote(id, author, body);
        }
    }

    fn push_remote(&mut self, id: String, author: String, body: String) {
        if !self.note_seen(&id) {
            return;
        }
        self.messages.push(ChatMessage {
            id,
            author,
            body,
            timestamp: Local::now(),
            origin: ChatOrigin::Remote,
        });
    }

    /// Record a dedup key. Returns false when the key was already seen.
    fn note_seen(&mut self, id: &str) -> bool {
        if self.seen_ids.contains(id) {
            return false;
        }
        self.seen_ids.insert(id.to_string());
        self.seen_order.push_back(id.to_string());
        if self.seen_order.len() > SEEN_IDS_CAP {
            for old in self.seen_order.drain(..SEEN_IDS_CAP / 2) {
                self.seen_ids.remove(&old);
            }
        }
        true
    }

    /// Append the draft as a locally authored message. Never touches the
    /// network session.
    pub(crate) fn send_local(&mut self, author: &str) {
        let body = self.draft.trim().to_string();
        if body.is_empty() {
            return;
        }
        self.local_seq += 1;
        self.messages.push(ChatMessage {
            id: format!("local-{}", self.local_seq),
            author: author.to_string(),
            body,
            timestamp: Local::now(),
            origin: ChatOrigin::Local,
        });
        self.draft.clear();
    }

    pub(crate) fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

/// A chat message body split into plain text and link segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MessageSegment {
    Text(String),
    Link { label: String, href: String },
}

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://\S+)|(www\.\S+)").expect("link regex"));

/// Split a message body so http/https/www tokens can be rendered as
/// hyperlinks. `www.` links get an `https://` href.
pub(crate) fn split_links(body: &str) -> Vec<MessageSegment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for m in LINK_RE.find_iter(body) {
        if m.start() > last {
            segments.push(MessageSegment::Text(body[last..m.start()].to_string()));
        }
        let label = m.as_str().to_string();
        let href = if label.starts_with("www.") {
            format!("https://{}", label)
        } else {
            label.clone()
        };
        segments.push(MessageSegment::Link { label, href });
        last = m.end();
    }
    if last < body.len() {
        segments.push(MessageSegment::Text(body[last..].to_string()));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_remote_deliveries_are_dropped() {
        let mut panel = ChatPanel::new();
        panel.rebind("foo");
        panel.push_remote("id-1".to_string(), "a".to_string(), "hi".to_string());
        panel.push_remote("id-1".to_string(), "a".to_string(), "hi".to_string());
        assert_eq!(panel.messages().len(), 1);
        assert_eq!(panel.messages()[0].origin, ChatOrigin::Remote);
    }

    #[test]
    fn seen_set_drops_oldest_half_at_cap() {
        let mut panel = ChatPanel::new();
        panel.rebind("foo");
        for i in 0..=SEEN_IDS_CAP {
            assert!(panel.note_seen(&format!("id-{}", i)));
        }
        assert_eq!(panel.seen_order.len(), SEEN_IDS_CAP / 2 + 1);
        // The oldest half was forgotten and would be accepted again.
        assert!(panel.note_seen("id-0"));
        // Recent ids are still remembered.
        assert!(!panel.note_seen(&format!("id-{}", SEEN_IDS_CAP)));
    }

    #[test]
    fn rebind_clears_sequence_and_dedup_memory() {
        let mut panel = ChatPanel::new();
        panel.rebind("foo");
        panel.push_remote("id-1".to_string(), "a".to_string(), "hi".to_string());
        assert_eq!(panel.messages().len(), 1);

        assert!(panel.rebind("bar"));
        assert!(panel.messages().is_empty());
        assert!(panel.seen_ids.is_empty());
        assert_eq!(panel.bound.as_deref(), Some("bar"));
        // Same id is accepted again on the new channel.
        panel.push_remote("id-1".to_string(), "a".to_string(), "hi".to_string());
        assert_eq!(panel.messages().len(), 1);
    }

    #[test]
    fn rebind_to_same_channel_is_a_no_op() {
        let mut panel = ChatPanel::new();
        panel.rebind("foo");
        panel.push_remote("id-1".to_string(), "a".to_string(), "hi".to_string());
        assert!(!panel.rebind("foo"));
        assert_eq!(panel.messages().len(), 1);
    }

    #[test]
    fn stale_events_for_old_channel_are_dropped() {
        let mut panel = ChatPanel::new();
        panel.rebind("bar");
        panel
            .tx
            .send(ChatEvent::Message {
                channel: "foo".to_string(),
                id: "id-1".to_string(),
                author: "a".to_string(),
                body: "late".to_string(),
            })
            .unwrap();
        panel
            .tx
            .send(ChatEvent::Message {
                channel: "bar".to_string(),
                id: "id-2".to_string(),
                author: "b".to_string(),
                body: "fresh".to_string(),
            })
            .unwrap();
        panel.drain_events();
        assert_eq!(panel.messages().len(), 1);
        assert_eq!(panel.messages()[0].body, "fresh");
    }

    #[test]
    fn send_local_appends_with_display_name() {
        let mut panel = ChatPanel::new();
        panel.rebind("foo");
        panel.draft = "  hello there  ".to_string();
        panel.send_local("viewer1");
        assert_eq!(panel.messages().len(), 1);
        let msg = &panel.messages()[0];
        assert_eq!(msg.origin, ChatOrigin::Local);
        assert_eq!(msg.author, "viewer1");
        assert_eq!(msg.body, "hello there");
        assert!(panel.draft.is_empty());
    }

    #[test]
    fn send_local_ignores_blank_draft() {
        let mut panel = ChatPanel::new();
        panel.draft = "   ".to_string();
        panel.send_local("viewer1");
        assert!(panel.messages().is_empty());
    }

    #[test]
    fn remote_dedup_key_prefers_server_id() {
        assert_eq!(remote_dedup_key("abc", "foo", "bob", 1), "abc");
        assert_eq!(remote_dedup_key("", "foo", "bob", 17), "foo-bob-17");
    }

    #[test]
    fn split_links_handles_plain_text() {
        assert_eq!(
            split_links("no links here"),
            vec![MessageSegment::Text("no links here".to_string())]
        );
    }

    #[test]
    fn split_links_extracts_urls() {
        let segments = split_links("see https://example.com/x for details");
        assert_eq!(
            segments,
            vec![
                MessageSegment::Text("see ".to_string()),
                MessageSegment::Link {
                    label: "https://example.com/x".to_string(),
                    href: "https://example.com/x".to_string(),
                },
                MessageSegment::Text(" for details".to_string()),
            ]
        );
    }

    #[test]
    fn split_links_prefixes_www_links() {
        let segments = split_links("www.example.com");
        assert_eq!(
            segments,
            vec![MessageSegment::Link {
                label: "www.example.com".to_string(),
                href: "https://www.example.com".to_string(),
            }]
        );
    }
}
