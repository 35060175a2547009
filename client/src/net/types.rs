//! Wire DTOs for the portal's chat endpoints.
//!
//! DESIGN
//! ======
//! Field names mirror the JSON the portal emits (`created_at`,
//! `date_readable`, `last_id`, ...) so serde stays declarative. Pages are
//! decoded into one wire shape, then narrowed into [`NewerPage`] or
//! [`OlderPage`] depending on which flow asked for them.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Server-assigned message identifier.
pub type MessageId = i64;

// =============================================================================
// CHAT ITEMS
// =============================================================================

/// One entry of a messages page, tagged by `"type"` on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatItem {
    Message(ChatMessage),
    DateSeparator(DateSeparator),
    /// Any unrecognized item type; skipped when rendering.
    #[serde(other)]
    Unknown,
}

impl ChatItem {
    /// Message id for message items, `None` for separators and unknown items.
    #[must_use]
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            Self::Message(msg) => Some(msg.id),
            Self::DateSeparator(_) | Self::Unknown => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub author: String,
    #[serde(default)]
    pub content: String,
    /// Display time, already formatted by the server (e.g. `"14:05"`).
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Poll,
}

/// Marker inserted between messages of different calendar days.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSeparator {
    /// Calendar-date key, `dd.mm.YYYY`.
    pub date: String,
    /// Human-readable label such as `"Сегодня"` or `"3 марта 2025"`.
    pub date_readable: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub question: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub multiple_choice: bool,
    #[serde(default)]
    pub total_votes: u32,
    #[serde(default)]
    pub options: Vec<PollOption>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub vote_count: u32,
    /// Share of all votes, `0.0..=100.0`, rounded to one decimal by the server.
    #[serde(default)]
    pub vote_percentage: f64,
    /// Whether the viewing user voted for this option.
    #[serde(default, rename = "voted", alias = "user_voted")]
    pub user_voted: bool,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// PAGES
// =============================================================================

/// Raw body of `GET /chat/api/messages/`.
///
/// `messages` is in chronological order for both flows, with each date
/// separator ahead of its day's messages.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MessagesPage {
    #[serde(default)]
    pub messages: Vec<ChatItem>,
    #[serde(default)]
    pub last_id: Option<MessageId>,
    #[serde(default)]
    pub has_more: bool,
}

impl MessagesPage {
    #[must_use]
    pub fn into_newer(self) -> NewerPage {
        NewerPage { items: self.messages, cursor: self.last_id }
    }

    /// The portal sends older pages oldest-first; flip them to newest-first.
    #[must_use]
    pub fn into_older(self) -> OlderPage {
        let mut items = self.messages;
        items.reverse();
        OlderPage { items, has_more: self.has_more }
    }
}

/// Forward-sync response: items newer than the requested cursor, oldest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewerPage {
    pub items: Vec<ChatItem>,
    /// Explicit cursor; absent on malformed responses.
    pub cursor: Option<MessageId>,
}

impl NewerPage {
    /// Cursor to advance to: the explicit one, else the largest message id in the batch.
    #[must_use]
    pub fn effective_cursor(&self) -> Option<MessageId> {
        self.cursor.or_else(|| max_message_id(&self.items))
    }
}

/// Backward-pagination response: one page of older items, newest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OlderPage {
    pub items: Vec<ChatItem>,
    pub has_more: bool,
}

#[must_use]
pub fn max_message_id(items: &[ChatItem]) -> Option<MessageId> {
    items.iter().filter_map(ChatItem::message_id).max()
}

// =============================================================================
// QUERIES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewerQuery {
    pub after: MessageId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OlderQuery {
    pub page: u32,
    pub before: Option<MessageId>,
}

impl NewerQuery {
    #[must_use]
    pub fn query_pairs(self) -> Vec<(&'static str, String)> {
        vec![("last_id", self.after.to_string())]
    }
}

impl OlderQuery {
    #[must_use]
    pub fn query_pairs(self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string())];
        if let Some(before) = self.before {
            pairs.push(("before_id", before.to_string()));
        }
        pairs
    }
}

// =============================================================================
// FORM SUBMISSION
// =============================================================================

/// Body returned by the message and poll form endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub message_id: Option<MessageId>,
    #[serde(default)]
    pub poll_id: Option<i64>,
}

/// Poll creation form, up to four options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollDraft {
    pub question: String,
    pub multiple_choice: bool,
    pub options: Vec<String>,
}

/// Updated poll statistics returned after a vote toggle.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct VoteTally {
    /// `true` when the vote was recorded, `false` when it was withdrawn.
    pub voted: bool,
    #[serde(default)]
    pub total_votes: u32,
    #[serde(default)]
    pub options: Vec<OptionTally>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OptionTally {
    pub id: i64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub vote_percentage: f64,
    #[serde(default)]
    pub user_voted: bool,
}
