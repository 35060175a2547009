//! Render sink seam and the idempotent item merge.
//!
//! DESIGN
//! ======
//! A [`RenderSink`] is any ordered, scrollable list that can answer "is this
//! identity already shown?". [`Renderer::render`] turns one [`ChatItem`] into
//! a [`ViewNode`] and inserts it at the requested edge, unless an item with
//! the same identity is already present. Messages are keyed by id; date
//! separators are suppressed when either their date key or their readable
//! text is already present.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::net::types::{ChatItem, ChatMessage, DateSeparator, MessageId, MessageType, Poll, VoteTally};
use crate::util::html::{escape_html, text_to_html};

// =============================================================================
// SINK
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top of the content.
    pub offset: u32,
    /// Total height of all rendered nodes.
    pub content_height: u32,
    /// Height of the visible area.
    pub viewport_height: u32,
}

/// Which edge of the list a node is inserted at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Bottom edge; used by forward sync.
    Append,
    /// Top edge; used by backward pagination.
    Prepend,
}

/// Ordered visual list the engine merges into.
pub trait RenderSink: Send {
    /// `false` once the host tore the view down; every engine operation then no-ops.
    fn is_attached(&self) -> bool {
        true
    }

    fn has_message(&self, id: MessageId) -> bool;

    fn has_date(&self, date: &str) -> bool;

    fn has_date_text(&self, text: &str) -> bool;

    fn append(&mut self, node: ViewNode);

    fn prepend(&mut self, node: ViewNode);

    /// Id of the topmost rendered message, used as the backward-page anchor.
    fn first_message_id(&self) -> Option<MessageId>;

    /// Id of the bottom-most rendered message.
    fn last_message_id(&self) -> Option<MessageId>;

    fn scroll_metrics(&self) -> ScrollMetrics;

    fn set_scroll_offset(&mut self, offset: u32);

    fn scroll_to_bottom(&mut self) {
        let metrics = self.scroll_metrics();
        self.set_scroll_offset(metrics.content_height.saturating_sub(metrics.viewport_height));
    }

    /// Replace vote counts on the rendered widget for `poll_id`. Returns `false`
    /// when that poll is not on screen.
    fn apply_poll_tally(&mut self, poll_id: i64, tally: &VoteTally) -> bool;
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum ViewNode {
    Message(MessageNode),
    DateSeparator(SeparatorNode),
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageNode {
    pub id: MessageId,
    pub author: String,
    pub created_at: String,
    /// Authored by the session owner.
    pub own: bool,
    /// Arrived through forward sync; hosts highlight these briefly.
    pub fresh: bool,
    pub body: MessageBody,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessageBody {
    Text {
        /// Original content as typed.
        raw: String,
        /// Escaped content with `<br>` line breaks.
        html: String,
    },
    Poll(PollWidget),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeparatorNode {
    pub date: String,
    /// Escaped readable label.
    pub label_html: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollWidget {
    pub poll_id: i64,
    pub question: String,
    pub is_active: bool,
    pub total_votes: u32,
    pub options: Vec<PollOptionView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PollOptionView {
    pub id: i64,
    pub text: String,
    pub vote_count: u32,
    /// Progress-bar width in percent, clamped to `0.0..=100.0`.
    pub width_percent: f64,
    /// The viewer's own choice; rendered distinguished.
    pub voted: bool,
}

impl PollWidget {
    #[must_use]
    pub fn from_poll(poll: &Poll) -> Self {
        Self {
            poll_id: poll.id,
            question: poll.question.clone(),
            is_active: poll.is_active,
            total_votes: poll.total_votes,
            options: poll
                .options
                .iter()
                .map(|opt| PollOptionView {
                    id: opt.id,
                    text: opt.text.clone(),
                    vote_count: opt.vote_count,
                    width_percent: clamp_percent(opt.vote_percentage),
                    voted: opt.user_voted,
                })
                .collect(),
        }
    }

    /// Overwrite counts from a vote response. Options absent from the tally keep their values.
    pub fn apply_tally(&mut self, tally: &VoteTally) {
        self.total_votes = tally.total_votes;
        for option in &mut self.options {
            if let Some(update) = tally.options.iter().find(|t| t.id == option.id) {
                option.vote_count = update.vote_count;
                option.width_percent = clamp_percent(update.vote_percentage);
                option.voted = update.user_voted;
            }
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) }
}

impl ViewNode {
    /// Number of text rows the node occupies; drives the height model of in-memory sinks.
    #[must_use]
    pub fn rows(&self) -> u32 {
        let rows = match self {
            Self::DateSeparator(_) => 1,
            Self::Message(msg) => match &msg.body {
                MessageBody::Text { raw, .. } => 1 + raw.lines().count().max(1),
                MessageBody::Poll(widget) => 2 + widget.options.len() * 2,
            },
        };
        u32::try_from(rows).unwrap_or(u32::MAX)
    }
}

#[must_use]
pub fn message_node(msg: &ChatMessage, identity: Option<&str>, fresh: bool) -> MessageNode {
    let body = match (&msg.message_type, &msg.poll) {
        (MessageType::Poll, Some(poll)) => MessageBody::Poll(PollWidget::from_poll(poll)),
        _ => MessageBody::Text { raw: msg.content.clone(), html: text_to_html(&msg.content) },
    };
    MessageNode {
        id: msg.id,
        author: msg.author.clone(),
        created_at: msg.created_at.clone(),
        own: identity.is_some_and(|me| me == msg.author),
        fresh,
        body,
    }
}

#[must_use]
pub fn separator_node(sep: &DateSeparator) -> SeparatorNode {
    SeparatorNode {
        date: sep.date.clone(),
        label_html: escape_html(&sep.date_readable),
        label: sep.date_readable.clone(),
    }
}

// =============================================================================
// RENDERER
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Inserted,
    /// An item with the same identity is already on screen.
    Duplicate,
    /// Unknown item type.
    Ignored,
}

/// Builds nodes for one session identity and merges them idempotently.
#[derive(Clone, Debug, Default)]
pub struct Renderer {
    identity: Option<String>,
}

impl Renderer {
    #[must_use]
    pub fn new(identity: Option<String>) -> Self {
        Self { identity }
    }

    pub fn render(&self, sink: &mut dyn RenderSink, item: &ChatItem, placement: Placement) -> RenderOutcome {
        let node = match item {
            ChatItem::DateSeparator(sep) => {
                if sink.has_date(&sep.date) || sink.has_date_text(&sep.date_readable) {
                    tracing::debug!(date = %sep.date, "date separator already rendered");
                    return RenderOutcome::Duplicate;
                }
                ViewNode::DateSeparator(separator_node(sep))
            }
            ChatItem::Message(msg) => {
                if sink.has_message(msg.id) {
                    tracing::debug!(id = msg.id, "message already rendered");
                    return RenderOutcome::Duplicate;
                }
                let fresh = placement == Placement::Append;
                ViewNode::Message(message_node(msg, self.identity.as_deref(), fresh))
            }
            ChatItem::Unknown => return RenderOutcome::Ignored,
        };

        match placement {
            Placement::Append => sink.append(node),
            Placement::Prepend => sink.prepend(node),
        }
        RenderOutcome::Inserted
    }

    /// Append an oldest-first batch below the current content. Returns how many items were inserted.
    pub fn append_page(&self, sink: &mut dyn RenderSink, items: &[ChatItem]) -> usize {
        let mut inserted = 0;
        for item in items {
            if self.render(&mut *sink, item, Placement::Append) == RenderOutcome::Inserted {
                inserted += 1;
            }
        }
        inserted
    }

    /// Insert a newest-first page above the current content, leaving its oldest item on top.
    /// Returns how many items were inserted.
    pub fn prepend_page(&self, sink: &mut dyn RenderSink, items: &[ChatItem]) -> usize {
        let mut inserted = 0;
        for item in items {
            if self.render(&mut *sink, item, Placement::Prepend) == RenderOutcome::Inserted {
                inserted += 1;
            }
        }
        inserted
    }
}
