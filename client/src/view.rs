//! In-memory [`RenderSink`] for hosts without a DOM, and for tests.
//!
//! Heights follow a fixed row model: each node is `rows * ROW_HEIGHT +
//! NODE_PADDING` pixels tall. That is enough for the engine's scroll
//! preservation to be observable.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use std::collections::{HashSet, VecDeque};

use crate::net::types::{MessageId, VoteTally};
use crate::render::{MessageBody, RenderSink, ScrollMetrics, ViewNode};

pub const ROW_HEIGHT: u32 = 20;
pub const NODE_PADDING: u32 = 12;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 600;

#[derive(Debug)]
pub struct ChatView {
    nodes: VecDeque<ViewNode>,
    message_ids: HashSet<MessageId>,
    dates: HashSet<String>,
    date_texts: HashSet<String>,
    content_height: u32,
    viewport_height: u32,
    offset: u32,
    attached: bool,
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new(DEFAULT_VIEWPORT_HEIGHT)
    }
}

impl ChatView {
    #[must_use]
    pub fn new(viewport_height: u32) -> Self {
        Self {
            nodes: VecDeque::new(),
            message_ids: HashSet::new(),
            dates: HashSet::new(),
            date_texts: HashSet::new(),
            content_height: 0,
            viewport_height,
            offset: 0,
            attached: true,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &VecDeque<ViewNode> {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Message ids top to bottom.
    #[must_use]
    pub fn message_ids(&self) -> Vec<MessageId> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                ViewNode::Message(msg) => Some(msg.id),
                ViewNode::DateSeparator(_) => None,
            })
            .collect()
    }

    /// Detach from the host; the engine treats a detached view as torn down.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    fn index(&mut self, node: &ViewNode) {
        match node {
            ViewNode::Message(msg) => {
                self.message_ids.insert(msg.id);
            }
            ViewNode::DateSeparator(sep) => {
                self.dates.insert(sep.date.clone());
                self.date_texts.insert(sep.label.trim().to_owned());
            }
        }
        self.content_height = self.content_height.saturating_add(node_height(node));
    }
}

#[must_use]
pub fn node_height(node: &ViewNode) -> u32 {
    node.rows().saturating_mul(ROW_HEIGHT).saturating_add(NODE_PADDING)
}

impl RenderSink for ChatView {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn has_message(&self, id: MessageId) -> bool {
        self.message_ids.contains(&id)
    }

    fn has_date(&self, date: &str) -> bool {
        self.dates.contains(date)
    }

    fn has_date_text(&self, text: &str) -> bool {
        self.date_texts.contains(text.trim())
    }

    fn append(&mut self, node: ViewNode) {
        self.index(&node);
        self.nodes.push_back(node);
    }

    fn prepend(&mut self, node: ViewNode) {
        self.index(&node);
        self.nodes.push_front(node);
    }

    fn first_message_id(&self) -> Option<MessageId> {
        self.nodes.iter().find_map(|node| match node {
            ViewNode::Message(msg) => Some(msg.id),
            ViewNode::DateSeparator(_) => None,
        })
    }

    fn last_message_id(&self) -> Option<MessageId> {
        self.nodes.iter().rev().find_map(|node| match node {
            ViewNode::Message(msg) => Some(msg.id),
            ViewNode::DateSeparator(_) => None,
        })
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics { offset: self.offset, content_height: self.content_height, viewport_height: self.viewport_height }
    }

    fn set_scroll_offset(&mut self, offset: u32) {
        let max = self.content_height.saturating_sub(self.viewport_height);
        self.offset = offset.min(max);
    }

    fn apply_poll_tally(&mut self, poll_id: i64, tally: &VoteTally) -> bool {
        let widget = self.nodes.iter_mut().find_map(|node| match node {
            ViewNode::Message(msg) => match &mut msg.body {
                MessageBody::Poll(widget) if widget.poll_id == poll_id => Some(widget),
                _ => None,
            },
            ViewNode::DateSeparator(_) => None,
        });
        match widget {
            Some(widget) => {
                widget.apply_tally(tally);
                true
            }
            None => false,
        }
    }
}
