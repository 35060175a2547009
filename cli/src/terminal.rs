//! Terminal rendering for the chat CLI.
//!
//! [`TerminalSink`] keeps a [`ChatView`] for identity and ordering, and
//! writes nodes as plain text lines. Backward pages cannot be drawn above
//! output that is already on screen, so history is printed once with
//! [`TerminalSink::print_all`] before live mode starts echoing appends.

#[cfg(test)]
#[path = "terminal_test.rs"]
mod terminal_test;

use std::io::Write;

use client::net::types::{MessageId, VoteTally};
use client::notify::{NoticeLevel, Notifier};
use client::render::{MessageBody, MessageNode, PollWidget, RenderSink, ScrollMetrics, ViewNode};
use client::view::ChatView;

pub struct TerminalSink<W: Write + Send> {
    view: ChatView,
    out: W,
    live: bool,
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { view: ChatView::default(), out, live: false }
    }

    /// Echo every subsequent append as it happens.
    pub fn go_live(&mut self) {
        self.live = true;
    }

    /// Print the whole view top to bottom.
    pub fn print_all(&mut self) {
        let lines: Vec<String> = self.view.nodes().iter().map(format_node).collect();
        for line in lines {
            self.write_line(&line);
        }
    }

    #[cfg(test)]
    pub fn view(&self) -> &ChatView {
        &self.view
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!(error = %e, "terminal write failed");
        }
    }
}

impl<W: Write + Send> RenderSink for TerminalSink<W> {
    fn has_message(&self, id: MessageId) -> bool {
        self.view.has_message(id)
    }

    fn has_date(&self, date: &str) -> bool {
        self.view.has_date(date)
    }

    fn has_date_text(&self, text: &str) -> bool {
        self.view.has_date_text(text)
    }

    fn append(&mut self, node: ViewNode) {
        if self.live {
            let line = format_node(&node);
            self.write_line(&line);
        }
        self.view.append(node);
    }

    fn prepend(&mut self, node: ViewNode) {
        self.view.prepend(node);
    }

    fn first_message_id(&self) -> Option<MessageId> {
        self.view.first_message_id()
    }

    fn last_message_id(&self) -> Option<MessageId> {
        self.view.last_message_id()
    }

    fn scroll_metrics(&self) -> ScrollMetrics {
        self.view.scroll_metrics()
    }

    fn set_scroll_offset(&mut self, offset: u32) {
        self.view.set_scroll_offset(offset);
    }

    fn apply_poll_tally(&mut self, poll_id: i64, tally: &VoteTally) -> bool {
        self.view.apply_poll_tally(poll_id, tally)
    }
}

// =============================================================================
// FORMATTING
// =============================================================================

pub fn format_node(node: &ViewNode) -> String {
    match node {
        ViewNode::DateSeparator(sep) => format!("-- {} --", sep.label),
        ViewNode::Message(msg) => format_message(msg),
    }
}

fn format_message(msg: &MessageNode) -> String {
    let marker = if msg.own { "*" } else { " " };
    let head = format!("{marker}[{}] #{} {}", msg.created_at, msg.id, msg.author);
    match &msg.body {
        MessageBody::Text { raw, .. } => {
            let mut lines = raw.lines();
            let first = lines.next().unwrap_or_default();
            let mut out = format!("{head}: {first}");
            for line in lines {
                out.push_str("\n    ");
                out.push_str(line);
            }
            out
        }
        MessageBody::Poll(widget) => format!("{head}: {}", format_poll(widget)),
    }
}

pub fn format_poll(widget: &PollWidget) -> String {
    let status = if widget.is_active { "" } else { " (closed)" };
    let mut out = format!("poll #{} {}{status} [{} votes]", widget.poll_id, widget.question, widget.total_votes);
    for option in &widget.options {
        let mark = if option.voted { "x" } else { " " };
        out.push_str(&format!(
            "\n    [{mark}] {}: {} ({} / {:.0}%)",
            option.id, option.text, option.vote_count, option.width_percent
        ));
    }
    out
}

// =============================================================================
// NOTICES
// =============================================================================

/// Prints notices to stderr so they never mix with chat output.
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        eprintln!("[{level}] {message}");
    }
}
