//! Message, poll, and vote submission.
//!
//! DESIGN
//! ======
//! [`ChatComposer`] validates input locally, submits it through
//! [`ChatForms`], and reports the result through the [`Notifier`]. A vote's
//! returned tally is written into the rendered poll widget under the same
//! sink lock the engine uses. When an engine is attached, a successful send
//! triggers one forward poll so the new item shows up without waiting for
//! the next tick.
//!
//! ERROR HANDLING
//! ==============
//! Validation failures return [`SyncError::Invalid`] without a request.
//! Every failure, local or remote, raises exactly one error notice and is
//! also returned to the caller.

#[cfg(test)]
#[path = "compose_test.rs"]
mod compose_test;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::{ChatSyncEngine, SharedSink};
use crate::error::SyncError;
use crate::net::api::ChatForms;
use crate::net::types::{PollDraft, SubmitResponse, VoteTally};
use crate::notify::{NoticeLevel, Notifier};

pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 4;
pub const MAX_OPTION_CHARS: usize = 200;

pub struct ChatComposer {
    forms: Arc<dyn ChatForms>,
    sink: SharedSink,
    notifier: Arc<dyn Notifier>,
    engine: Option<ChatSyncEngine>,
}

impl ChatComposer {
    #[must_use]
    pub fn new(forms: Arc<dyn ChatForms>, sink: SharedSink, notifier: Arc<dyn Notifier>) -> Self {
        Self { forms, sink, notifier, engine: None }
    }

    /// Poll `engine` forward after each successful submission.
    #[must_use]
    pub fn with_engine(mut self, engine: ChatSyncEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Post a text message.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Invalid`] for blank content, or the submission error.
    pub async fn send_message(&self, content: &str) -> Result<SubmitResponse, SyncError> {
        let result = match normalize_message(content) {
            Ok(content) => self.forms.send_message(&content).await,
            Err(e) => Err(e),
        };
        let response = self.report(result, "Message sent", "Failed to send message")?;
        info!(message_id = ?response.message_id, "message sent");
        self.refresh().await;
        Ok(response)
    }

    /// Create a poll.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Invalid`] if the draft fails validation, or the submission error.
    pub async fn create_poll(&self, draft: &PollDraft) -> Result<SubmitResponse, SyncError> {
        let result = match normalize_poll(draft) {
            Ok(draft) => self.forms.create_poll(&draft).await,
            Err(e) => Err(e),
        };
        let response = self.report(result, "Poll created", "Failed to create poll")?;
        info!(poll_id = ?response.poll_id, "poll created");
        self.refresh().await;
        Ok(response)
    }

    /// Toggle a vote and update the rendered poll with the returned tally.
    ///
    /// # Errors
    ///
    /// Returns the submission error.
    pub async fn vote(&self, poll_id: i64, option_id: i64) -> Result<VoteTally, SyncError> {
        let tally = match self.forms.vote(poll_id, option_id).await {
            Ok(tally) => tally,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), poll_id, option_id, "vote failed");
                self.notifier.notify(NoticeLevel::Error, "Failed to vote");
                return Err(e);
            }
        };

        if !self.sink.lock().await.apply_poll_tally(poll_id, &tally) {
            debug!(poll_id, "voted poll is not rendered");
        }
        let notice = if tally.voted { "Vote recorded" } else { "Vote withdrawn" };
        self.notifier.notify(NoticeLevel::Success, notice);
        Ok(tally)
    }

    fn report(
        &self,
        result: Result<SubmitResponse, SyncError>,
        success: &str,
        failure: &str,
    ) -> Result<SubmitResponse, SyncError> {
        match result {
            Ok(response) => {
                self.notifier.notify(NoticeLevel::Success, success);
                Ok(response)
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "{failure}");
                self.notifier.notify(NoticeLevel::Error, &format!("{failure}: {e}"));
                Err(e)
            }
        }
    }

    async fn refresh(&self) {
        if let Some(engine) = &self.engine {
            let outcome = engine.poll_forward().await;
            debug!(?outcome, "post-submit refresh");
        }
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Trim message content; blank content is rejected.
///
/// # Errors
///
/// Returns [`SyncError::Invalid`] when nothing remains after trimming.
pub fn normalize_message(content: &str) -> Result<String, SyncError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(SyncError::Invalid("message is empty".into()));
    }
    Ok(trimmed.to_owned())
}

/// Trim the question and options and drop blank options.
///
/// # Errors
///
/// Returns [`SyncError::Invalid`] for a blank question, an option count
/// outside 2..=4, or an option longer than 200 characters.
pub fn normalize_poll(draft: &PollDraft) -> Result<PollDraft, SyncError> {
    let question = draft.question.trim();
    if question.is_empty() {
        return Err(SyncError::Invalid("poll question is empty".into()));
    }

    let options: Vec<String> = draft
        .options
        .iter()
        .map(|option| option.trim())
        .filter(|option| !option.is_empty())
        .map(str::to_owned)
        .collect();
    if !(MIN_POLL_OPTIONS..=MAX_POLL_OPTIONS).contains(&options.len()) {
        return Err(SyncError::Invalid(format!(
            "a poll needs {MIN_POLL_OPTIONS} to {MAX_POLL_OPTIONS} options, got {}",
            options.len()
        )));
    }
    if let Some(long) = options.iter().position(|o| o.chars().count() > MAX_OPTION_CHARS) {
        return Err(SyncError::Invalid(format!(
            "option {} is longer than {MAX_OPTION_CHARS} characters",
            long + 1
        )));
    }

    Ok(PollDraft { question: question.to_owned(), multiple_choice: draft.multiple_choice, options })
}
