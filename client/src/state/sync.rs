//! Cursor and pagination state for one chat view session.
//!
//! DESIGN
//! ======
//! Every transition is a method here so the engine only sequences I/O. Each
//! fetch takes a ticket stamped with the current epoch; finishing a ticket
//! from an older epoch is ignored, which is how responses that arrive after
//! teardown or re-initialization become no-ops.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use crate::net::types::MessageId;

/// Why a fetch was not started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The engine was never initialized or has been stopped.
    Inactive,
    /// A forward poll is still awaiting its response.
    ForwardInFlight,
    /// A backward fetch is still awaiting its response.
    LoadingOlder,
    /// Backward pagination reached the beginning of the history.
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForwardTicket {
    pub epoch: u64,
    pub after: MessageId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OlderTicket {
    pub epoch: u64,
    pub page: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncState {
    last_message_id: MessageId,
    is_loading_older: bool,
    has_more_older: bool,
    current_page: u32,
    forward_in_flight: bool,
    epoch: u64,
    active: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_message_id: 0,
            is_loading_older: false,
            has_more_older: true,
            current_page: 1,
            forward_in_flight: false,
            epoch: 0,
            active: false,
        }
    }

    /// Start a session at `cursor`. Returns the new epoch.
    pub fn activate(&mut self, cursor: MessageId) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.last_message_id = cursor;
        self.is_loading_older = false;
        self.has_more_older = true;
        self.current_page = 1;
        self.forward_in_flight = false;
        self.active = true;
        self.epoch
    }

    /// End the session; outstanding tickets become stale.
    pub fn deactivate(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.active = false;
        self.forward_in_flight = false;
        self.is_loading_older = false;
    }

    #[must_use]
    pub fn is_current(&self, epoch: u64) -> bool {
        self.active && self.epoch == epoch
    }

    // -------------------------------------------------------------------------
    // forward sync
    // -------------------------------------------------------------------------

    /// Reserve the forward flow. Overlapping polls are coalesced.
    ///
    /// # Errors
    ///
    /// Returns the reason the poll must be skipped.
    pub fn begin_forward(&mut self) -> Result<ForwardTicket, SkipReason> {
        if !self.active {
            return Err(SkipReason::Inactive);
        }
        if self.forward_in_flight {
            return Err(SkipReason::ForwardInFlight);
        }
        self.forward_in_flight = true;
        Ok(ForwardTicket { epoch: self.epoch, after: self.last_message_id })
    }

    pub fn finish_forward(&mut self, ticket: ForwardTicket) {
        if self.epoch == ticket.epoch {
            self.forward_in_flight = false;
        }
    }

    /// Move the cursor forward. Never moves it back; returns whether it changed.
    pub fn advance_cursor(&mut self, candidate: MessageId) -> bool {
        if candidate > self.last_message_id {
            self.last_message_id = candidate;
            true
        } else {
            false
        }
    }

    // -------------------------------------------------------------------------
    // backward pagination
    // -------------------------------------------------------------------------

    /// Reserve the backward flow and pick the next page number.
    ///
    /// # Errors
    ///
    /// Returns the reason the fetch must be skipped.
    pub fn begin_older(&mut self) -> Result<OlderTicket, SkipReason> {
        if !self.active {
            return Err(SkipReason::Inactive);
        }
        if self.is_loading_older {
            return Err(SkipReason::LoadingOlder);
        }
        if !self.has_more_older {
            return Err(SkipReason::Exhausted);
        }
        self.is_loading_older = true;
        Ok(OlderTicket { epoch: self.epoch, page: self.current_page + 1 })
    }

    pub fn finish_older(&mut self, ticket: OlderTicket) {
        if self.epoch == ticket.epoch {
            self.is_loading_older = false;
        }
    }

    /// A non-empty older page was merged.
    pub fn record_older_page(&mut self, has_more: bool) {
        self.current_page += 1;
        self.has_more_older = self.has_more_older && has_more;
    }

    /// An empty older page arrived; terminal for this session.
    pub fn exhaust_older(&mut self) {
        self.has_more_older = false;
    }

    // -------------------------------------------------------------------------
    // accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn last_message_id(&self) -> MessageId {
        self.last_message_id
    }

    #[must_use]
    pub fn is_loading_older(&self) -> bool {
        self.is_loading_older
    }

    #[must_use]
    pub fn has_more_older(&self) -> bool {
        self.has_more_older
    }

    #[must_use]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    #[must_use]
    pub fn forward_in_flight(&self) -> bool {
        self.forward_in_flight
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
