//! Chat synchronization client for the ObsidianTime portal.
//!
//! This crate keeps a locally rendered chat view consistent with the
//! server's message stream: a periodic forward poll appends new items, and
//! scrolling to the top pages older history in above the current content.
//! Rendering goes through the [`render::RenderSink`] trait so the engine is
//! independent of any particular UI; [`view::ChatView`] is the in-memory
//! implementation used by the CLI and the tests.

pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod net;
pub mod notify;
pub mod render;
pub mod state;
pub mod util;
pub mod view;

pub use compose::ChatComposer;
pub use config::SyncConfig;
pub use engine::{ChatSyncEngine, EngineOptions, OlderOutcome, PollOutcome, SharedSink};
pub use error::SyncError;
pub use net::api::{HttpChatApi, Session};
pub use notify::{LogNotifier, NoticeLevel, Notifier};
pub use render::{Placement, RenderSink, Renderer};
pub use view::ChatView;
