//! Session-scoped client state.

pub mod sync;
