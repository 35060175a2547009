//! Networking modules for the portal's chat REST endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` holds the request traits and their HTTP implementation, `types`
//! defines the shared wire schema.

pub mod api;
pub mod types;
