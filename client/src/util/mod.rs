//! Small pure helpers shared by rendering and scroll handling.

pub mod html;
pub mod throttle;
