//! Data models for the upstream chat stream and the points ledger.

pub mod event;
pub mod points;

pub use event::*;
pub use points::*;
