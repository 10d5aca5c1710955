//! waterfall
//!
//! Ordered masonry layout for paginated feeds. Items arrive in pages, their
//! assets finish loading in any order, and placement still happens strictly
//! in sequence into whichever column is currently shortest.
//!
//! The core (`layout`, `sequencer`, `pagination`, `session`) is pure and
//! clock-free; `source`, `view` and `integration` are the impure shell.

pub mod config;
pub mod layout;
pub mod logging;
pub mod model;
pub mod pagination;
pub mod sequencer;
pub mod session;
pub mod source;
pub mod view;

// Headless replay loop
pub mod integration;
