//! The editor core: line-based text buffers and the modal command state
//! machine that edits them.
//!
//! The surrounding editor (layout, rendering, terminal emulation) consumes
//! two surfaces: the [`buffer::Buffer`] for display and persistence, and
//! [`vim::Vim::handle_key`] for input. Everything else in this crate exists
//! in service of those two.

pub mod buffer;
pub mod change;
pub mod config;
pub mod motion;
pub mod registers;
pub mod verb;
pub mod view;
pub mod vim;
