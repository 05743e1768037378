//! Leaf crate for the editor core: the UTF-8 rune codec, character
//! classification, visible-column mapping, and the [`Point`] caret type.
//!
//! Everything in here is pure and allocation-free; the buffer engine in
//! `med-lib` builds on these primitives.
//!
//! [`Point`]: point::Point

pub mod chars;
pub mod point;
pub mod rune;
pub mod visible;
