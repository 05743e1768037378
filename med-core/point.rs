//! The caret address type.

use std::cmp::Ordering;

/// A caret location in codepoint space: `x` is the codepoint column within
/// line `y`. Whether `x == line_len` (one past the last rune) is a valid
/// address depends on context; insertion allows it, motions do not.
///
/// Ordering is by `(y, x)`, i.e. buffer order, so normalizing an inverted
/// motion range is a plain comparison.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Point {
  pub x: usize,
  pub y: usize,
}

impl Point {
  pub const fn new(x: usize, y: usize) -> Self {
    Self { x, y }
  }

  pub const fn zero() -> Self {
    Self { x: 0, y: 0 }
  }
}

impl Ord for Point {
  fn cmp(&self, other: &Self) -> Ordering {
    (self.y, self.x).cmp(&(other.y, other.x))
  }
}

impl PartialOrd for Point {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl From<(usize, usize)> for Point {
  fn from(value: (usize, usize)) -> Self {
    Point::new(value.0, value.1)
  }
}

/// A signed displacement applied to a [`Point`] by `Buffer::move_point`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
  pub x: i64,
  pub y: i64,
}

impl Delta {
  pub const LEFT: Delta = Delta { x: -1, y: 0 };
  pub const RIGHT: Delta = Delta { x: 1, y: 0 };
  pub const UP: Delta = Delta { x: 0, y: -1 };
  pub const DOWN: Delta = Delta { x: 0, y: 1 };

  pub const fn new(x: i64, y: i64) -> Self {
    Self { x, y }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ordering_is_buffer_order() {
    assert!(Point::new(5, 0) < Point::new(0, 1));
    assert!(Point::new(2, 3) < Point::new(4, 3));
    assert_eq!(Point::new(1, 1).max(Point::new(0, 2)), Point::new(0, 2));
  }
}
