//! A viewport onto a shared buffer.
//!
//! The view owns the cursor and the scroll origin; the buffer remembers a
//! saved pair so switching away and back lands where you left off. Scroll
//! x is in visible columns (tabs expanded), scroll y in lines.

use med_core::{
  point::Point,
  visible,
};

use crate::{
  buffer::{
    Buffer,
    SharedBuffer,
  },
  config::Config,
};

/// Screen region in cells. `right` and `bottom` are exclusive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
  pub left: usize,
  pub right: usize,
  pub top: usize,
  pub bottom: usize,
}

impl Rect {
  pub const fn new(left: usize, right: usize, top: usize, bottom: usize) -> Self {
    Self { left, right, top, bottom }
  }

  pub fn width(&self) -> usize {
    self.right.saturating_sub(self.left)
  }

  pub fn height(&self) -> usize {
    self.bottom.saturating_sub(self.top)
  }
}

#[derive(Debug)]
pub struct View {
  pub rect: Rect,
  pub scroll: Point,
  pub cursor: Point,
  pub buffer: SharedBuffer,
}

impl View {
  pub fn new(rect: Rect, buffer: SharedBuffer) -> Self {
    Self {
      rect,
      scroll: Point::zero(),
      cursor: Point::zero(),
      buffer,
    }
  }

  /// Rows visible in this view, the unit for page motions.
  pub fn height(&self) -> usize {
    self.rect.height()
  }

  /// Adjusts the scroll origin so the cursor stays inside the view with
  /// the configured scroll-off margins. Takes the locked buffer so callers
  /// already holding the guard don't re-lock.
  pub fn follow_cursor(&mut self, buffer: &Buffer, config: &Config) {
    let height = self.rect.height();
    let width = self.rect.width();
    let v_off = config.vertical_scroll_off.min(height / 2);
    let h_off = config.horizontal_scroll_off.min(width / 2);

    if self.cursor.y < self.scroll.y + v_off {
      self.scroll.y = self.cursor.y.saturating_sub(v_off);
    }
    let last_row = self.scroll.y + height.saturating_sub(1);
    if self.cursor.y + v_off > last_row {
      self.scroll.y = (self.cursor.y + v_off).saturating_sub(height.saturating_sub(1));
    }

    let line = buffer.line(self.cursor.y).unwrap_or("");
    let visible_x = visible::rune_index_to_visible(line, self.cursor.x, config.tab_width);
    if visible_x < self.scroll.x + h_off {
      self.scroll.x = visible_x.saturating_sub(h_off);
    }
    let last_col = self.scroll.x + width.saturating_sub(1);
    if visible_x + h_off > last_col {
      self.scroll.x = (visible_x + h_off).saturating_sub(width.saturating_sub(1));
    }
  }

  /// Points the view at another buffer, saving the cursor and scroll on
  /// the old one and restoring the pair saved on the new one.
  pub fn select_buffer(&mut self, buffer: SharedBuffer) {
    {
      let mut old = self.buffer.lock();
      old.saved_cursor = self.cursor;
      old.saved_scroll = self.scroll;
    }
    {
      let next = buffer.lock();
      self.cursor = next.saved_cursor;
      self.scroll = next.saved_scroll;
    }
    self.buffer = buffer;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::buffer::share;

  fn view(lines: &[&str], width: usize, height: usize) -> View {
    let buffer = share(Buffer::from_text(&lines.join("\n"), "test"));
    View::new(Rect::new(0, width, 0, height), buffer)
  }

  #[test]
  fn cursor_inside_the_view_does_not_scroll() {
    let mut view = view(&["a"; 40].to_vec(), 80, 20);
    view.cursor = Point::new(0, 3);
    let config = Config::default();
    let buffer = view.buffer.clone();
    view.follow_cursor(&buffer.lock(), &config);
    assert_eq!(view.scroll, Point::zero());
  }

  #[test]
  fn scrolls_down_keeping_the_offset() {
    let mut view = view(&["a"; 100].to_vec(), 80, 20);
    view.cursor = Point::new(0, 50);
    let config = Config::default();
    let buffer = view.buffer.clone();
    view.follow_cursor(&buffer.lock(), &config);
    // Cursor row 50 must sit vertical_scroll_off above the last row.
    assert_eq!(view.scroll.y, 50 + 5 - 19);
    // And scrolling back up respects the top margin.
    view.cursor = Point::new(0, view.scroll.y + 2);
    let y = view.cursor.y;
    view.follow_cursor(&buffer.lock(), &config);
    assert_eq!(view.scroll.y, y - 5);
  }

  #[test]
  fn horizontal_scroll_uses_visible_columns() {
    let long = "\t".repeat(4) + "abcdef";
    let mut view = view(&[long.as_str()], 20, 5);
    view.cursor = Point::new(4, 0); // 'a', visible column 32
    let config = Config::default();
    let buffer = view.buffer.clone();
    view.follow_cursor(&buffer.lock(), &config);
    assert_eq!(view.scroll.x, 32 + 10 - 19);
  }

  #[test]
  fn select_buffer_round_trips_cursor_and_scroll() {
    let first = share(Buffer::from_text("one\ntwo", "a"));
    let second = share(Buffer::from_text("three", "b"));
    let mut view = View::new(Rect::new(0, 80, 0, 24), first.clone());
    view.cursor = Point::new(2, 1);
    view.scroll = Point::new(0, 1);

    view.select_buffer(second);
    assert_eq!(view.cursor, Point::zero());

    view.cursor = Point::new(3, 0);
    view.select_buffer(first);
    assert_eq!(view.cursor, Point::new(2, 1));
    assert_eq!(view.scroll, Point::new(0, 1));
  }
}
