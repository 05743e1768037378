//! Cursor motions.
//!
//! A motion turns the cursor position into an inclusive character range.
//! Plain movement uses only `range.end`; line-wise motions rewrite both
//! ends. Word scanning distinguishes little words (runs of alphanumerics
//! and underscores, with punctuation runs as separate tokens) from big
//! words (any run of non-whitespace).

use med_core::{
  chars::CharClass,
  point::{
    Delta,
    Point,
  },
  rune,
};

use crate::{
  buffer::{
    Buffer,
    XClamp,
  },
  config::Config,
};

/// Inclusive character range a verb operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionRange {
  pub start: Point,
  pub end: Point,
}

impl MotionRange {
  pub fn at(point: Point) -> Self {
    Self { start: point, end: point }
  }

  /// Normalizes an inverted range into buffer order.
  pub fn sorted(self) -> Self {
    if self.end < self.start {
      Self { start: self.end, end: self.start }
    } else {
      self
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionKind {
  Left,
  Right,
  Up,
  Down,
  LittleWord,
  BigWord,
  EndLittleWord,
  EndBigWord,
  BeginLittleWord,
  BeginBigWord,
  SoftBeginLine,
  HardBeginLine,
  EndLine,
  EntireLine,
  PageUp,
  PageDown,
  HalfPageUp,
  HalfPageDown,
}

impl MotionKind {
  /// Whether a deleting or yanking verb consumes the rune the motion lands
  /// on. Exclusive motions (everything else) stop one short.
  pub fn is_inclusive(self) -> bool {
    matches!(
      self,
      MotionKind::EndLittleWord
        | MotionKind::EndBigWord
        | MotionKind::EndLine
        | MotionKind::EntireLine
    )
  }

  /// Vertical motions land on the remembered column rather than where the
  /// scan happened to stop.
  pub fn is_vertical(self) -> bool {
    matches!(
      self,
      MotionKind::Up
        | MotionKind::Down
        | MotionKind::PageUp
        | MotionKind::PageDown
        | MotionKind::HalfPageUp
        | MotionKind::HalfPageDown
    )
  }

  /// Applies the motion to `range`, reading position from `range.end`.
  /// Returns false when the motion has nowhere to go, which aborts the
  /// whole action.
  pub fn apply(
    self,
    buffer: &Buffer,
    view_height: usize,
    config: &Config,
    range: &mut MotionRange,
  ) -> bool {
    let p = range.end;
    match self {
      MotionKind::Left => {
        range.end = buffer.move_point(p, Delta::LEFT, config.tab_width, XClamp::Inside);
      },
      MotionKind::Right => {
        range.end = buffer.move_point(p, Delta::RIGHT, config.tab_width, XClamp::Inside);
      },
      MotionKind::Up => {
        range.end = buffer.move_point(p, Delta::UP, config.tab_width, XClamp::Inside);
      },
      MotionKind::Down => {
        range.end = buffer.move_point(p, Delta::DOWN, config.tab_width, XClamp::Inside);
      },
      MotionKind::LittleWord => match scan_forward_word(buffer, p, false) {
        Some(found) => range.end = found,
        None => return false,
      },
      MotionKind::BigWord => match scan_forward_word(buffer, p, true) {
        Some(found) => range.end = found,
        None => return false,
      },
      MotionKind::EndLittleWord => match scan_word_end(buffer, p, false) {
        Some(found) => range.end = found,
        None => return false,
      },
      MotionKind::EndBigWord => match scan_word_end(buffer, p, true) {
        Some(found) => range.end = found,
        None => return false,
      },
      MotionKind::BeginLittleWord => match scan_word_begin(buffer, p, false) {
        Some(found) => range.end = found,
        None => return false,
      },
      MotionKind::BeginBigWord => match scan_word_begin(buffer, p, true) {
        Some(found) => range.end = found,
        None => return false,
      },
      MotionKind::SoftBeginLine => {
        let Some(line) = buffer.line(p.y) else {
          return false;
        };
        let len = line.chars().count();
        range.end.x = line
          .chars()
          .position(|ch| !ch.is_whitespace())
          .unwrap_or(len);
      },
      MotionKind::HardBeginLine => {
        range.end.x = 0;
      },
      MotionKind::EndLine => {
        let Some(line) = buffer.line(p.y) else {
          return false;
        };
        let len = line.chars().count();
        if len == 0 {
          return false;
        }
        range.end.x = len - 1;
      },
      MotionKind::EntireLine => {
        let Some(line) = buffer.line(p.y) else {
          return false;
        };
        let len = line.chars().count();
        range.start = Point::new(0, p.y);
        range.end = Point::new(len.saturating_sub(1), p.y);
      },
      MotionKind::PageUp => {
        range.end.y = p.y.saturating_sub(view_height);
      },
      MotionKind::PageDown => {
        range.end.y = (p.y + view_height).min(buffer.line_count() - 1);
      },
      MotionKind::HalfPageUp => {
        range.end.y = p.y.saturating_sub(view_height / 2);
      },
      MotionKind::HalfPageDown => {
        range.end.y = (p.y + view_height / 2).min(buffer.line_count() - 1);
      },
    }
    true
  }
}

fn class_at(big: bool, ch: char) -> CharClass {
  if big {
    CharClass::big(ch)
  } else {
    CharClass::little(ch)
  }
}

/// Next addressable rune position after `p`, crossing line breaks.
fn step_forward(buffer: &Buffer, p: Point) -> Option<Point> {
  let len = buffer.line(p.y)?.chars().count();
  if p.x + 1 < len {
    Some(Point::new(p.x + 1, p.y))
  } else if p.y + 1 < buffer.line_count() {
    Some(Point::new(0, p.y + 1))
  } else {
    None
  }
}

/// Previous addressable rune position before `p`, crossing line breaks.
fn step_backward(buffer: &Buffer, p: Point) -> Option<Point> {
  if p.x > 0 {
    Some(Point::new(p.x - 1, p.y))
  } else if p.y > 0 {
    let len = buffer.line(p.y - 1)?.chars().count();
    Some(Point::new(len.saturating_sub(1), p.y - 1))
  } else {
    None
  }
}

/// The rune just before codepoint `x` in `line`, decoded backward.
fn prev_rune(line: &str, x: usize) -> Option<char> {
  let offset = rune::byte_index(line, x)?;
  let (rune, _) = rune::decode_last(&line.as_bytes()[..offset]).ok()?;
  Some(rune)
}

/// Start of the next word after `start`. The scan runs a small state
/// machine over the classes it passes through; crossing onto a new line
/// stops at its first rune unless that rune is whitespace.
fn scan_forward_word(buffer: &Buffer, start: Point, big: bool) -> Option<Point> {
  #[derive(Clone, Copy)]
  enum State {
    Word,
    Space,
    Other,
    NewLine,
  }

  let mut state = match buffer.rune(start).map(|ch| class_at(big, ch)) {
    Some(CharClass::Word) => State::Word,
    Some(CharClass::Space) => State::Space,
    Some(CharClass::Other) | None => State::Other,
  };

  let mut p = start;
  loop {
    p.x += 1;
    let rune = match buffer.rune(p) {
      Some(rune) => rune,
      None => {
        if p.y + 1 >= buffer.line_count() {
          // End of the buffer; the caller clamps back onto the line.
          return Some(p);
        }
        p = Point::new(0, p.y + 1);
        state = State::NewLine;
        match buffer.rune(p) {
          Some(rune) => rune,
          // An empty line is itself a word stop.
          None => return Some(p),
        }
      },
    };

    match (state, class_at(big, rune)) {
      (State::Word, CharClass::Word) => {},
      (State::Word, CharClass::Space) => state = State::Space,
      (State::Word, CharClass::Other) => return Some(p),
      (State::Space, CharClass::Space) => {},
      (State::Space, _) => return Some(p),
      (State::Other, CharClass::Other) => {},
      (State::Other, CharClass::Space) => state = State::Space,
      (State::Other, CharClass::Word) => return Some(p),
      (State::NewLine, CharClass::Space) => state = State::Space,
      (State::NewLine, _) => return Some(p),
    }
  }
}

/// Last rune of the next word at or after `start`, never `start` itself.
fn scan_word_end(buffer: &Buffer, start: Point, big: bool) -> Option<Point> {
  let mut p = step_forward(buffer, start)?;

  // Skip whitespace; line-break positions count as whitespace.
  loop {
    match buffer.rune(p) {
      Some(ch) if class_at(big, ch) != CharClass::Space => break,
      _ => p = step_forward(buffer, p)?,
    }
  }

  let class = class_at(big, buffer.rune(p)?);
  loop {
    let next = Point::new(p.x + 1, p.y);
    match buffer.rune(next) {
      Some(ch) if class_at(big, ch) == class => p = next,
      _ => return Some(p),
    }
  }
}

/// First rune of the word at or before `start`, never `start` itself.
fn scan_word_begin(buffer: &Buffer, start: Point, big: bool) -> Option<Point> {
  let mut p = step_backward(buffer, start)?;

  loop {
    match buffer.rune(p) {
      Some(ch) if class_at(big, ch) != CharClass::Space => break,
      _ => p = step_backward(buffer, p)?,
    }
  }

  // Walk back to the start of the class run.
  let class = class_at(big, buffer.rune(p)?);
  while p.x > 0 {
    let Some(line) = buffer.line(p.y) else {
      break;
    };
    match prev_rune(line, p.x) {
      Some(ch) if class_at(big, ch) == class => p.x -= 1,
      _ => break,
    }
  }
  Some(p)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn buffer(lines: &[&str]) -> Buffer {
    Buffer::from_text(&lines.join("\n"), "test")
  }

  fn run(kind: MotionKind, buffer: &Buffer, at: Point) -> Option<MotionRange> {
    let mut range = MotionRange::at(at);
    kind
      .apply(buffer, 20, &Config::default(), &mut range)
      .then_some(range)
  }

  #[test]
  fn forward_word_stops_at_the_next_token() {
    let buf = buffer(&["hello world"]);
    let range = run(MotionKind::LittleWord, &buf, Point::zero()).unwrap();
    assert_eq!(range.end, Point::new(6, 0));
  }

  #[test]
  fn forward_word_treats_punctuation_as_a_token() {
    let buf = buffer(&["foo.bar"]);
    let range = run(MotionKind::LittleWord, &buf, Point::zero()).unwrap();
    assert_eq!(range.end, Point::new(3, 0));
    let range = run(MotionKind::BigWord, &buf, Point::zero()).unwrap();
    // Big words run to the end of the buffer, clamped by the caller.
    assert_eq!(range.end.y, 0);
    assert!(range.end.x >= 7);
  }

  #[test]
  fn forward_word_crosses_lines() {
    let buf = buffer(&["one", "  two"]);
    let range = run(MotionKind::LittleWord, &buf, Point::zero()).unwrap();
    assert_eq!(range.end, Point::new(2, 1));
  }

  #[test]
  fn forward_word_stops_on_an_empty_line() {
    let buf = buffer(&["one", "", "two"]);
    let range = run(MotionKind::LittleWord, &buf, Point::zero()).unwrap();
    assert_eq!(range.end, Point::new(0, 1));
  }

  #[test]
  fn end_word_lands_on_the_last_rune() {
    let buf = buffer(&["hello world"]);
    let range = run(MotionKind::EndLittleWord, &buf, Point::zero()).unwrap();
    assert_eq!(range.end, Point::new(4, 0));
    let range = run(MotionKind::EndLittleWord, &buf, Point::new(4, 0)).unwrap();
    assert_eq!(range.end, Point::new(10, 0));
  }

  #[test]
  fn end_word_fails_at_the_buffer_end() {
    let buf = buffer(&["hello"]);
    assert!(run(MotionKind::EndLittleWord, &buf, Point::new(4, 0)).is_none());
  }

  #[test]
  fn begin_word_returns_to_the_word_start() {
    let buf = buffer(&["hello world"]);
    let range = run(MotionKind::BeginLittleWord, &buf, Point::new(6, 0)).unwrap();
    assert_eq!(range.end, Point::zero());
    let range = run(MotionKind::BeginLittleWord, &buf, Point::new(8, 0)).unwrap();
    assert_eq!(range.end, Point::new(6, 0));
  }

  #[test]
  fn begin_word_stops_before_a_punctuation_run() {
    let buf = buffer(&["foo.bar"]);
    let range = run(MotionKind::BeginLittleWord, &buf, Point::new(4, 0)).unwrap();
    assert_eq!(range.end, Point::new(3, 0));
    let range = run(MotionKind::BeginBigWord, &buf, Point::new(4, 0)).unwrap();
    assert_eq!(range.end, Point::zero());
  }

  #[test]
  fn begin_word_crosses_lines() {
    let buf = buffer(&["one", "two"]);
    let range = run(MotionKind::BeginLittleWord, &buf, Point::new(0, 1)).unwrap();
    assert_eq!(range.end, Point::zero());
  }

  #[test]
  fn begin_word_fails_at_the_origin() {
    let buf = buffer(&["one"]);
    assert!(run(MotionKind::BeginLittleWord, &buf, Point::zero()).is_none());
  }

  #[test]
  fn word_and_begin_word_are_symmetric() {
    let buf = buffer(&["alpha beta gamma"]);
    let forward = run(MotionKind::LittleWord, &buf, Point::new(6, 0)).unwrap();
    assert_eq!(forward.end, Point::new(11, 0));
    let back = run(MotionKind::BeginLittleWord, &buf, forward.end).unwrap();
    assert_eq!(back.end, Point::new(6, 0));
  }

  #[test]
  fn line_motions() {
    let buf = buffer(&["  indented"]);
    let range = run(MotionKind::SoftBeginLine, &buf, Point::new(7, 0)).unwrap();
    assert_eq!(range.end, Point::new(2, 0));
    let range = run(MotionKind::HardBeginLine, &buf, Point::new(7, 0)).unwrap();
    assert_eq!(range.end, Point::zero());
    let range = run(MotionKind::EndLine, &buf, Point::zero()).unwrap();
    assert_eq!(range.end, Point::new(9, 0));
  }

  #[test]
  fn end_line_fails_on_an_empty_line() {
    let buf = buffer(&[""]);
    assert!(run(MotionKind::EndLine, &buf, Point::zero()).is_none());
  }

  #[test]
  fn entire_line_rewrites_both_ends() {
    let buf = buffer(&["abc", "defg"]);
    let range = run(MotionKind::EntireLine, &buf, Point::new(2, 1)).unwrap();
    assert_eq!(range.start, Point::new(0, 1));
    assert_eq!(range.end, Point::new(3, 1));
  }

  #[test]
  fn page_motions_move_by_view_height() {
    let buf = buffer(&vec!["x"; 100]);
    let range = run(MotionKind::PageDown, &buf, Point::zero()).unwrap();
    assert_eq!(range.end.y, 20);
    let range = run(MotionKind::HalfPageDown, &buf, Point::zero()).unwrap();
    assert_eq!(range.end.y, 10);
    let range = run(MotionKind::PageUp, &buf, Point::new(0, 5)).unwrap();
    assert_eq!(range.end.y, 0);
    let range = run(MotionKind::PageDown, &buf, Point::new(0, 95)).unwrap();
    assert_eq!(range.end.y, 99);
  }

  #[test]
  fn sorted_normalizes_inverted_ranges() {
    let range = MotionRange {
      start: Point::new(3, 1),
      end: Point::new(5, 0),
    }
    .sorted();
    assert_eq!(range.start, Point::new(5, 0));
    assert_eq!(range.end, Point::new(3, 1));
  }
}
