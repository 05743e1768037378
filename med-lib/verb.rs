//! Verbs: what a parsed command does to the buffer.
//!
//! [`apply_action`] is the single entry point. It locks the view's buffer
//! once, runs the motion the requested number of times, and dispatches on
//! the verb, so a failed action leaves buffer, registers and history
//! untouched.

use med_core::point::Point;
use thiserror::Error;

use crate::{
  buffer::{
    Buffer,
    BufferError,
    XClamp,
  },
  change::Change,
  config::Config,
  motion::{
    MotionKind,
    MotionRange,
  },
  registers::RegisterError,
  view::View,
  vim::{
    Action,
    Mode,
    Vim,
  },
};

pub type Result<T> = std::result::Result<T, VimError>;

#[derive(Debug, Error)]
pub enum VimError {
  #[error("motion has nowhere to go")]
  MotionFailed,
  #[error("nothing to undo")]
  NothingToUndo,
  #[error("nothing to redo")]
  NothingToRedo,
  #[error(transparent)]
  Register(#[from] RegisterError),
  #[error(transparent)]
  Buffer(#[from] BufferError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbKind {
  /// Just move the cursor to the motion target.
  Motion,
  Delete,
  SetCharacter,
  /// Delete the range and splice the selected register's text in its
  /// place, as one undo group.
  Substitute,
  Yank,
  PasteBefore,
  PasteAfter,
  Undo,
  Redo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verb {
  pub kind: VerbKind,
  /// Payload rune for verbs that consume one, like `r`.
  pub rune: Option<char>,
}

impl Verb {
  pub fn new(kind: VerbKind) -> Self {
    Self { kind, rune: None }
  }
}

/// Executes a completed action against the view's buffer.
pub(crate) fn apply_action(
  vim: &mut Vim,
  action: &Action,
  view: &mut View,
  config: &Config,
) -> Result<()> {
  let buffer = view.buffer.clone();
  let mut buffer = buffer.lock();

  let mut range = MotionRange::at(view.cursor);
  if let Some(motion) = action.motion {
    let count = (action.multiplier as usize)
      .saturating_mul(action.motion_multiplier as usize)
      .max(1);
    for _ in 0..count {
      if !motion.apply(&buffer, view.height(), config, &mut range) {
        return Err(VimError::MotionFailed);
      }
    }
  }

  if let Some(verb) = action.verb {
    match verb.kind {
      VerbKind::Motion => move_cursor(vim, action, view, &mut buffer, range, config),
      VerbKind::Delete => delete(action, view, &mut buffer, range, config)?,
      VerbKind::SetCharacter => {
        if let Some(rune) = verb.rune {
          set_character(view, &mut buffer, range, config, rune)?;
        }
      },
      VerbKind::Substitute => substitute(vim, action, view, &mut buffer, range, config)?,
      VerbKind::Yank => yank(vim, action, &mut buffer, range)?,
      VerbKind::PasteBefore => paste(vim, action, view, &mut buffer, config, false)?,
      VerbKind::PasteAfter => paste(vim, action, view, &mut buffer, config, true)?,
      VerbKind::Undo => undo_redo(view, &mut buffer, config, true)?,
      VerbKind::Redo => undo_redo(view, &mut buffer, config, false)?,
    }
  }

  vim.mode = action.end_in_mode;
  vim.chain_undo = action.chain_undo;
  Ok(())
}

fn place_cursor(view: &mut View, buffer: &mut Buffer, config: &Config, point: Point) {
  view.cursor = point;
  buffer.cursor = point;
  view.follow_cursor(buffer, config);
}

/// Normalizes the range and, for exclusive motions, pulls the end back so
/// it no longer covers the rune the motion landed on.
fn exclusive_adjusted(buffer: &Buffer, motion: Option<MotionKind>, range: MotionRange) -> MotionRange {
  let mut range = range.sorted();
  let inclusive = motion.map_or(true, MotionKind::is_inclusive);
  if !inclusive && range.end > range.start {
    range.end = buffer.advance_point(range.end, -1);
  }
  range
}

fn move_cursor(
  vim: &mut Vim,
  action: &Action,
  view: &mut View,
  buffer: &mut Buffer,
  range: MotionRange,
  config: &Config,
) {
  let Some(motion) = action.motion else {
    return;
  };

  // Vertical motions land on the remembered column so stepping through a
  // short line doesn't lose the horizontal position.
  let mut target = range.end;
  if motion.is_vertical() {
    target.x = vim.motion_column;
  }
  let clamped = buffer.clamp_point(target, XClamp::Inside);
  // The remembered column follows a horizontal motion only when its raw
  // destination was already a valid column.
  if !motion.is_vertical() && clamped == target {
    vim.motion_column = clamped.x;
  }
  place_cursor(view, buffer, config, clamped);
}

fn delete(
  action: &Action,
  view: &mut View,
  buffer: &mut Buffer,
  range: MotionRange,
  config: &Config,
) -> Result<()> {
  let range = exclusive_adjusted(buffer, action.motion, range);

  // A line-wise delete takes the line's separator with it, so the change
  // record holds the exact removed stream and undo restores the split.
  // A change verb (`cc`) instead empties the line and inserts there.
  let line_wise = action.motion == Some(MotionKind::EntireLine)
    && action.end_in_mode == Mode::Normal
    && buffer.line_count() > 1;
  let (location, len) = if line_wise {
    let content = buffer.line_len(range.start.y)?;
    if range.start.y + 1 < buffer.line_count() {
      (Point::new(0, range.start.y), content + 1)
    } else {
      // Last line: the removal starts at the preceding break.
      let prev = range.start.y - 1;
      (Point::new(buffer.line_len(prev)?, prev), content + 1)
    }
  } else {
    (range.start, buffer.range_len(range.start, range.end)?)
  };

  let removed = buffer.dupe_string(location, len)?;
  buffer.remove_string(location, len, false)?;

  // A change verb goes on inserting where the text was, so past-end is
  // a valid place to leave the cursor.
  let clamp = if action.end_in_mode == Mode::Insert {
    XClamp::AllowPastEnd
  } else {
    XClamp::Inside
  };
  let cursor = buffer.clamp_point(range.start, clamp);

  // The delete opens a fresh undo group; for a change verb the typed
  // insertions then chain onto it.
  buffer.record_change(Change {
    insertion: false,
    string: removed,
    location,
    cursor_before: view.cursor,
    cursor_after: cursor,
    remove_line_if_empty: false,
    chain: false,
  });

  place_cursor(view, buffer, config, cursor);
  Ok(())
}

fn set_character(
  view: &mut View,
  buffer: &mut Buffer,
  range: MotionRange,
  config: &Config,
  rune: char,
) -> Result<()> {
  let range = range.sorted();
  let cursor_before = view.cursor;
  let mut chain = false;

  let mut p = range.start;
  loop {
    // Line-break positions are left alone.
    if buffer.contains_point(p) {
      let removed = buffer.dupe_string(p, 1)?;
      buffer.remove_string(p, 1, false)?;
      buffer.record_change(Change {
        insertion: false,
        string: removed,
        location: p,
        cursor_before,
        cursor_after: p,
        remove_line_if_empty: false,
        chain,
      });
      chain = true;
      buffer.insert_rune(rune, p)?;
      buffer.record_change(Change {
        insertion: true,
        string: rune.to_string(),
        location: p,
        cursor_before,
        cursor_after: p,
        remove_line_if_empty: false,
        chain: true,
      });
    }

    if p >= range.end {
      break;
    }
    let next = buffer.advance_point(p, 1);
    if next == p {
      break;
    }
    p = next;
  }

  let cursor = buffer.clamp_point(range.end, XClamp::Inside);
  place_cursor(view, buffer, config, cursor);
  Ok(())
}

fn substitute(
  vim: &mut Vim,
  action: &Action,
  view: &mut View,
  buffer: &mut Buffer,
  range: MotionRange,
  config: &Config,
) -> Result<()> {
  // Read the register first: an empty one aborts before any mutation.
  let yank = vim.registers.read(action.register())?.clone();
  let range = exclusive_adjusted(buffer, action.motion, range);
  let len = buffer.range_len(range.start, range.end)?;
  let cursor_before = view.cursor;

  let removed = buffer.dupe_string(range.start, len)?;
  buffer.remove_string(range.start, len, false)?;
  buffer.record_change(Change {
    insertion: false,
    string: removed,
    location: range.start,
    cursor_before,
    cursor_after: range.start,
    remove_line_if_empty: false,
    chain: false,
  });

  buffer.insert_string(&yank.text, range.start)?;
  let inserted = yank.text.chars().count() as i64;
  let cursor_after = buffer.advance_point(range.start, (inserted - 1).max(0));
  buffer.record_change(Change {
    insertion: true,
    string: yank.text,
    location: range.start,
    cursor_before,
    cursor_after,
    remove_line_if_empty: false,
    chain: true,
  });

  let cursor = buffer.clamp_point(cursor_after, XClamp::Inside);
  place_cursor(view, buffer, config, cursor);
  Ok(())
}

fn yank(vim: &mut Vim, action: &Action, buffer: &mut Buffer, range: MotionRange) -> Result<()> {
  let range = exclusive_adjusted(buffer, action.motion, range);
  let len = buffer.range_len(range.start, range.end)?;
  let text = buffer.dupe_string(range.start, len)?;
  vim.registers.write(action.register(), text, action.yank_line)?;
  Ok(())
}

fn paste(
  vim: &mut Vim,
  action: &Action,
  view: &mut View,
  buffer: &mut Buffer,
  config: &Config,
  after: bool,
) -> Result<()> {
  let yank = vim.registers.read(action.register())?.clone();
  let cursor = view.cursor;

  let (text, location, line_cursor) = if yank.line {
    let y = if after { cursor.y + 1 } else { cursor.y };
    if y >= buffer.line_count() {
      // Below the last line: lead with the break instead of trailing it.
      let last = buffer.line_count() - 1;
      let location = Point::new(buffer.line_len(last)?, last);
      let text = format!("\n{}", yank.text);
      (text, location, Some(Point::new(0, last + 1)))
    } else {
      let location = Point::new(0, y);
      let mut text = yank.text.clone();
      text.push('\n');
      (text, location, Some(location))
    }
  } else {
    let line_len = buffer.line_len(cursor.y)?;
    let x = if after { (cursor.x + 1).min(line_len) } else { cursor.x };
    (yank.text.clone(), Point::new(x, cursor.y), None)
  };

  buffer.insert_string(&text, location)?;
  let cursor_after = match line_cursor {
    Some(point) => point,
    // Land on the last pasted rune.
    None => {
      let len = text.chars().count() as i64;
      buffer.advance_point(location, (len - 1).max(0))
    },
  };
  buffer.record_change(Change {
    insertion: true,
    string: text,
    location,
    cursor_before: cursor,
    cursor_after,
    remove_line_if_empty: false,
    chain: action.chain_undo,
  });

  let cursor = buffer.clamp_point(cursor_after, XClamp::Inside);
  place_cursor(view, buffer, config, cursor);
  Ok(())
}

fn undo_redo(view: &mut View, buffer: &mut Buffer, config: &Config, undo: bool) -> Result<()> {
  let restored = if undo { buffer.undo()? } else { buffer.redo()? };
  match restored {
    Some(cursor) => {
      let cursor = buffer.clamp_point(cursor, XClamp::Inside);
      place_cursor(view, buffer, config, cursor);
      Ok(())
    },
    None if undo => Err(VimError::NothingToUndo),
    None => Err(VimError::NothingToRedo),
  }
}
