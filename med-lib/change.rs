//! Undo history.
//!
//! Every committed edit is recorded as a [`Change`]: enough to replay it
//! (insert the string at the location) and to revert it (remove that many
//! codepoints there). Changes live on two stacks; undo pops from one and
//! pushes onto the other, so a fresh edit after an undo discards the redo
//! branch.
//!
//! A change with `chain` set belongs to the same user-visible group as the
//! change recorded just before it. Undo and redo always consume a whole
//! group, so a `cw` (delete plus the typed insertion) reverts as one step.

use med_core::point::Point;

use crate::buffer::{
  Buffer,
  Result,
};

/// One committed edit.
#[derive(Debug, Clone)]
pub struct Change {
  /// True for an insertion, false for a removal. `string` is the text that
  /// was inserted or removed.
  pub insertion: bool,
  pub string: String,
  pub location: Point,
  pub cursor_before: Point,
  pub cursor_after: Point,
  /// Whether reverting this removal should drop an emptied line entry.
  pub remove_line_if_empty: bool,
  /// Groups this change with the previously recorded one.
  pub chain: bool,
}

#[derive(Debug, Default)]
pub struct ChangeLog {
  undo: Vec<Change>,
  redo: Vec<Change>,
}

impl ChangeLog {
  fn record(&mut self, change: Change) {
    self.undo.push(change);
    self.redo.clear();
  }
}

impl Buffer {
  /// Appends `change` to the history. Any outstanding redo branch is
  /// discarded.
  pub fn record_change(&mut self, change: Change) {
    self.changes.record(change);
  }

  /// Reverts the most recent change group. Returns the cursor position
  /// from before the group was applied, or `None` when there is nothing
  /// to undo.
  pub fn undo(&mut self) -> Result<Option<Point>> {
    let Some(first) = self.changes.undo.pop() else {
      return Ok(None);
    };

    // Newest-first; keep popping while the popped change chains backward.
    let mut group = vec![first];
    while group.last().is_some_and(|change| change.chain) {
      match self.changes.undo.pop() {
        Some(change) => group.push(change),
        None => break,
      }
    }

    for change in &group {
      if change.insertion {
        let len = change.string.chars().count();
        self.remove_string(change.location, len, change.remove_line_if_empty)?;
      } else {
        self.insert_string(&change.string, change.location)?;
      }
    }

    let cursor = group.last().map(|change| change.cursor_before);
    // Pushed newest-first, so the redo stack's top is the group's earliest
    // change and redo replays in application order.
    self.changes.redo.extend(group);
    Ok(cursor)
  }

  /// Re-applies the change group most recently undone. Returns the cursor
  /// position from after the group was applied, or `None` when there is
  /// nothing to redo.
  pub fn redo(&mut self) -> Result<Option<Point>> {
    let Some(first) = self.changes.redo.pop() else {
      return Ok(None);
    };

    let mut group = vec![first];
    while self.changes.redo.last().is_some_and(|change| change.chain) {
      match self.changes.redo.pop() {
        Some(change) => group.push(change),
        None => break,
      }
    }

    for change in &group {
      if change.insertion {
        self.insert_string(&change.string, change.location)?;
      } else {
        let len = change.string.chars().count();
        self.remove_string(change.location, len, change.remove_line_if_empty)?;
      }
    }

    let cursor = group.last().map(|change| change.cursor_after);
    self.changes.undo.extend(group);
    Ok(cursor)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn buffer(lines: &[&str]) -> Buffer {
    Buffer::from_text(&lines.join("\n"), "test")
  }

  fn lines(buffer: &Buffer) -> Vec<&str> {
    buffer.lines().iter().map(String::as_str).collect()
  }

  fn insertion(string: &str, location: Point, chain: bool) -> Change {
    Change {
      insertion: true,
      string: string.to_string(),
      location,
      cursor_before: location,
      cursor_after: location,
      remove_line_if_empty: true,
      chain,
    }
  }

  #[test]
  fn undo_reverts_an_insertion() {
    let mut buf = buffer(&["bar"]);
    buf.insert_string("foo", Point::new(1, 0)).unwrap();
    buf.record_change(insertion("foo", Point::new(1, 0), false));

    let cursor = buf.undo().unwrap();
    assert_eq!(lines(&buf), ["bar"]);
    assert_eq!(cursor, Some(Point::new(1, 0)));

    let cursor = buf.redo().unwrap();
    assert_eq!(lines(&buf), ["bfooar"]);
    assert_eq!(cursor, Some(Point::new(1, 0)));
  }

  #[test]
  fn undo_reverts_a_removal() {
    let mut buf = buffer(&["hello world"]);
    buf.remove_string(Point::zero(), 6, true).unwrap();
    buf.record_change(Change {
      insertion: false,
      string: "hello ".to_string(),
      location: Point::zero(),
      cursor_before: Point::zero(),
      cursor_after: Point::zero(),
      remove_line_if_empty: true,
      chain: false,
    });

    assert_eq!(lines(&buf), ["world"]);
    buf.undo().unwrap();
    assert_eq!(lines(&buf), ["hello world"]);
    buf.redo().unwrap();
    assert_eq!(lines(&buf), ["world"]);
  }

  #[test]
  fn chained_changes_undo_as_one_group() {
    let mut buf = buffer(&["hello"]);
    // A change-word: remove "hello", then type "bye" as one group.
    buf.remove_string(Point::zero(), 5, false).unwrap();
    buf.record_change(Change {
      insertion: false,
      string: "hello".to_string(),
      location: Point::zero(),
      cursor_before: Point::new(0, 0),
      cursor_after: Point::zero(),
      remove_line_if_empty: false,
      chain: false,
    });
    for (i, ch) in "bye".chars().enumerate() {
      let at = Point::new(i, 0);
      buf.insert_rune(ch, at).unwrap();
      buf.record_change(Change {
        insertion: true,
        string: ch.to_string(),
        location: at,
        cursor_before: at,
        cursor_after: Point::new(i + 1, 0),
        remove_line_if_empty: true,
        chain: true,
      });
    }
    assert_eq!(lines(&buf), ["bye"]);

    let cursor = buf.undo().unwrap();
    assert_eq!(lines(&buf), ["hello"]);
    assert_eq!(cursor, Some(Point::zero()));

    let cursor = buf.redo().unwrap();
    assert_eq!(lines(&buf), ["bye"]);
    assert_eq!(cursor, Some(Point::new(3, 0)));
  }

  #[test]
  fn consecutive_groups_undo_separately() {
    let mut buf = buffer(&["x"]);
    buf.insert_string("a", Point::zero()).unwrap();
    buf.record_change(insertion("a", Point::zero(), false));
    buf.insert_string("b", Point::zero()).unwrap();
    buf.record_change(insertion("b", Point::zero(), false));
    assert_eq!(lines(&buf), ["bax"]);

    buf.undo().unwrap();
    assert_eq!(lines(&buf), ["ax"]);
    buf.undo().unwrap();
    assert_eq!(lines(&buf), ["x"]);
    assert_eq!(buf.undo().unwrap(), None);

    buf.redo().unwrap();
    buf.redo().unwrap();
    assert_eq!(lines(&buf), ["bax"]);
    assert_eq!(buf.redo().unwrap(), None);
  }

  #[test]
  fn a_new_change_discards_the_redo_branch() {
    let mut buf = buffer(&["x"]);
    buf.insert_string("a", Point::zero()).unwrap();
    buf.record_change(insertion("a", Point::zero(), false));
    buf.undo().unwrap();

    buf.insert_string("z", Point::zero()).unwrap();
    buf.record_change(insertion("z", Point::zero(), false));
    assert_eq!(buf.redo().unwrap(), None);
    assert_eq!(lines(&buf), ["zx"]);
  }
}
