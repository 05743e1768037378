//! Line-based text buffer.
//!
//! A [`Buffer`] owns an ordered sequence of lines, one per screen row, with
//! no embedded newlines; "emptying" a buffer leaves exactly one empty line,
//! never zero. All addressing is in codepoint space via [`Point`].
//!
//! Two actors share a buffer at runtime: the input handler mutates it and
//! the renderer reads it on a cadence. Sharing goes through
//! [`SharedBuffer`]; the `parking_lot` guard scope is the critical section
//! and every operation below is synchronous and bounded, so the lock is
//! never held across a suspension point.

use std::{
  collections::TryReserveError,
  fs,
  io,
  path::Path,
  sync::Arc,
};

use med_core::{
  point::{
    Delta,
    Point,
  },
  rune::{
    self,
    RuneError,
  },
  visible,
};
use parking_lot::Mutex;
use thiserror::Error;

use crate::change::ChangeLog;

/// Result type for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;

/// Errors produced by buffer operations. All of these are recoverable at
/// the call site; a failed operation leaves the buffer exactly as it was.
#[derive(Debug, Error)]
pub enum BufferError {
  #[error("point ({},{}) is outside the buffer", .0.x, .0.y)]
  InvalidPoint(Point),
  #[error("line {0} is out of bounds")]
  LineOutOfBounds(usize),
  #[error("buffer is readonly")]
  Readonly,
  #[error("a buffer needs at least one line")]
  ZeroLines,
  #[error("malformed utf-8: {0}")]
  MalformedText(#[from] RuneError),
  #[error("allocation failed: {0}")]
  Allocation(#[from] TryReserveError),
  #[error(transparent)]
  Io(#[from] io::Error),
}

/// Lifecycle status of a buffer, shown in status lines and consulted
/// before writes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BufferStatus {
  #[default]
  None,
  Modified,
  ReadOnly,
  NewFile,
}

/// File-type tag consumed by the (external) syntax highlighter; the core
/// only detects and carries it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
  #[default]
  Plain,
  C,
  Cpp,
  Rust,
  Python,
  Java,
  Bash,
  Config,
  Diff,
}

impl FileType {
  pub fn from_path(path: &Path) -> Self {
    match path.extension().and_then(|e| e.to_str()) {
      Some("c" | "h") => FileType::C,
      Some("cc" | "cpp" | "cxx" | "hpp") => FileType::Cpp,
      Some("rs") => FileType::Rust,
      Some("py") => FileType::Python,
      Some("java") => FileType::Java,
      Some("sh" | "bash") => FileType::Bash,
      Some("toml" | "ini" | "conf" | "cfg") => FileType::Config,
      Some("diff" | "patch") => FileType::Diff,
      _ => FileType::Plain,
    }
  }
}

/// Horizontal clamping policy for point math. `Inside` keeps `x` on an
/// existing rune (motion and viewing contexts); `AllowPastEnd` permits
/// `x == line_len` (insertion contexts).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XClamp {
  Inside,
  AllowPastEnd,
}

/// A buffer shared between the input and rendering actors.
pub type SharedBuffer = Arc<Mutex<Buffer>>;

#[derive(Debug)]
pub struct Buffer {
  lines: Vec<String>,
  pub name: String,
  pub status: BufferStatus,
  pub file_type: FileType,
  pub cursor: Point,
  /// Cursor/scroll pair restored when a view re-selects this buffer.
  pub saved_cursor: Point,
  pub saved_scroll: Point,
  pub(crate) changes: ChangeLog,
}

impl Buffer {
  /// Allocates a buffer of `line_count` empty lines.
  pub fn new(line_count: usize, name: impl Into<String>) -> Result<Self> {
    if line_count == 0 {
      return Err(BufferError::ZeroLines);
    }
    Ok(Self {
      lines: vec![String::new(); line_count],
      name: name.into(),
      status: BufferStatus::Modified,
      file_type: FileType::Plain,
      cursor: Point::zero(),
      saved_cursor: Point::zero(),
      saved_scroll: Point::zero(),
      changes: ChangeLog::default(),
    })
  }

  /// Builds a buffer from already-decoded text, splitting on `\n`.
  pub fn from_text(text: &str, name: impl Into<String>) -> Self {
    let lines = text.split('\n').map(str::to_string).collect();
    Self {
      lines,
      name: name.into(),
      status: BufferStatus::None,
      file_type: FileType::Plain,
      cursor: Point::zero(),
      saved_cursor: Point::zero(),
      saved_scroll: Point::zero(),
      changes: ChangeLog::default(),
    }
  }

  /// Builds a buffer from raw bytes, decoding strictly so malformed input
  /// is reported instead of silently replaced.
  pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self> {
    let mut lines = vec![String::new()];
    let mut rest = bytes;
    while !rest.is_empty() {
      let (rune, len) = rune::decode(rest)?;
      rest = &rest[len..];
      if rune == '\n' {
        lines.push(String::new());
      } else if let Some(line) = lines.last_mut() {
        line.push(rune);
      }
    }
    let mut buffer = Self::from_text("", name);
    buffer.lines = lines;
    Ok(buffer)
  }

  /// Loads a file, stripping a single trailing newline. A missing file
  /// yields an empty `NewFile` buffer; an unwritable one is `ReadOnly`.
  pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let name = path.to_string_lossy().into_owned();

    let bytes = match fs::read(path) {
      Ok(bytes) => bytes,
      Err(err) if err.kind() == io::ErrorKind::NotFound => {
        tracing::debug!(file = %name, "creating new file buffer");
        let mut buffer = Buffer::new(1, name)?;
        buffer.status = BufferStatus::NewFile;
        buffer.file_type = FileType::from_path(path);
        return Ok(buffer);
      },
      Err(err) => return Err(err.into()),
    };

    let bytes = match bytes.split_last() {
      Some((b'\n', rest)) => rest,
      _ => &bytes[..],
    };

    let mut buffer = Self::from_bytes(bytes, name)?;
    buffer.file_type = FileType::from_path(path);
    let readonly = fs::metadata(path)?.permissions().readonly();
    buffer.status = if readonly {
      BufferStatus::ReadOnly
    } else {
      BufferStatus::None
    };
    tracing::debug!(file = %buffer.name, lines = buffer.lines.len(), "loaded file");
    Ok(buffer)
  }

  /// Writes the lines back to the file named by `name`, joined with `\n`
  /// and ending in a trailing newline.
  pub fn save(&mut self) -> Result<()> {
    if self.status == BufferStatus::ReadOnly {
      return Err(BufferError::Readonly);
    }
    let mut contents = self.lines.join("\n");
    contents.push('\n');
    fs::write(&self.name, contents)?;
    self.status = BufferStatus::None;
    tracing::debug!(file = %self.name, "saved buffer");
    Ok(())
  }

  /// Replaces the contents with exactly one empty line.
  pub fn empty(&mut self) {
    self.lines.clear();
    self.lines.push(String::new());
    self.cursor = Point::zero();
    self.changes = ChangeLog::default();
    self.mark_modified();
  }

  #[inline]
  pub fn line_count(&self) -> usize {
    self.lines.len()
  }

  #[inline]
  pub fn line(&self, y: usize) -> Option<&str> {
    self.lines.get(y).map(String::as_str)
  }

  /// All lines, for rendering.
  #[inline]
  pub fn lines(&self) -> &[String] {
    &self.lines
  }

  /// Codepoint count of line `y`.
  pub fn line_len(&self, y: usize) -> Result<usize> {
    self
      .lines
      .get(y)
      .map(|line| line.chars().count())
      .ok_or(BufferError::LineOutOfBounds(y))
  }

  /// The rune at `point`, `None` at line end or outside the buffer.
  pub fn rune(&self, point: Point) -> Option<char> {
    self.lines.get(point.y)?.chars().nth(point.x)
  }

  /// True when `point` addresses an existing rune, or column 0 of an
  /// empty line.
  pub fn contains_point(&self, point: Point) -> bool {
    let Some(line) = self.lines.get(point.y) else {
      return false;
    };
    let len = line.chars().count();
    point.x < len || (len == 0 && point.x == 0)
  }

  /// Like [`contains_point`], but also accepts one-past-end of the line.
  ///
  /// [`contains_point`]: Self::contains_point
  pub fn point_is_valid(&self, point: Point) -> bool {
    let Some(line) = self.lines.get(point.y) else {
      return false;
    };
    point.x <= line.chars().count()
  }

  /// Clamps `point` to the nearest addressable position.
  pub fn clamp_point(&self, point: Point, clamp: XClamp) -> Point {
    let y = point.y.min(self.lines.len().saturating_sub(1));
    let len = self.lines[y].chars().count();
    let max_x = match clamp {
      XClamp::AllowPastEnd => len,
      XClamp::Inside => len.saturating_sub(1),
    };
    Point::new(point.x.min(max_x), y)
  }

  /// Applies a signed displacement to `point`.
  ///
  /// A vertical delta preserves the *visible* column: the current column is
  /// translated through tab expansion, the row moves (clamped to the buffer),
  /// and the visible column is translated back against the destination line.
  /// The horizontal delta is then applied and clamped per `clamp`.
  ///
  /// An invalid starting point is returned unchanged.
  pub fn move_point(&self, point: Point, delta: Delta, tab_width: usize, clamp: XClamp) -> Point {
    if !self.point_is_valid(point) {
      return point;
    }

    let mut point = point;
    if delta.y != 0 {
      let current = visible::rune_index_to_visible(&self.lines[point.y], point.x, tab_width);
      let max_y = (self.lines.len() - 1) as i64;
      point.y = (point.y as i64 + delta.y).clamp(0, max_y) as usize;
      point.x = visible::visible_to_rune_index(&self.lines[point.y], current, tab_width);
    }

    let len = self.lines[point.y].chars().count() as i64;
    let x = point.x as i64 + delta.x;
    point.x = match clamp {
      XClamp::AllowPastEnd => x.clamp(0, len),
      XClamp::Inside => {
        if len == 0 {
          0
        } else {
          x.clamp(0, len - 1)
        }
      },
    } as usize;
    point
  }

  /// Steps `point` by `delta` codepoints through the buffer, where each
  /// line break counts as one codepoint. Clamps at the buffer ends.
  pub fn advance_point(&self, point: Point, delta: i64) -> Point {
    let mut point = self.clamp_point(point, XClamp::AllowPastEnd);

    if delta >= 0 {
      let mut remaining = delta as usize;
      while remaining > 0 {
        let len = self.lines[point.y].chars().count();
        if point.x < len {
          let step = remaining.min(len - point.x);
          point.x += step;
          remaining -= step;
        } else if point.y + 1 < self.lines.len() {
          point.y += 1;
          point.x = 0;
          remaining -= 1;
        } else {
          break;
        }
      }
    } else {
      let mut remaining = delta.unsigned_abs() as usize;
      while remaining > 0 {
        if point.x > 0 {
          let step = remaining.min(point.x);
          point.x -= step;
          remaining -= step;
        } else if point.y > 0 {
          point.y -= 1;
          point.x = self.lines[point.y].chars().count();
          remaining -= 1;
        } else {
          break;
        }
      }
    }
    point
  }

  /// Codepoint count of the inclusive range `start..=end`, counting each
  /// line break as one codepoint. `start` must not be after `end`.
  pub fn range_len(&self, start: Point, end: Point) -> Result<usize> {
    if !self.point_is_valid(start) || start > end {
      return Err(BufferError::InvalidPoint(start));
    }
    if !self.point_is_valid(end) {
      return Err(BufferError::InvalidPoint(end));
    }

    if start.y == end.y {
      return Ok(end.x - start.x + 1);
    }

    // Rest of the start line plus its newline, whole interior lines plus
    // their newlines, then the end line up to and including end.x.
    let mut len = self.line_len(start.y)? - start.x + 1;
    for y in start.y + 1..end.y {
      len += self.line_len(y)? + 1;
    }
    Ok(len + end.x + 1)
  }

  /// Copies `len` codepoints starting at `point` into an owned string,
  /// line breaks represented as `\n`. Stops early at the end of the buffer.
  pub fn dupe_string(&self, point: Point, len: usize) -> Result<String> {
    if !self.point_is_valid(point) {
      return Err(BufferError::InvalidPoint(point));
    }

    let mut out = String::new();
    let mut x = point.x;
    let mut y = point.y;
    let mut remaining = len;
    while remaining > 0 {
      let line = &self.lines[y];
      let line_len = line.chars().count();
      if x < line_len {
        let take = remaining.min(line_len - x);
        let from = rune::byte_index(line, x).ok_or(BufferError::InvalidPoint(point))?;
        let to = rune::byte_index(line, x + take).ok_or(BufferError::InvalidPoint(point))?;
        out.push_str(&line[from..to]);
        x += take;
        remaining -= take;
      } else if y + 1 < self.lines.len() {
        out.push('\n');
        y += 1;
        x = 0;
        remaining -= 1;
      } else {
        break;
      }
    }
    Ok(out)
  }

  /// Splices `string` into the buffer at `point`.
  ///
  /// Without line breaks this is an in-line splice. With line breaks the
  /// target line is split at `point.x`: the first segment joins the prefix,
  /// interior segments become new lines, and the final segment is glued to
  /// the text after the point. When the point sits at the end of a
  /// non-empty line with lines below it and the string opens with text,
  /// the string's final break lands on the existing boundary, so the last
  /// segment joins the following line instead of opening a new one.
  /// Nothing is mutated on failure.
  pub fn insert_string(&mut self, string: &str, point: Point) -> Result<()> {
    if self.status == BufferStatus::ReadOnly {
      return Err(BufferError::Readonly);
    }
    if !self.point_is_valid(point) {
      return Err(BufferError::InvalidPoint(point));
    }
    if string.is_empty() {
      return Ok(());
    }

    let offset =
      rune::byte_index(&self.lines[point.y], point.x).ok_or(BufferError::InvalidPoint(point))?;

    if !string.contains('\n') {
      let line = &mut self.lines[point.y];
      line.try_reserve(string.len())?;
      line.insert_str(offset, string);
    } else {
      let new_line_count = string.matches('\n').count();
      self.lines.try_reserve(new_line_count)?;

      let suffix = self.lines[point.y][offset..].to_string();
      let mut segments = string.split('\n');
      let first = segments.next().unwrap_or("");
      let mut new_lines: Vec<String> = segments.map(str::to_string).collect();

      let join_next = suffix.is_empty()
        && offset > 0
        && !first.is_empty()
        && point.y + 1 < self.lines.len();
      self.lines[point.y].try_reserve(first.len())?;
      if join_next {
        if let Some(last) = new_lines.pop() {
          let next = &mut self.lines[point.y + 1];
          next.try_reserve(last.len())?;
          next.insert_str(0, &last);
        }
      } else if let Some(last) = new_lines.last_mut() {
        last.push_str(&suffix);
      }

      let line = &mut self.lines[point.y];
      line.truncate(offset);
      line.push_str(first);
      self.lines.splice(point.y + 1..point.y + 1, new_lines);
    }

    self.mark_modified();
    Ok(())
  }

  /// Single-rune convenience over [`insert_string`].
  ///
  /// [`insert_string`]: Self::insert_string
  pub fn insert_rune(&mut self, rune: char, point: Point) -> Result<()> {
    let mut buf = [0u8; 4];
    self.insert_string(rune.encode_utf8(&mut buf), point)
  }

  /// Removes `len` codepoints starting at `point`, counting each line
  /// break as one codepoint. `point` may sit one past the line end, where
  /// the removal starts with the line break itself.
  ///
  /// When the removal exactly consumes the remainder of the line and began
  /// at column 0, `remove_line_if_empty` deletes the line entry instead of
  /// leaving an empty line behind. A removal that spans lines merges the
  /// unremoved prefix of the start line with the unremoved suffix of the
  /// end line and deletes everything in between.
  pub fn remove_string(&mut self, point: Point, len: usize, remove_line_if_empty: bool) -> Result<()> {
    if self.status == BufferStatus::ReadOnly {
      return Err(BufferError::Readonly);
    }
    if !self.point_is_valid(point) {
      return Err(BufferError::InvalidPoint(point));
    }
    if len == 0 {
      return Ok(());
    }

    let line_remainder = self.line_len(point.y)? - point.x;

    if len < line_remainder {
      // (a) stays within the line: splice it out.
      let line = &mut self.lines[point.y];
      let from = rune::byte_index(line, point.x).ok_or(BufferError::InvalidPoint(point))?;
      let to = rune::byte_index(line, point.x + len).ok_or(BufferError::InvalidPoint(point))?;
      line.replace_range(from..to, "");
    } else if len == line_remainder {
      // (b) exactly the remainder: drop the line entry or truncate.
      if point.x == 0 && remove_line_if_empty && self.lines.len() > 1 {
        self.lines.remove(point.y);
      } else {
        let line = &mut self.lines[point.y];
        let from = rune::byte_index(line, point.x).ok_or(BufferError::InvalidPoint(point))?;
        line.truncate(from);
      }
    } else {
      // (c) spans lines: merge the start-line prefix with the end-line
      // suffix and delete the lines in between.
      let mut remaining = len - line_remainder - 1;
      let mut end_y = point.y + 1;
      while end_y < self.lines.len() {
        let line_len = self.line_len(end_y)?;
        if remaining <= line_len {
          break;
        }
        remaining -= line_len + 1;
        end_y += 1;
      }

      let prefix_end =
        rune::byte_index(&self.lines[point.y], point.x).ok_or(BufferError::InvalidPoint(point))?;

      if end_y >= self.lines.len() {
        // Ran past the last line: remove to the end of the buffer.
        self.lines[point.y].truncate(prefix_end);
        self.lines.truncate(point.y + 1);
      } else {
        let end_line = &self.lines[end_y];
        let suffix_start =
          rune::byte_index(end_line, remaining).ok_or(BufferError::InvalidPoint(point))?;
        let suffix = end_line[suffix_start..].to_string();
        self.lines[point.y].truncate(prefix_end);
        self.lines[point.y].push_str(&suffix);
        self.lines.drain(point.y + 1..=end_y);
      }
    }

    self.mark_modified();
    Ok(())
  }

  /// Removes `count` whole lines starting at `line_start`, keeping the
  /// one-line invariant.
  pub fn remove_lines(&mut self, line_start: usize, count: usize) -> Result<()> {
    if self.status == BufferStatus::ReadOnly {
      return Err(BufferError::Readonly);
    }
    if line_start >= self.lines.len() {
      return Err(BufferError::LineOutOfBounds(line_start));
    }

    let end = (line_start + count).min(self.lines.len());
    self.lines.drain(line_start..end);
    if self.lines.is_empty() {
      self.lines.push(String::new());
    }
    self.mark_modified();
    Ok(())
  }

  fn mark_modified(&mut self) {
    if self.status != BufferStatus::ReadOnly {
      self.status = BufferStatus::Modified;
    }
  }
}

/// Wraps a buffer for sharing between actors.
pub fn share(buffer: Buffer) -> SharedBuffer {
  Arc::new(Mutex::new(buffer))
}
