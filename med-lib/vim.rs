//! The modal command state machine.
//!
//! Normal-mode keys accumulate into a pending command, which is re-parsed
//! from scratch on every keystroke against the bind table. The grammar is
//! `[count] ["register] [verb] [count] motion`, with doubled verbs (`dd`,
//! `yy`) standing in for the entire-line motion. A parse either completes
//! into an [`Action`], wants more keys, or is invalid and clears the
//! pending command.
//!
//! Insert mode bypasses the parser: printable keys splice straight into
//! the buffer and chain onto the current undo group.

use med_core::point::{
  Delta,
  Point,
};
use smallvec::SmallVec;

use crate::{
  buffer::XClamp,
  change::Change,
  config::Config,
  motion::MotionKind,
  registers::{
    DEFAULT_REGISTER,
    YankRegisters,
  },
  verb::{
    self,
    Verb,
    VerbKind,
  },
  view::View,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  #[default]
  Normal,
  Insert,
}

/// A key press, decoded by the terminal layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
  Char(char),
  Left,
  Right,
  Up,
  Down,
  Backspace,
  Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseResult {
  /// The command is a full action and has been (or can be) executed.
  Complete,
  /// A valid prefix; more keys are needed.
  InProgress,
  /// The binding wants the next raw key as its payload.
  ConsumeAdditionalKey,
  /// The binding is done with its keys; parsing resumes at the next one.
  Continue,
  /// The keys cannot form an action.
  Invalid,
  /// The binding rejected the key in the current parse state.
  KeyNotHandled,
}

/// What a bound key contributes to the action being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
  EnterInsert,
  Motion(MotionKind),
  Delete,
  Change,
  SetCharacter,
  Substitute,
  Yank,
  SelectRegister,
  PasteBefore,
  PasteAfter,
  Undo,
  Redo,
}

impl Binding {
  fn parse(self, action: &mut Action, key: char) -> ParseResult {
    match self {
      Binding::EnterInsert => {
        if action.motion.is_some() || action.verb.is_some() {
          return ParseResult::KeyNotHandled;
        }
        action.end_in_mode = Mode::Insert;
        ParseResult::Complete
      },
      Binding::Motion(kind) => {
        if action.motion.is_some() {
          return ParseResult::KeyNotHandled;
        }
        action.motion = Some(kind);
        if action.verb.is_none() {
          action.verb = Some(Verb::new(VerbKind::Motion));
        }
        ParseResult::Complete
      },
      Binding::Delete => match action.verb {
        None => {
          action.verb = Some(Verb::new(VerbKind::Delete));
          ParseResult::InProgress
        },
        Some(verb) if verb.kind == VerbKind::Delete && action.motion.is_none() => {
          action.motion = Some(MotionKind::EntireLine);
          ParseResult::Complete
        },
        Some(_) => ParseResult::KeyNotHandled,
      },
      Binding::Change => {
        let result = Binding::Delete.parse(action, key);
        if result != ParseResult::KeyNotHandled {
          action.end_in_mode = Mode::Insert;
          action.chain_undo = true;
        }
        result
      },
      Binding::SetCharacter => match &mut action.verb {
        None => {
          action.verb = Some(Verb::new(VerbKind::SetCharacter));
          ParseResult::ConsumeAdditionalKey
        },
        Some(verb) if verb.kind == VerbKind::SetCharacter && verb.rune.is_none() => {
          verb.rune = Some(key);
          ParseResult::Complete
        },
        Some(_) => ParseResult::KeyNotHandled,
      },
      Binding::Substitute => match action.verb {
        None => {
          action.verb = Some(Verb::new(VerbKind::Substitute));
          ParseResult::InProgress
        },
        Some(verb) if verb.kind == VerbKind::Substitute && action.motion.is_none() => {
          action.motion = Some(MotionKind::EntireLine);
          ParseResult::Complete
        },
        Some(_) => ParseResult::KeyNotHandled,
      },
      Binding::Yank => match action.verb {
        None => {
          action.verb = Some(Verb::new(VerbKind::Yank));
          ParseResult::InProgress
        },
        Some(verb) if verb.kind == VerbKind::Yank && action.motion.is_none() => {
          action.motion = Some(MotionKind::EntireLine);
          action.yank_line = true;
          ParseResult::Complete
        },
        Some(_) => ParseResult::KeyNotHandled,
      },
      Binding::SelectRegister => match action.register {
        None => {
          // The next key names the register.
          action.register = Some(DEFAULT_REGISTER);
          ParseResult::ConsumeAdditionalKey
        },
        Some(DEFAULT_REGISTER) => {
          action.register = Some(key);
          ParseResult::Continue
        },
        Some(_) => ParseResult::KeyNotHandled,
      },
      Binding::PasteBefore => terminal_verb(action, VerbKind::PasteBefore),
      Binding::PasteAfter => terminal_verb(action, VerbKind::PasteAfter),
      Binding::Undo => terminal_verb(action, VerbKind::Undo),
      Binding::Redo => terminal_verb(action, VerbKind::Redo),
    }
  }
}

fn terminal_verb(action: &mut Action, kind: VerbKind) -> ParseResult {
  if action.verb.is_some() || action.motion.is_some() {
    return ParseResult::KeyNotHandled;
  }
  action.verb = Some(Verb::new(kind));
  ParseResult::Complete
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBind {
  pub key: char,
  pub binding: Binding,
}

/// A fully parsed command, ready to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
  pub multiplier: u32,
  pub motion_multiplier: u32,
  pub motion: Option<MotionKind>,
  pub verb: Option<Verb>,
  pub register: Option<char>,
  pub end_in_mode: Mode,
  /// Chain the resulting changes onto the previous undo group.
  pub chain_undo: bool,
  /// The yank was line-wise (`yy`).
  pub yank_line: bool,
}

impl Default for Action {
  fn default() -> Self {
    Self {
      multiplier: 1,
      motion_multiplier: 1,
      motion: None,
      verb: None,
      register: None,
      end_in_mode: Mode::Normal,
      chain_undo: false,
      yank_line: false,
    }
  }
}

impl Action {
  /// The register this action reads or writes.
  pub fn register(&self) -> char {
    self.register.unwrap_or(DEFAULT_REGISTER)
  }
}

/// Parses an accumulated key sequence against the bind table.
fn parse_action(keys: &[char], binds: &[KeyBind]) -> (ParseResult, Action) {
  let mut action = Action::default();
  let mut result = ParseResult::InProgress;
  let mut i = 0;

  // Leading count. A bare '0' is not a count, it is the hard-begin motion.
  if keys.first().is_some_and(|key| key.is_ascii_digit() && *key != '0') {
    let mut count = String::new();
    while i < keys.len() && keys[i].is_ascii_digit() {
      count.push(keys[i]);
      i += 1;
    }
    action.multiplier = count.parse().unwrap_or(1);
  }

  while i < keys.len() {
    // A second count may sit between the verb and its motion.
    if action.verb.is_some()
      && action.motion.is_none()
      && keys[i].is_ascii_digit()
      && keys[i] != '0'
    {
      let mut count = String::new();
      while i < keys.len() && keys[i].is_ascii_digit() {
        count.push(keys[i]);
        i += 1;
      }
      action.motion_multiplier = count.parse().unwrap_or(1);
      result = ParseResult::InProgress;
      continue;
    }

    let key = keys[i];
    i += 1;

    // A binding may decline the key in the current parse state; the scan
    // then falls through to the next table entry for the same key.
    let mut handled = None;
    for bind in binds.iter().filter(|bind| bind.key == key) {
      result = bind.binding.parse(&mut action, key);
      if result != ParseResult::KeyNotHandled {
        handled = Some(bind);
        break;
      }
    }
    let Some(bind) = handled else {
      return (ParseResult::Invalid, action);
    };
    loop {
      match result {
        ParseResult::ConsumeAdditionalKey => {
          // Feed the binding the next raw key, bypassing the table.
          let Some(&extra) = keys.get(i) else {
            return (ParseResult::ConsumeAdditionalKey, action);
          };
          i += 1;
          result = bind.binding.parse(&mut action, extra);
        },
        ParseResult::Continue => {
          result = ParseResult::InProgress;
          break;
        },
        ParseResult::Complete => return (ParseResult::Complete, action),
        ParseResult::InProgress => break,
        ParseResult::Invalid | ParseResult::KeyNotHandled => {
          return (ParseResult::Invalid, action);
        },
      }
    }
  }

  (result, action)
}

#[derive(Debug)]
pub struct Vim {
  pub mode: Mode,
  pub registers: YankRegisters,
  current_command: SmallVec<[char; 16]>,
  key_binds: Vec<KeyBind>,
  /// Column vertical motions try to return to.
  pub(crate) motion_column: usize,
  /// Whether the next recorded change joins the current undo group.
  pub(crate) chain_undo: bool,
}

impl Default for Vim {
  fn default() -> Self {
    Self::new()
  }
}

impl Vim {
  pub fn new() -> Self {
    let binds = [
      ('i', Binding::EnterInsert),
      ('w', Binding::Motion(MotionKind::LittleWord)),
      ('W', Binding::Motion(MotionKind::BigWord)),
      ('e', Binding::Motion(MotionKind::EndLittleWord)),
      ('E', Binding::Motion(MotionKind::EndBigWord)),
      ('b', Binding::Motion(MotionKind::BeginLittleWord)),
      ('B', Binding::Motion(MotionKind::BeginBigWord)),
      ('h', Binding::Motion(MotionKind::Left)),
      ('l', Binding::Motion(MotionKind::Right)),
      ('k', Binding::Motion(MotionKind::Up)),
      ('j', Binding::Motion(MotionKind::Down)),
      ('^', Binding::Motion(MotionKind::SoftBeginLine)),
      ('0', Binding::Motion(MotionKind::HardBeginLine)),
      ('$', Binding::Motion(MotionKind::EndLine)),
      ('\u{2}', Binding::Motion(MotionKind::PageUp)), // ctrl-b
      ('\u{6}', Binding::Motion(MotionKind::PageDown)), // ctrl-f
      ('\u{15}', Binding::Motion(MotionKind::HalfPageUp)), // ctrl-u
      ('\u{4}', Binding::Motion(MotionKind::HalfPageDown)), // ctrl-d
      ('d', Binding::Delete),
      ('c', Binding::Change),
      ('r', Binding::SetCharacter),
      ('y', Binding::Yank),
      ('"', Binding::SelectRegister),
      ('P', Binding::PasteBefore),
      ('p', Binding::PasteAfter),
      ('u', Binding::Undo),
      ('\u{12}', Binding::Redo), // ctrl-r
    ];

    Self {
      mode: Mode::Normal,
      registers: YankRegisters::default(),
      current_command: SmallVec::new(),
      key_binds: binds
        .into_iter()
        .map(|(key, binding)| KeyBind { key, binding })
        .collect(),
      motion_column: 0,
      chain_undo: false,
    }
  }

  /// Binds `key` to `binding`. The new bind is consulted first; earlier
  /// binds for the same key remain as fallbacks for when it declines.
  pub fn bind_key(&mut self, key: char, binding: Binding) {
    self.key_binds.insert(0, KeyBind { key, binding });
  }

  /// Feeds one key press into the state machine, editing through `view`.
  pub fn handle_key(&mut self, view: &mut View, key: Key, config: &Config) -> ParseResult {
    match self.mode {
      Mode::Normal => self.handle_normal_key(view, key, config),
      Mode::Insert => self.handle_insert_key(view, key, config),
    }
  }

  fn handle_normal_key(&mut self, view: &mut View, key: Key, config: &Config) -> ParseResult {
    match key {
      Key::Escape => {
        self.current_command.clear();
        ParseResult::Invalid
      },
      Key::Left | Key::Backspace => self.run_motion(view, MotionKind::Left, config),
      Key::Right => self.run_motion(view, MotionKind::Right, config),
      Key::Up => self.run_motion(view, MotionKind::Up, config),
      Key::Down => self.run_motion(view, MotionKind::Down, config),
      Key::Char(ch) => {
        self.current_command.push(ch);
        let (result, action) = parse_action(&self.current_command, &self.key_binds);
        match result {
          ParseResult::Complete => {
            self.current_command.clear();
            if let Err(err) = verb::apply_action(self, &action, view, config) {
              tracing::warn!(%err, "command failed");
            }
            ParseResult::Complete
          },
          ParseResult::Invalid => {
            tracing::debug!(
              command = %self.current_command.iter().collect::<String>(),
              "invalid command"
            );
            self.current_command.clear();
            ParseResult::Invalid
          },
          other => other,
        }
      },
    }
  }

  fn run_motion(&mut self, view: &mut View, kind: MotionKind, config: &Config) -> ParseResult {
    let action = Action {
      motion: Some(kind),
      verb: Some(Verb::new(VerbKind::Motion)),
      ..Action::default()
    };
    if let Err(err) = verb::apply_action(self, &action, view, config) {
      tracing::warn!(%err, "motion failed");
    }
    ParseResult::Complete
  }

  fn handle_insert_key(&mut self, view: &mut View, key: Key, config: &Config) -> ParseResult {
    match key {
      Key::Escape => {
        self.mode = Mode::Normal;
        self.chain_undo = false;
        let buffer = view.buffer.clone();
        let mut buffer = buffer.lock();
        let cursor = buffer.clamp_point(view.cursor, XClamp::Inside);
        view.cursor = cursor;
        buffer.cursor = cursor;
        ParseResult::Complete
      },
      Key::Char(ch) => {
        if ch == '\t' && config.insert_spaces_on_tab {
          let spaces = " ".repeat(config.tab_width);
          self.insert_text(view, &spaces, config)
        } else {
          let mut buf = [0u8; 4];
          let text = ch.encode_utf8(&mut buf);
          self.insert_text(view, text, config)
        }
      },
      Key::Backspace => self.insert_backspace(view, config),
      Key::Left => self.insert_move(view, Delta::LEFT, config),
      Key::Right => self.insert_move(view, Delta::RIGHT, config),
      Key::Up => self.insert_move(view, Delta::UP, config),
      Key::Down => self.insert_move(view, Delta::DOWN, config),
    }
  }

  fn insert_text(&mut self, view: &mut View, text: &str, config: &Config) -> ParseResult {
    let buffer = view.buffer.clone();
    let mut buffer = buffer.lock();
    let cursor = view.cursor;
    if let Err(err) = buffer.insert_string(text, cursor) {
      tracing::warn!(%err, "insert failed");
      return ParseResult::Invalid;
    }
    let after = buffer.advance_point(cursor, text.chars().count() as i64);
    buffer.record_change(Change {
      insertion: true,
      string: text.to_string(),
      location: cursor,
      cursor_before: cursor,
      cursor_after: after,
      remove_line_if_empty: false,
      chain: self.chain_undo,
    });
    self.chain_undo = true;
    view.cursor = after;
    buffer.cursor = after;
    view.follow_cursor(&buffer, config);
    ParseResult::Complete
  }

  fn insert_backspace(&mut self, view: &mut View, config: &Config) -> ParseResult {
    if view.cursor == Point::zero() {
      return ParseResult::Invalid;
    }
    let buffer = view.buffer.clone();
    let mut buffer = buffer.lock();
    let cursor = view.cursor;
    let target = buffer.advance_point(cursor, -1);
    if target == cursor {
      return ParseResult::Invalid;
    }

    let removed = match buffer.dupe_string(target, 1) {
      Ok(removed) => removed,
      Err(err) => {
        tracing::warn!(%err, "backspace failed");
        return ParseResult::Invalid;
      },
    };
    if let Err(err) = buffer.remove_string(target, 1, false) {
      tracing::warn!(%err, "backspace failed");
      return ParseResult::Invalid;
    }
    buffer.record_change(Change {
      insertion: false,
      string: removed,
      location: target,
      cursor_before: cursor,
      cursor_after: target,
      remove_line_if_empty: false,
      chain: self.chain_undo,
    });
    self.chain_undo = true;
    view.cursor = target;
    buffer.cursor = target;
    view.follow_cursor(&buffer, config);
    ParseResult::Complete
  }

  fn insert_move(&mut self, view: &mut View, delta: Delta, config: &Config) -> ParseResult {
    let buffer = view.buffer.clone();
    let mut buffer = buffer.lock();
    let cursor = buffer.move_point(view.cursor, delta, config.tab_width, XClamp::AllowPastEnd);
    view.cursor = cursor;
    buffer.cursor = cursor;
    view.follow_cursor(&buffer, config);
    // Moving the caret ends the current undo group.
    self.chain_undo = false;
    ParseResult::Complete
  }
}
