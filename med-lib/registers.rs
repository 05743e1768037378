//! Yank registers.
//!
//! One register per printable ASCII rune; `"` is the default. A yank
//! remembers whether it was line-wise, which decides how a later paste
//! splices it back in.

use std::collections::HashMap;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegisterError>;

/// The register used when a command names none.
pub const DEFAULT_REGISTER: char = '"';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
  #[error("'{0}' is not a register")]
  Invalid(char),
  #[error("register '{0}' is empty")]
  Empty(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Yank {
  pub text: String,
  /// Line-wise yanks paste as whole lines above or below the cursor.
  pub line: bool,
}

#[derive(Debug, Default)]
pub struct YankRegisters {
  slots: HashMap<char, Yank>,
}

impl YankRegisters {
  pub fn write(&mut self, register: char, text: String, line: bool) -> Result<()> {
    let register = validate(register)?;
    self.slots.insert(register, Yank { text, line });
    Ok(())
  }

  pub fn read(&self, register: char) -> Result<&Yank> {
    let register = validate(register)?;
    self
      .slots
      .get(&register)
      .ok_or(RegisterError::Empty(register))
  }
}

fn validate(register: char) -> Result<char> {
  if ('!'..='~').contains(&register) {
    Ok(register)
  } else {
    Err(RegisterError::Invalid(register))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn write_then_read() {
    let mut registers = YankRegisters::default();
    registers.write('a', "hello".into(), false).unwrap();
    let yank = registers.read('a').unwrap();
    assert_eq!(yank.text, "hello");
    assert!(!yank.line);
  }

  #[test]
  fn registers_are_independent() {
    let mut registers = YankRegisters::default();
    registers.write(DEFAULT_REGISTER, "one".into(), true).unwrap();
    registers.write('z', "two".into(), false).unwrap();
    assert_eq!(registers.read(DEFAULT_REGISTER).unwrap().text, "one");
    assert_eq!(registers.read('z').unwrap().text, "two");
  }

  #[test]
  fn overwrite_replaces() {
    let mut registers = YankRegisters::default();
    registers.write('a', "old".into(), true).unwrap();
    registers.write('a', "new".into(), false).unwrap();
    assert_eq!(
      registers.read('a').unwrap(),
      &Yank { text: "new".into(), line: false }
    );
  }

  #[test]
  fn unset_register_is_empty() {
    let registers = YankRegisters::default();
    assert_eq!(registers.read('q'), Err(RegisterError::Empty('q')));
  }

  #[test]
  fn non_printable_names_are_invalid() {
    let mut registers = YankRegisters::default();
    assert_eq!(
      registers.write(' ', "x".into(), false),
      Err(RegisterError::Invalid(' '))
    );
    assert_eq!(registers.read('\u{7f}'), Err(RegisterError::Invalid('\u{7f}')));
  }
}
