//! Character classification for word motions.

/// Fine-grained category of a single rune.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharCategory {
  Whitespace,
  Word,
  Punctuation,
  Unknown,
}

pub fn categorize_char(ch: char) -> CharCategory {
  match ch {
    c if c.is_whitespace() => CharCategory::Whitespace,
    c if char_is_little_word(c) => CharCategory::Word,
    c if char_is_punctuation(c) => CharCategory::Punctuation,
    _ => CharCategory::Unknown,
  }
}

/// The three classes the word-motion scanner distinguishes.
///
/// Little-word motions treat `Word` and `Other` as separate tokens; big-word
/// motions fold everything that is not whitespace into `Word`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
  Word,
  Space,
  Other,
}

impl CharClass {
  /// Classification at little-word granularity.
  pub fn little(ch: char) -> Self {
    match categorize_char(ch) {
      CharCategory::Whitespace => CharClass::Space,
      CharCategory::Word => CharClass::Word,
      CharCategory::Punctuation | CharCategory::Unknown => CharClass::Other,
    }
  }

  /// Classification at big-word granularity: anything that is not
  /// whitespace is part of the word.
  pub fn big(ch: char) -> Self {
    match categorize_char(ch) {
      CharCategory::Whitespace => CharClass::Space,
      _ => CharClass::Word,
    }
  }
}

/// Little-word constituent: alphanumeric or underscore.
#[inline]
pub fn char_is_little_word(ch: char) -> bool {
  ch.is_alphanumeric() || ch == '_'
}

#[inline]
pub fn char_is_punctuation(ch: char) -> bool {
  use unicode_general_category::{
    GeneralCategory,
    get_general_category,
  };

  matches!(
    get_general_category(ch),
    GeneralCategory::OtherPunctuation
      | GeneralCategory::OpenPunctuation
      | GeneralCategory::ClosePunctuation
      | GeneralCategory::InitialPunctuation
      | GeneralCategory::FinalPunctuation
      | GeneralCategory::ConnectorPunctuation
      | GeneralCategory::DashPunctuation
      | GeneralCategory::MathSymbol
      | GeneralCategory::CurrencySymbol
      | GeneralCategory::ModifierSymbol
  )
}
