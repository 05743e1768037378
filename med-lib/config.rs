//! Editor configuration, deserialized from TOML.

use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid config: {0}")]
  Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// On-screen width of a tab, in columns.
  pub tab_width: usize,
  /// Columns kept between the cursor and a horizontal view edge.
  pub horizontal_scroll_off: usize,
  /// Rows kept between the cursor and a vertical view edge.
  pub vertical_scroll_off: usize,
  /// Expand an inserted tab into `tab_width` spaces.
  pub insert_spaces_on_tab: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      tab_width: 8,
      horizontal_scroll_off: 10,
      vertical_scroll_off: 5,
      insert_spaces_on_tab: false,
    }
  }
}

impl Config {
  pub fn from_toml_str(text: &str) -> Result<Self> {
    Ok(toml::from_str(text)?)
  }
}
