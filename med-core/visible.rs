//! Visible-column mapping.
//!
//! Translates between codepoint indices and on-screen columns. A tab
//! occupies `tab_width` columns; every other rune occupies one. Used only
//! for scroll and cursor display math, never for storage addressing.

/// On-screen column of the rune at `rune_index` in `line`.
///
/// Stops early if the line is shorter than the index, returning the column
/// one past the last rune, which is what cursor math wants at line end.
pub fn rune_index_to_visible(line: &str, rune_index: usize, tab_width: usize) -> usize {
  let mut visible = 0;
  for ch in line.chars().take(rune_index) {
    visible += if ch == '\t' { tab_width } else { 1 };
  }
  visible
}

/// Inverse of [`rune_index_to_visible`]: the codepoint index whose span
/// covers on-screen column `visible`.
///
/// A column that lands in the middle of a tab maps to the tab's own index
/// plus one, mirroring the forward walk consuming the whole tab at once.
pub fn visible_to_rune_index(line: &str, visible: usize, tab_width: usize) -> usize {
  let mut remaining = visible as i64;
  let mut index = 0;
  for ch in line.chars() {
    if remaining <= 0 {
      break;
    }
    remaining -= if ch == '\t' { tab_width as i64 } else { 1 };
    index += 1;
  }
  index
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_text_maps_one_to_one() {
    assert_eq!(rune_index_to_visible("hello", 3, 8), 3);
    assert_eq!(visible_to_rune_index("hello", 3, 8), 3);
  }

  #[test]
  fn tabs_expand_to_tab_width() {
    // "\tab": the tab covers columns 0..8, 'a' is at column 8.
    assert_eq!(rune_index_to_visible("\tab", 1, 8), 8);
    assert_eq!(rune_index_to_visible("\tab", 2, 8), 9);
    assert_eq!(visible_to_rune_index("\tab", 8, 8), 1);
    assert_eq!(visible_to_rune_index("\tab", 9, 8), 2);
  }

  #[test]
  fn column_inside_a_tab_rounds_past_it() {
    assert_eq!(visible_to_rune_index("\tab", 3, 8), 1);
  }

  #[test]
  fn short_lines_stop_at_the_end() {
    assert_eq!(rune_index_to_visible("ab", 10, 8), 2);
    assert_eq!(visible_to_rune_index("ab", 10, 8), 2);
  }

  #[test]
  fn multibyte_runes_are_single_columns() {
    assert_eq!(rune_index_to_visible("é🦀x", 2, 8), 2);
    assert_eq!(visible_to_rune_index("é🦀x", 2, 8), 2);
  }
}
