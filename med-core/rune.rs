//! UTF-8 rune codec.
//!
//! Forward and reverse decoding over raw byte slices, encoding, codepoint
//! counting, and codepoint-index to byte-offset translation. The buffer
//! stores lines as owned `String`s, but file loading and backward motion
//! scans work directly on bytes, so the codec is explicit about malformed
//! input instead of assuming validity.

use thiserror::Error;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, RuneError>;

/// Errors produced while decoding or encoding UTF-8 runes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuneError {
  #[error("byte {0:#04x} is not a valid utf-8 lead byte")]
  InvalidLead(u8),
  #[error("byte {0:#04x} is not a valid utf-8 continuation byte")]
  InvalidContinuation(u8),
  #[error("input ends in the middle of a multi-byte sequence")]
  Truncated,
  #[error("value {0:#x} is not a unicode scalar")]
  InvalidCodepoint(u32),
  #[error("destination holds {available} bytes but the rune needs {needed}")]
  BufferTooSmall { needed: usize, available: usize },
}

/// Decodes the rune at the start of `bytes`, returning it together with the
/// number of bytes it occupies.
pub fn decode(bytes: &[u8]) -> Result<(char, usize)> {
  let lead = *bytes.first().ok_or(RuneError::Truncated)?;

  // 0xxxxxxx / 110xxxxx / 1110xxxx / 11110xxx lead forms.
  let (len, mut value) = match lead {
    b if b & 0x80 == 0x00 => (1, u32::from(b)),
    b if b & 0xE0 == 0xC0 => (2, u32::from(b & 0x1F)),
    b if b & 0xF0 == 0xE0 => (3, u32::from(b & 0x0F)),
    b if b & 0xF8 == 0xF0 => (4, u32::from(b & 0x07)),
    b => return Err(RuneError::InvalidLead(b)),
  };

  if bytes.len() < len {
    return Err(RuneError::Truncated);
  }

  for &b in &bytes[1..len] {
    if b & 0xC0 != 0x80 {
      return Err(RuneError::InvalidContinuation(b));
    }
    value = (value << 6) | u32::from(b & 0x3F);
  }

  let rune = char::from_u32(value).ok_or(RuneError::InvalidCodepoint(value))?;
  Ok((rune, len))
}

/// Decodes the rune whose final byte is the last byte of `bytes`.
///
/// Scans backward over continuation-pattern bytes (at most three) and never
/// reads before the start of the slice. Fails if the trailing bytes do not
/// form exactly one rune.
pub fn decode_last(bytes: &[u8]) -> Result<(char, usize)> {
  if bytes.is_empty() {
    return Err(RuneError::Truncated);
  }

  let mut start = bytes.len() - 1;
  while start > 0 && bytes[start] & 0xC0 == 0x80 && bytes.len() - start < 4 {
    start -= 1;
  }

  let (rune, len) = decode(&bytes[start..])?;
  if start + len != bytes.len() {
    return Err(RuneError::Truncated);
  }
  Ok((rune, len))
}

/// Encodes `rune` into `out`, returning the number of bytes written.
pub fn encode(rune: char, out: &mut [u8]) -> Result<usize> {
  let needed = rune.len_utf8();
  if out.len() < needed {
    return Err(RuneError::BufferTooSmall {
      needed,
      available: out.len(),
    });
  }
  Ok(rune.encode_utf8(&mut out[..needed]).len())
}

/// Counts the runes in `bytes`, failing if the input ends mid-sequence or
/// contains a malformed lead byte.
pub fn rune_count(bytes: &[u8]) -> Result<usize> {
  let mut count = 0;
  let mut rest = bytes;
  while !rest.is_empty() {
    let (_, len) = decode(rest)?;
    rest = &rest[len..];
    count += 1;
  }
  Ok(count)
}

/// Translates a rune index into a byte offset within `s`.
///
/// An index equal to the rune count maps to `s.len()` so one-past-end is
/// addressable for insertion; anything beyond that returns `None`.
pub fn byte_index(s: &str, rune_index: usize) -> Option<usize> {
  let mut offset = 0;
  let mut runes = s.chars();
  for _ in 0..rune_index {
    offset += runes.next()?.len_utf8();
  }
  Some(offset)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decode_each_length() {
    assert_eq!(decode(b"a").unwrap(), ('a', 1));
    assert_eq!(decode("é".as_bytes()).unwrap(), ('é', 2));
    assert_eq!(decode("€".as_bytes()).unwrap(), ('€', 3));
    assert_eq!(decode("🦀".as_bytes()).unwrap(), ('🦀', 4));
  }

  #[test]
  fn decode_rejects_malformed_input() {
    assert_eq!(decode(&[]), Err(RuneError::Truncated));
    assert_eq!(decode(&[0xFF]), Err(RuneError::InvalidLead(0xFF)));
    // Lead byte of a 2-byte form with nothing after it.
    assert_eq!(decode(&[0xC3]), Err(RuneError::Truncated));
    // Lead byte followed by a second lead instead of a continuation.
    assert_eq!(decode(&[0xC3, 0xC3]), Err(RuneError::InvalidContinuation(0xC3)));
  }

  #[test]
  fn decode_last_walks_back_over_continuations() {
    assert_eq!(decode_last("ab".as_bytes()).unwrap(), ('b', 1));
    assert_eq!(decode_last("aé".as_bytes()).unwrap(), ('é', 2));
    assert_eq!(decode_last("a🦀".as_bytes()).unwrap(), ('🦀', 4));
    assert_eq!(decode_last(&[]), Err(RuneError::Truncated));
  }

  #[test]
  fn decode_last_never_reads_before_slice_start() {
    // The slice starts inside a multi-byte sequence; the scan must stop at
    // the slice boundary and report the malformed tail.
    let crab = "🦀".as_bytes();
    assert!(decode_last(&crab[1..]).is_err());
  }

  #[test]
  fn encode_round_trips() {
    let mut buf = [0u8; 4];
    for rune in ['a', 'é', '€', '🦀'] {
      let written = encode(rune, &mut buf).unwrap();
      assert_eq!(decode(&buf[..written]).unwrap(), (rune, written));
    }
  }

  #[test]
  fn encode_reports_small_destination() {
    let mut buf = [0u8; 2];
    assert_eq!(encode('€', &mut buf), Err(RuneError::BufferTooSmall {
      needed:    3,
      available: 2,
    }));
  }

  #[test]
  fn rune_count_counts_codepoints_not_bytes() {
    assert_eq!(rune_count("héllo".as_bytes()).unwrap(), 5);
    assert_eq!(rune_count(b"").unwrap(), 0);
    // Ends mid-sequence.
    assert_eq!(rune_count(&[b'a', 0xC3]), Err(RuneError::Truncated));
  }

  #[test]
  fn byte_index_addresses_one_past_end() {
    let s = "héllo";
    assert_eq!(byte_index(s, 0), Some(0));
    assert_eq!(byte_index(s, 1), Some(1));
    assert_eq!(byte_index(s, 2), Some(3));
    assert_eq!(byte_index(s, 5), Some(s.len()));
    assert_eq!(byte_index(s, 6), None);
  }
}
