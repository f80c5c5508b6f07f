use ahash::HashSet;
use once_cell::sync::Lazy;

/// A set of characters, used by the lexer to consume runs of digits or identifier parts.
#[derive(Clone)]
pub struct CharFilter {
  chars: HashSet<char>,
}

impl CharFilter {
  fn of(ranges: &[(char, char)], extra: &str) -> CharFilter {
    let chars = ranges
      .iter()
      .flat_map(|&(lo, hi)| lo..=hi)
      .chain(extra.chars())
      .collect();
    CharFilter { chars }
  }

  pub fn has(&self, c: char) -> bool {
    self.chars.contains(&c)
  }
}

pub const ECMASCRIPT_LINE_TERMINATORS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

pub fn is_line_terminator(c: char) -> bool {
  ECMASCRIPT_LINE_TERMINATORS.contains(&c)
}

/// Tab, vertical tab, form feed, space, the Unicode space separators and the BOM.
pub const ECMASCRIPT_WHITESPACE: [char; 21] = [
  '\x09', '\x0b', '\x0c', '\x20', '\u{00A0}', '\u{1680}', '\u{2000}', '\u{2001}', '\u{2002}',
  '\u{2003}', '\u{2004}', '\u{2005}', '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}',
  '\u{202F}', '\u{205F}', '\u{3000}', '\u{FEFF}',
];

/// Whitespace as `String.prototype.trim` and `Number()` see it, line terminators included.
pub fn is_whitespace(c: char) -> bool {
  ECMASCRIPT_WHITESPACE.contains(&c) || is_line_terminator(c)
}

pub const ID_START_CHARSTR: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz$_";
pub const ID_CONTINUE_CHARSTR: &str =
  "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz$_0123456789";

// The `_` numeric separator is accepted here and stripped when the literal is decoded.
pub static DIGIT_DEC: Lazy<CharFilter> = Lazy::new(|| CharFilter::of(&[('0', '9')], "_"));
pub static DIGIT_BIN: Lazy<CharFilter> = Lazy::new(|| CharFilter::of(&[('0', '1')], "_"));
pub static DIGIT_OCT: Lazy<CharFilter> = Lazy::new(|| CharFilter::of(&[('0', '7')], "_"));
// Unicode escapes use this one, and they don't allow separators.
pub static DIGIT_HEX: Lazy<CharFilter> =
  Lazy::new(|| CharFilter::of(&[('0', '9'), ('a', 'f'), ('A', 'F')], ""));
pub static DIGIT_HEX_SEP: Lazy<CharFilter> =
  Lazy::new(|| CharFilter::of(&[('0', '9'), ('a', 'f'), ('A', 'F')], "_"));

pub static ID_START: Lazy<CharFilter> = Lazy::new(|| CharFilter::of(&[], ID_START_CHARSTR));
pub static ID_CONTINUE: Lazy<CharFilter> = Lazy::new(|| CharFilter::of(&[], ID_CONTINUE_CHARSTR));

/// Whether `name` can be written as a plain identifier token (reserved words included).
pub fn is_identifier_name(name: &str) -> bool {
  let mut chars = name.chars();
  let Some(first) = chars.next() else {
    return false;
  };
  (ID_START.has(first) || (!first.is_ascii() && first.is_alphabetic()))
    && chars.all(|c| ID_CONTINUE.has(c) || (!c.is_ascii() && c.is_alphanumeric()))
}

#[cfg(test)]
mod tests {
  use super::is_identifier_name;
  use super::DIGIT_HEX;
  use super::DIGIT_HEX_SEP;

  #[test]
  fn identifier_names() {
    assert!(is_identifier_name("_0x1f2e"));
    assert!(is_identifier_name("$"));
    assert!(is_identifier_name("café"));
    assert!(!is_identifier_name(""));
    assert!(!is_identifier_name("1abc"));
    assert!(!is_identifier_name("a-b"));
    assert!(!is_identifier_name("a b"));
  }

  #[test]
  fn hex_digits() {
    assert!(DIGIT_HEX.has('F') && DIGIT_HEX.has('7'));
    assert!(!DIGIT_HEX.has('_') && DIGIT_HEX_SEP.has('_'));
    assert!(!DIGIT_HEX_SEP.has('g'));
  }
}
