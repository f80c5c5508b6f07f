/// Quotes a string value as a double-quoted literal, escaping characters that would otherwise
/// terminate or change the meaning of the literal. Non-ASCII characters are kept as UTF-8 except
/// the line separators U+2028/U+2029 and other invisible formatting characters.
pub fn quote_string(value: &str) -> String {
  let mut out = String::with_capacity(value.len() + 2);
  out.push('"');
  let mut chars = value.chars().peekable();
  while let Some(ch) = chars.next() {
    match ch {
      '\\' => out.push_str("\\\\"),
      '"' => out.push_str("\\\""),
      '\n' => out.push_str("\\n"),
      '\r' => out.push_str("\\r"),
      '\t' => out.push_str("\\t"),
      '\u{8}' => out.push_str("\\b"),
      '\u{b}' => out.push_str("\\v"),
      '\u{c}' => out.push_str("\\f"),
      '\0' => {
        let next_is_digit = chars.peek().is_some_and(|c| c.is_ascii_digit());
        if next_is_digit {
          out.push_str("\\x00");
        } else {
          out.push_str("\\0");
        }
      }
      '\u{2028}' => out.push_str("\\u2028"),
      '\u{2029}' => out.push_str("\\u2029"),
      '\u{feff}' => out.push_str("\\uFEFF"),
      ch if ch < '\u{20}' || ch == '\u{7f}' => {
        out.push_str(&format!("\\x{:02X}", ch as u32));
      }
      ch => out.push(ch),
    }
  }
  out.push('"');
  out
}

#[cfg(test)]
mod tests {
  use super::quote_string;

  #[test]
  fn escapes_quotes_and_backslashes() {
    assert_eq!(quote_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
    assert_eq!(quote_string("it's"), "\"it's\"");
  }

  #[test]
  fn escapes_control_characters() {
    assert_eq!(quote_string("a\nb\tc"), "\"a\\nb\\tc\"");
    assert_eq!(quote_string("a\u{0007}b"), "\"a\\x07b\"");
  }

  #[test]
  fn escapes_zero_followed_by_digit() {
    assert_eq!(quote_string("\u{0000}9"), "\"\\x009\"");
    assert_eq!(quote_string("\u{0000}a"), "\"\\0a\"");
  }

  #[test]
  fn escapes_line_separators() {
    assert_eq!(quote_string("a\u{2028}b"), "\"a\\u2028b\"");
  }
}
