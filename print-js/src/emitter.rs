//! Output buffer that tracks token boundaries.
//!
//! Fragments are written through typed helpers so the emitter knows what kind of token ended the
//! output so far, and inserts the minimal whitespace needed to stop two adjacent tokens from being
//! lexed as one (e.g. `returnx`, `a+ +b`, `a- -b`). In pretty mode it also handles indentation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
  None,
  Word,
  Plus,
  Minus,
  Slash,
  // A regex literal; a following word would be read as flags.
  Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leading {
  Word,
  Plus,
  Minus,
  Slash,
  Star,
  Other,
}

fn needs_space(prev: Boundary, next: Leading) -> bool {
  matches!(
    (prev, next),
    (Boundary::Word, Leading::Word)
      | (Boundary::Plus, Leading::Plus)
      | (Boundary::Minus, Leading::Minus)
      | (Boundary::Slash, Leading::Slash)
      | (Boundary::Slash, Leading::Star)
      | (Boundary::Regex, Leading::Word)
      | (Boundary::Regex, Leading::Slash)
  )
}

fn is_word_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '$' || c == '\\' || c == '#'
}

fn classify_leading(text: &str) -> Leading {
  match text.chars().next() {
    Some('+') => Leading::Plus,
    Some('-') => Leading::Minus,
    Some('/') => Leading::Slash,
    Some('*') => Leading::Star,
    // `.5` must not merge with a preceding number or identifier.
    Some('.') if text.len() > 1 && text.as_bytes()[1].is_ascii_digit() => Leading::Word,
    Some(c) if is_word_char(c) => Leading::Word,
    _ => Leading::Other,
  }
}

fn classify_trailing(text: &str) -> Boundary {
  match text.chars().last() {
    Some('+') => Boundary::Plus,
    Some('-') => Boundary::Minus,
    Some('/') => Boundary::Slash,
    Some(c) if is_word_char(c) => Boundary::Word,
    _ => Boundary::None,
  }
}

#[derive(Debug, Clone)]
pub struct Emitter {
  out: String,
  pretty: bool,
  indent: usize,
  trailing: Boundary,
}

impl Emitter {
  pub fn new(pretty: bool) -> Emitter {
    Emitter {
      out: String::new(),
      pretty,
      indent: 0,
      trailing: Boundary::None,
    }
  }

  pub fn into_string(self) -> String {
    self.out
  }

  /// Writes a single token, inserting a space first if it would otherwise merge with the
  /// previous token.
  pub fn write_token(&mut self, text: &str) {
    if text.is_empty() {
      return;
    }
    if needs_space(self.trailing, classify_leading(text)) {
      self.out.push(' ');
    }
    self.out.push_str(text);
    self.trailing = classify_trailing(text);
  }

  pub fn write_keyword(&mut self, keyword: &str) {
    self.write_token(keyword);
  }

  pub fn write_identifier(&mut self, name: &str) {
    self.write_token(name);
  }

  pub fn write_punct(&mut self, punct: &str) {
    self.write_token(punct);
  }

  pub fn write_regex(&mut self, pattern: &str, flags: &str) {
    self.write_token("/");
    self.out.push_str(pattern);
    self.out.push('/');
    self.out.push_str(flags);
    self.trailing = Boundary::Regex;
  }

  /// Writes text that can't merge with neighbouring tokens, such as a quoted string.
  pub fn write_delimited(&mut self, text: &str) {
    self.out.push_str(text);
    self.trailing = Boundary::None;
  }

  /// Optional whitespace, only written in pretty mode.
  pub fn space(&mut self) {
    if self.pretty {
      self.out.push(' ');
      self.trailing = Boundary::None;
    }
  }

  /// Starts a new line at the current indentation in pretty mode.
  pub fn newline(&mut self) {
    if self.pretty {
      self.out.push('\n');
      for _ in 0..self.indent {
        self.out.push_str("  ");
      }
      self.trailing = Boundary::None;
    }
  }

  pub fn indent(&mut self) {
    self.indent += 1;
  }

  pub fn dedent(&mut self) {
    self.indent = self.indent.saturating_sub(1);
  }

  pub fn comma(&mut self) {
    self.write_punct(",");
    self.space();
  }
}

#[cfg(test)]
mod tests {
  use super::Emitter;

  #[test]
  fn separates_words_and_operators() {
    let mut e = Emitter::new(false);
    e.write_keyword("return");
    e.write_identifier("x");
    e.write_punct("+");
    e.write_punct("+");
    e.write_identifier("y");
    e.write_punct("-");
    e.write_punct("--");
    e.write_identifier("z");
    assert_eq!(e.into_string(), "return x+ +y- --z");
  }

  #[test]
  fn regex_flags_stay_separate() {
    let mut e = Emitter::new(false);
    e.write_regex("a", "g");
    e.write_keyword("in");
    e.write_punct("/");
    e.write_regex("b", "");
    e.write_punct("/");
    assert_eq!(e.into_string(), "/a/g in/ /b/ /");
  }

  #[test]
  fn pretty_indentation() {
    let mut e = Emitter::new(true);
    e.write_punct("{");
    e.indent();
    e.newline();
    e.write_identifier("a");
    e.dedent();
    e.newline();
    e.write_punct("}");
    assert_eq!(e.into_string(), "{\n  a\n}");
  }
}
