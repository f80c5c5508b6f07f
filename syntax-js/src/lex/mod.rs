//! Tokenizer. The parser asks for one token at a time and says how a `/` or a `}` should be read,
//! since that depends on the grammar position.

use crate::char::CharFilter;
use crate::char::DIGIT_BIN;
use crate::char::DIGIT_DEC;
use crate::char::DIGIT_HEX;
use crate::char::DIGIT_HEX_SEP;
use crate::char::DIGIT_OCT;
use crate::char::ECMASCRIPT_LINE_TERMINATORS;
use crate::char::ECMASCRIPT_WHITESPACE;
use crate::char::ID_CONTINUE;
use crate::char::ID_CONTINUE_CHARSTR;
use crate::char::ID_START;
use crate::char::ID_START_CHARSTR;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::TT;
use ahash::HashMap;
use ahash::HashSet;
use aho_corasick::AhoCorasick;
use aho_corasick::AhoCorasickBuilder;
use aho_corasick::AhoCorasickKind;
use aho_corasick::Anchored;
use aho_corasick::Input;
use aho_corasick::MatchKind;
use aho_corasick::StartKind;
use core::ops::Index;
use memchr::memchr;
use memchr::memchr3;
use once_cell::sync::Lazy;

#[cfg(test)]
mod tests;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LexMode {
  SlashIsRegex,
  Standard,
  /// Just after the `}` closing a template substitution.
  TemplateStrContinue,
}

const OPERATORS: &[(TT, &str)] = &[
  (TT::Ampersand, "&"),
  (TT::AmpersandAmpersand, "&&"),
  (TT::AmpersandAmpersandEquals, "&&="),
  (TT::AmpersandEquals, "&="),
  (TT::Asterisk, "*"),
  (TT::AsteriskAsterisk, "**"),
  (TT::AsteriskAsteriskEquals, "**="),
  (TT::AsteriskEquals, "*="),
  (TT::Bar, "|"),
  (TT::BarBar, "||"),
  (TT::BarBarEquals, "||="),
  (TT::BarEquals, "|="),
  (TT::BraceClose, "}"),
  (TT::BraceOpen, "{"),
  (TT::BracketClose, "]"),
  (TT::BracketOpen, "["),
  (TT::Caret, "^"),
  (TT::CaretEquals, "^="),
  (TT::ChevronLeft, "<"),
  (TT::ChevronLeftChevronLeft, "<<"),
  (TT::ChevronLeftChevronLeftEquals, "<<="),
  (TT::ChevronLeftEquals, "<="),
  (TT::ChevronRight, ">"),
  (TT::ChevronRightChevronRight, ">>"),
  (TT::ChevronRightChevronRightChevronRight, ">>>"),
  (TT::ChevronRightChevronRightChevronRightEquals, ">>>="),
  (TT::ChevronRightChevronRightEquals, ">>="),
  (TT::ChevronRightEquals, ">="),
  (TT::Colon, ":"),
  (TT::Comma, ","),
  (TT::Dot, "."),
  (TT::DotDotDot, "..."),
  (TT::Equals, "="),
  (TT::EqualsChevronRight, "=>"),
  (TT::EqualsEquals, "=="),
  (TT::EqualsEqualsEquals, "==="),
  (TT::Exclamation, "!"),
  (TT::ExclamationEquals, "!="),
  (TT::ExclamationEqualsEquals, "!=="),
  (TT::Hyphen, "-"),
  (TT::HyphenEquals, "-="),
  (TT::HyphenHyphen, "--"),
  (TT::ParenthesisClose, ")"),
  (TT::ParenthesisOpen, "("),
  (TT::Percent, "%"),
  (TT::PercentEquals, "%="),
  (TT::Plus, "+"),
  (TT::PlusEquals, "+="),
  (TT::PlusPlus, "++"),
  (TT::PrivateMember, "#"),
  (TT::Question, "?"),
  (TT::QuestionDot, "?."),
  (TT::QuestionDotBracketOpen, "?.["),
  (TT::QuestionDotParenthesisOpen, "?.("),
  (TT::QuestionQuestion, "??"),
  (TT::QuestionQuestionEquals, "??="),
  (TT::Semicolon, ";"),
  (TT::Slash, "/"),
  (TT::SlashEquals, "/="),
  (TT::Tilde, "~"),
];

const KEYWORDS: &[(TT, &str)] = &[
  (TT::KeywordAs, "as"),
  (TT::KeywordAsync, "async"),
  (TT::KeywordAwait, "await"),
  (TT::KeywordBreak, "break"),
  (TT::KeywordCase, "case"),
  (TT::KeywordCatch, "catch"),
  (TT::KeywordClass, "class"),
  (TT::KeywordConst, "const"),
  (TT::KeywordContinue, "continue"),
  (TT::KeywordDebugger, "debugger"),
  (TT::KeywordDefault, "default"),
  (TT::KeywordDelete, "delete"),
  (TT::KeywordDo, "do"),
  (TT::KeywordElse, "else"),
  (TT::KeywordEnum, "enum"),
  (TT::KeywordExport, "export"),
  (TT::KeywordExtends, "extends"),
  (TT::KeywordFinally, "finally"),
  (TT::KeywordFor, "for"),
  (TT::KeywordFrom, "from"),
  (TT::KeywordFunction, "function"),
  (TT::KeywordGet, "get"),
  (TT::KeywordIf, "if"),
  (TT::KeywordImport, "import"),
  (TT::KeywordIn, "in"),
  (TT::KeywordInstanceof, "instanceof"),
  (TT::KeywordLet, "let"),
  (TT::KeywordNew, "new"),
  (TT::KeywordOf, "of"),
  (TT::KeywordReturn, "return"),
  (TT::KeywordSet, "set"),
  (TT::KeywordStatic, "static"),
  (TT::KeywordSuper, "super"),
  (TT::KeywordSwitch, "switch"),
  (TT::KeywordThis, "this"),
  (TT::KeywordThrow, "throw"),
  (TT::KeywordTry, "try"),
  (TT::KeywordTypeof, "typeof"),
  (TT::KeywordVar, "var"),
  (TT::KeywordVoid, "void"),
  (TT::KeywordWhile, "while"),
  (TT::KeywordWith, "with"),
  (TT::KeywordYield, "yield"),
  (TT::LiteralFalse, "false"),
  (TT::LiteralNull, "null"),
  (TT::LiteralTrue, "true"),
];

/// Source text of every keyword token, including contextual keywords and literal keywords.
pub static KEYWORDS_MAPPING: Lazy<HashMap<TT, &'static str>> =
  Lazy::new(|| KEYWORDS.iter().copied().collect());

/// A set of literal patterns, each standing for a token type.
struct PatternMatcher {
  tokens: Vec<TT>,
  automaton: AhoCorasick,
  anchored: Anchored,
}

impl PatternMatcher {
  /// `None` if the automaton can't be built, in which case nothing ever matches.
  fn build<P: AsRef<[u8]>>(
    anchored: bool,
    patterns: impl IntoIterator<Item = (TT, P)>,
  ) -> Option<PatternMatcher> {
    let (tokens, needles): (Vec<TT>, Vec<P>) = patterns.into_iter().unzip();
    let automaton = AhoCorasickBuilder::new()
      .start_kind(if anchored {
        StartKind::Anchored
      } else {
        StartKind::Unanchored
      })
      .kind(Some(AhoCorasickKind::DFA))
      .match_kind(MatchKind::LeftmostLongest)
      .build(needles)
      .ok()?;
    Some(PatternMatcher {
      tokens,
      automaton,
      anchored: if anchored { Anchored::Yes } else { Anchored::No },
    })
  }
}

/// The token type of the leftmost longest match in the unlexed source, and the number of bytes
/// from the current position to the end of that match.
fn find(matcher: &Option<PatternMatcher>, lexer: &Lexer<'_>) -> Option<(TT, usize)> {
  let matcher = matcher.as_ref()?;
  let m = matcher
    .automaton
    .find(Input::new(lexer.rest()).anchored(matcher.anchored))?;
  Some((matcher.tokens[m.pattern().as_usize()], m.end()))
}

/// The start of every significant token.
static SIG: Lazy<Option<PatternMatcher>> = Lazy::new(|| {
  let keywords: HashSet<&str> = KEYWORDS.iter().map(|(_, s)| *s).collect();
  let mut patterns: Vec<(TT, String)> = OPERATORS
    .iter()
    .chain(KEYWORDS)
    .map(|&(tt, s)| (tt, s.to_string()))
    .collect();
  // A keyword followed by an identifier character starts an identifier, like `iff` or `in2`.
  for &(_, keyword) in KEYWORDS {
    for c in ID_CONTINUE_CHARSTR.chars() {
      let word = format!("{keyword}{c}");
      if !keywords.contains(word.as_str()) {
        patterns.push((TT::Identifier, word));
      }
    }
  }
  patterns.extend(ID_START_CHARSTR.chars().map(|c| (TT::Identifier, c.to_string())));
  patterns.push((TT::Identifier, "\\".to_string()));
  for d in '0'..='9' {
    patterns.push((TT::LiteralNumber, d.to_string()));
    // `.5` is a number rather than a member access.
    patterns.push((TT::LiteralNumber, format!(".{d}")));
    // `a?.5:b` is a conditional rather than optional chaining.
    patterns.push((TT::Question, format!("?.{d}")));
  }
  for (tt, prefix) in [
    (TT::LiteralNumberBin, "0b"),
    (TT::LiteralNumberBin, "0B"),
    (TT::LiteralNumberHex, "0x"),
    (TT::LiteralNumberHex, "0X"),
    (TT::LiteralNumberOct, "0o"),
    (TT::LiteralNumberOct, "0O"),
    (TT::LiteralString, "\""),
    (TT::LiteralString, "'"),
    (TT::LiteralTemplatePartString, "`"),
  ] {
    patterns.push((tt, prefix.to_string()));
  }
  PatternMatcher::build(true, patterns)
});

/// Inside a multiline comment: its end, or a line break.
static ML_COMMENT: Lazy<Option<PatternMatcher>> = Lazy::new(|| {
  let line_terminators = ECMASCRIPT_LINE_TERMINATORS.map(|c| (TT::LineTerminator, c.to_string()));
  PatternMatcher::build(
    false,
    [(TT::CommentMultilineEnd, "*/".to_string())].into_iter().chain(line_terminators),
  )
});

/// Whitespace, line breaks and the start of comments.
static INSIG: Lazy<Option<PatternMatcher>> = Lazy::new(|| {
  let patterns = ECMASCRIPT_LINE_TERMINATORS
    .map(|c| (TT::LineTerminator, c.to_string()))
    .into_iter()
    .chain(ECMASCRIPT_WHITESPACE.map(|c| (TT::Whitespace, c.to_string())))
    .chain([
      (TT::CommentMultiline, "/*".to_string()),
      (TT::CommentSingle, "//".to_string()),
      (TT::CommentSingle, "#!".to_string()),
    ]);
  PatternMatcher::build(true, patterns)
});

pub struct Lexer<'a> {
  source: &'a str,
  next: usize,
}

impl<'a> Lexer<'a> {
  pub fn new(source: &'a str) -> Lexer<'a> {
    Lexer { source, next: 0 }
  }

  /// Byte offset of the next unlexed character.
  pub fn next(&self) -> usize {
    self.next
  }

  /// Resumes lexing at `next`, which must be a token boundary.
  pub fn seek(&mut self, next: usize) {
    self.next = next;
  }

  pub fn source_range(&self) -> Loc {
    Loc(0, self.source.len())
  }

  fn rest(&self) -> &'a str {
    &self.source[self.next..]
  }

  fn at_end(&self) -> bool {
    self.next >= self.source.len()
  }

  fn peek(&self, n: usize) -> Option<char> {
    self.rest().chars().nth(n)
  }

  fn bump(&mut self, len: usize) {
    debug_assert!(self.next + len <= self.source.len());
    self.next += len;
  }

  fn bump_char(&mut self) -> Option<char> {
    let c = self.peek(0)?;
    self.next += c.len_utf8();
    Some(c)
  }

  fn eat(&mut self, c: char) -> bool {
    let found = self.peek(0) == Some(c);
    if found {
      self.next += c.len_utf8();
    }
    found
  }

  /// Consumes characters while they pass `filter`, returning the number of bytes consumed.
  fn eat_while(&mut self, filter: &CharFilter) -> usize {
    let len = self
      .rest()
      .chars()
      .take_while(|c| filter.has(*c))
      .map(char::len_utf8)
      .sum();
    self.next += len;
    len
  }

  /// Skips to the next occurrence of any of three ASCII bytes, or to the end.
  fn skip_to_any(&mut self, a: u8, b: u8, c: u8) {
    let rest = self.rest().as_bytes();
    self.next += memchr3(a, b, c, rest).unwrap_or(rest.len());
  }

  /// Skips past the next `\n`, or to the end. The Unicode line separators aren't considered.
  fn skip_line(&mut self) {
    let rest = self.rest().as_bytes();
    self.next += memchr(b'\n', rest).map_or(rest.len(), |i| i + 1);
  }

  fn token(
    &mut self,
    preceded_by_line_terminator: bool,
    lex: impl FnOnce(&mut Self) -> Option<TT>,
  ) -> Token {
    let start = self.next;
    let typ = lex(self).unwrap_or(TT::Invalid);
    Token {
      loc: Loc(start, self.next),
      typ,
      preceded_by_line_terminator,
    }
  }
}

impl<'a> Index<Loc> for Lexer<'a> {
  type Output = str;

  fn index(&self, index: Loc) -> &Self::Output {
    &self.source[index.0..index.1]
  }
}

/// Returns whether the comment contains a line break.
fn skip_multiline_comment(lexer: &mut Lexer<'_>) -> bool {
  lexer.bump(2);
  let mut has_line_break = false;
  loop {
    match find(&ML_COMMENT, lexer) {
      Some((TT::LineTerminator, len)) => {
        lexer.bump(len);
        has_line_break = true;
      }
      Some((_, len)) => {
        lexer.bump(len);
        return has_line_break;
      }
      // Unterminated; the comment swallows the rest of the source.
      None => {
        lexer.seek(lexer.source.len());
        return has_line_break;
      }
    }
  }
}

fn unicode_escape(lexer: &mut Lexer<'_>) -> Option<()> {
  lexer.bump(1);
  if !lexer.eat('u') {
    return None;
  }
  if lexer.eat('{') {
    if lexer.eat_while(&DIGIT_HEX) == 0 || !lexer.eat('}') {
      return None;
    }
  } else {
    for _ in 0..4 {
      if !DIGIT_HEX.has(lexer.peek(0)?) {
        return None;
      }
      lexer.bump(1);
    }
  }
  Some(())
}

fn identifier(lexer: &mut Lexer<'_>) -> Option<TT> {
  let first = lexer.peek(0)?;
  if first == '\\' {
    unicode_escape(lexer)?;
  } else {
    lexer.bump(first.len_utf8());
  }
  loop {
    lexer.eat_while(&ID_CONTINUE);
    match lexer.peek(0) {
      Some('\\') => unicode_escape(lexer)?,
      // Non-ASCII letters and digits are taken as identifier parts, as are ZWNJ and ZWJ.
      Some(c) if (!c.is_ascii() && c.is_alphanumeric()) || matches!(c, '\u{200C}' | '\u{200D}') => {
        lexer.bump(c.len_utf8())
      }
      _ => return Some(TT::Identifier),
    }
  }
}

fn number(lexer: &mut Lexer<'_>) -> Option<TT> {
  let source = lexer.source;
  let start = lexer.next;
  let int_len = lexer.eat_while(&DIGIT_DEC);
  if int_len > 0 && lexer.eat('n') {
    return Some(TT::LiteralBigInt);
  }
  // Legacy octal literals like `017` have no fraction or exponent.
  let int = &source[start..lexer.next];
  if int.len() > 1 && int.starts_with('0') && int.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
    return Some(TT::LiteralNumber);
  }
  if lexer.eat('.') {
    lexer.eat_while(&DIGIT_DEC);
  }
  if lexer.eat('e') || lexer.eat('E') {
    let _ = lexer.eat('+') || lexer.eat('-');
    if lexer.eat_while(&DIGIT_DEC) == 0 {
      return Some(TT::Invalid);
    }
  }
  Some(TT::LiteralNumber)
}

fn radix_number(lexer: &mut Lexer<'_>, digits: &CharFilter) -> TT {
  // The `0x`-style prefix.
  lexer.bump(2);
  if lexer.eat_while(digits) == 0 {
    TT::Invalid
  } else if lexer.eat('n') {
    TT::LiteralBigInt
  } else {
    TT::LiteralNumber
  }
}

fn private_member(lexer: &mut Lexer<'_>) -> Option<TT> {
  lexer.bump(1);
  let first = lexer.peek(0)?;
  if !ID_START.has(first) && !(first.is_alphabetic() && !first.is_ascii()) {
    return Some(TT::Invalid);
  }
  identifier(lexer)?;
  Some(TT::PrivateMember)
}

fn regex(lexer: &mut Lexer<'_>) -> Option<TT> {
  lexer.bump(1);
  let mut in_class = false;
  loop {
    match lexer.bump_char()? {
      '\\' => {
        // Line breaks can't be escaped.
        let escaped = lexer.peek(0)?;
        if escaped == '\n' {
          return Some(TT::Invalid);
        }
        lexer.bump(escaped.len_utf8());
      }
      '/' if !in_class => break,
      '[' => in_class = true,
      ']' => in_class = false,
      '\n' | '\r' => return Some(TT::Invalid),
      _ => {}
    }
  }
  // Flags.
  lexer.eat_while(&ID_CONTINUE);
  Some(TT::LiteralRegex)
}

fn string(lexer: &mut Lexer<'_>) -> Option<TT> {
  let quote = lexer.bump_char()?;
  loop {
    lexer.skip_to_any(b'\\', b'\n', quote as u8);
    match lexer.bump_char()? {
      '\\' => {
        // A backslash before CRLF continues the string on the next line.
        if lexer.bump_char()? == '\r' {
          lexer.eat('\n');
        }
      }
      '\n' => return Some(TT::Invalid),
      _ => return Some(TT::LiteralString),
    }
  }
}

/// Lexes template text up to and including the next `${` or closing backtick.
fn template_continue(lexer: &mut Lexer<'_>) -> Option<TT> {
  loop {
    lexer.skip_to_any(b'\\', b'`', b'$');
    match lexer.bump_char()? {
      '\\' => {
        lexer.bump_char()?;
      }
      '`' => return Some(TT::LiteralTemplatePartStringEnd),
      _ => {
        if lexer.eat('{') {
          return Some(TT::LiteralTemplatePartString);
        }
      }
    }
  }
}

pub fn lex_next(lexer: &mut Lexer<'_>, mode: LexMode) -> Token {
  if mode == LexMode::TemplateStrContinue {
    return lexer.token(false, template_continue);
  }

  let mut preceded_by_line_terminator = false;
  while let Some((tt, len)) = find(&INSIG, lexer) {
    match tt {
      TT::LineTerminator => {
        lexer.bump(len);
        preceded_by_line_terminator = true;
      }
      TT::CommentMultiline => preceded_by_line_terminator |= skip_multiline_comment(lexer),
      TT::CommentSingle => {
        // `#!` is only a comment at the very start of the source.
        if lexer.next != 0 && lexer.rest().starts_with("#!") {
          break;
        }
        lexer.bump(len);
        lexer.skip_line();
        preceded_by_line_terminator = true;
      }
      _ => lexer.bump(len),
    }
  }

  // Reported as its own token type, not as an invalid token.
  if lexer.at_end() {
    return Token {
      loc: Loc(lexer.next, lexer.next),
      typ: TT::EOF,
      preceded_by_line_terminator,
    };
  }

  lexer.token(preceded_by_line_terminator, |lexer| {
    if !lexer.peek(0)?.is_ascii() {
      return identifier(lexer);
    }
    let (tt, len) = find(&SIG, lexer)?;
    match tt {
      TT::Identifier => identifier(lexer),
      TT::LiteralNumber => number(lexer),
      TT::LiteralNumberBin => Some(radix_number(lexer, &DIGIT_BIN)),
      TT::LiteralNumberHex => Some(radix_number(lexer, &DIGIT_HEX_SEP)),
      TT::LiteralNumberOct => Some(radix_number(lexer, &DIGIT_OCT)),
      TT::LiteralString => string(lexer),
      TT::LiteralTemplatePartString => {
        lexer.bump(1);
        template_continue(lexer)
      }
      TT::PrivateMember => private_member(lexer),
      TT::Slash | TT::SlashEquals if mode == LexMode::SlashIsRegex => regex(lexer),
      // Either `?` alone or `?.` followed by a digit; only the `?` belongs to this token.
      TT::Question => {
        lexer.bump(1);
        Some(TT::Question)
      }
      typ => {
        lexer.bump(len);
        Some(typ)
      }
    }
  })
}
