use crate::lex::lex_next;
use crate::lex::LexMode;
use crate::lex::Lexer;
use crate::token::TT;
use crate::token::TT::*;

fn check<const N: usize>(code: &str, expecteds: [TT; N]) {
  let mut lexer = Lexer::new(code);
  for expected in expecteds {
    let t = lex_next(&mut lexer, LexMode::Standard);
    assert_eq!(t.typ, expected, "in {code:?}");
  }
  let t = lex_next(&mut lexer, LexMode::Standard);
  assert_eq!(EOF, t.typ);
}

#[test]
fn test_lex_keywords() {
  check("class", [KeywordClass]);
  check("instanceof", [KeywordInstanceof]);
  check("iff if", [Identifier, KeywordIf]);
}

#[test]
fn test_lex_identifiers() {
  check("h929", [Identifier]);
  check("_0x4a2f $b", [Identifier, Identifier]);
  check("\\u0061bc", [Identifier]);
  check("naïve", [Identifier]);
}

#[test]
fn test_lex_literal_numbers() {
  check("1", [LiteralNumber]);
  check(".929", [LiteralNumber]);
  check(". 929", [Dot, LiteralNumber]);
  check("0x1F 0b10 0o17 017", [LiteralNumber, LiteralNumber, LiteralNumber, LiteralNumber]);
  check("1e3 2.5E-3", [LiteralNumber, LiteralNumber]);
  check("10n", [LiteralBigInt]);
  check("?.5", [Question, LiteralNumber]);
  check("a?.b", [Identifier, QuestionDot, Identifier]);
}

#[test]
fn test_lex_strings_and_comments() {
  check("'a\\'b' \"c\"", [LiteralString, LiteralString]);
  check("/* x */ a // y\n b", [Identifier, Identifier]);
  check("'unterminated\n'", [Invalid, Invalid]);
}

#[test]
fn test_lex_line_terminator_flag() {
  let mut lexer = Lexer::new("a\n/* \n */ b c");
  assert!(!lex_next(&mut lexer, LexMode::Standard).preceded_by_line_terminator);
  assert!(lex_next(&mut lexer, LexMode::Standard).preceded_by_line_terminator);
  assert!(!lex_next(&mut lexer, LexMode::Standard).preceded_by_line_terminator);
}

#[test]
fn test_lex_regex_mode() {
  let mut lexer = Lexer::new("/ab[/]c/gi");
  assert_eq!(lex_next(&mut lexer, LexMode::SlashIsRegex).typ, LiteralRegex);
  let mut lexer = Lexer::new("/ab/");
  assert_eq!(lex_next(&mut lexer, LexMode::Standard).typ, Slash);
}

#[test]
fn test_lex_template() {
  let mut lexer = Lexer::new("`a${b}c`");
  assert_eq!(lex_next(&mut lexer, LexMode::Standard).typ, LiteralTemplatePartString);
  assert_eq!(lex_next(&mut lexer, LexMode::Standard).typ, Identifier);
  assert_eq!(lex_next(&mut lexer, LexMode::Standard).typ, BraceClose);
  assert_eq!(
    lex_next(&mut lexer, LexMode::TemplateStrContinue).typ,
    LiteralTemplatePartStringEnd
  );
}
