use crate::char::is_whitespace;

/// Converts a number to its canonical string form, as the language's `Number::toString` with
/// radix 10 does.
pub fn number_to_string(value: f64) -> String {
  if value.is_nan() {
    return "NaN".into();
  }
  if value == 0.0 {
    // Both +0 and -0.
    return "0".into();
  }
  if value.is_infinite() {
    return if value > 0.0 { "Infinity" } else { "-Infinity" }.into();
  }
  if value < 0.0 {
    return format!("-{}", number_to_string(-value));
  }

  let (digits, n) = shortest_digits(value);
  let k = digits.len() as i32;
  let mut out = String::new();
  if k <= n && n <= 21 {
    out.push_str(&digits);
    out.extend(std::iter::repeat('0').take((n - k) as usize));
  } else if 0 < n && n <= 21 {
    out.push_str(&digits[..n as usize]);
    out.push('.');
    out.push_str(&digits[n as usize..]);
  } else if -6 < n && n <= 0 {
    out.push_str("0.");
    out.extend(std::iter::repeat('0').take((-n) as usize));
    out.push_str(&digits);
  } else {
    let e = n - 1;
    out.push_str(&digits[..1]);
    if k > 1 {
      out.push('.');
      out.push_str(&digits[1..]);
    }
    out.push('e');
    out.push(if e < 0 { '-' } else { '+' });
    out.push_str(&e.abs().to_string());
  }
  out
}

/// Returns the shortest round-tripping decimal digits of a finite positive number, and the
/// exponent `n` such that the value is `0.d1d2d3... * 10^n`.
fn shortest_digits(value: f64) -> (String, i32) {
  let mut buf = ryu::Buffer::new();
  let formatted = buf.format_finite(value);
  let (mantissa, exp) = match formatted.split_once(['e', 'E']) {
    Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
    None => (formatted, 0),
  };
  let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
  let mut digits: String = int_part.chars().chain(frac_part.chars()).collect();
  let mut n = int_part.len() as i32 + exp;
  let leading_zeros = digits.len() - digits.trim_start_matches('0').len();
  digits.drain(..leading_zeros);
  n -= leading_zeros as i32;
  let trimmed_len = digits.trim_end_matches('0').len();
  digits.truncate(trimmed_len);
  (digits, n)
}

fn parse_radix_digits(digits: &str, radix: u32) -> Option<f64> {
  if digits.is_empty() {
    return None;
  }
  let mut value = 0.0f64;
  for c in digits.chars() {
    let d = c.to_digit(radix)?;
    value = value * radix as f64 + d as f64;
  }
  Some(value)
}

/// Decodes the raw source text of a numeric literal token.
pub fn parse_number_literal(raw: &str) -> Option<f64> {
  let raw = raw.replace('_', "");
  let bytes = raw.as_bytes();
  if bytes.len() > 2 && bytes[0] == b'0' {
    match bytes[1] {
      b'x' | b'X' => return parse_radix_digits(&raw[2..], 16),
      b'o' | b'O' => return parse_radix_digits(&raw[2..], 8),
      b'b' | b'B' => return parse_radix_digits(&raw[2..], 2),
      _ => {}
    };
  }
  if bytes.len() > 1 && bytes[0] == b'0' && bytes.iter().all(|b| b.is_ascii_digit()) {
    // Legacy octal, unless a digit rules it out.
    if bytes.iter().all(|b| (b'0'..=b'7').contains(b)) {
      return parse_radix_digits(&raw[1..], 8);
    }
  }
  raw.parse::<f64>().ok()
}

/// Converts a string to a number, as the language's `ToNumber` does for string values.
pub fn string_to_number(s: &str) -> f64 {
  let trimmed = s.trim_matches(is_whitespace);
  if trimmed.is_empty() {
    return 0.0;
  }
  let bytes = trimmed.as_bytes();
  if bytes.len() > 2 && bytes[0] == b'0' {
    let radix = match bytes[1] {
      b'x' | b'X' => Some(16),
      b'o' | b'O' => Some(8),
      b'b' | b'B' => Some(2),
      _ => None,
    };
    if let Some(radix) = radix {
      return parse_radix_digits(&trimmed[2..], radix).unwrap_or(f64::NAN);
    }
  }
  let (sign, unsigned) = match bytes[0] {
    b'+' => (1.0, &trimmed[1..]),
    b'-' => (-1.0, &trimmed[1..]),
    _ => (1.0, trimmed),
  };
  if unsigned == "Infinity" {
    return sign * f64::INFINITY;
  }
  // Rust accepts spellings (`inf`, `nan`, `infinity`) that the language does not.
  if !unsigned
    .bytes()
    .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    || !unsigned.bytes().any(|b| b.is_ascii_digit())
    || unsigned.starts_with(['+', '-'])
  {
    return f64::NAN;
  }
  unsigned.parse::<f64>().map(|v| sign * v).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
  use super::number_to_string;
  use super::parse_number_literal;
  use super::string_to_number;

  #[test]
  fn formats_like_number_to_string() {
    assert_eq!(number_to_string(0.0), "0");
    assert_eq!(number_to_string(-0.0), "0");
    assert_eq!(number_to_string(1.0), "1");
    assert_eq!(number_to_string(-42.0), "-42");
    assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(number_to_string(123.456), "123.456");
    assert_eq!(number_to_string(0.000001), "0.000001");
    assert_eq!(number_to_string(0.0000001), "1e-7");
    assert_eq!(number_to_string(1e21), "1e+21");
    assert_eq!(number_to_string(1e20), "100000000000000000000");
    assert_eq!(number_to_string(1.5e300), "1.5e+300");
    assert_eq!(number_to_string(f64::NAN), "NaN");
    assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    assert_eq!(number_to_string(4294967296.0), "4294967296");
  }

  #[test]
  fn parses_literals() {
    assert_eq!(parse_number_literal("0x1F"), Some(31.0));
    assert_eq!(parse_number_literal("0b101"), Some(5.0));
    assert_eq!(parse_number_literal("0o17"), Some(15.0));
    assert_eq!(parse_number_literal("017"), Some(15.0));
    assert_eq!(parse_number_literal("019"), Some(19.0));
    assert_eq!(parse_number_literal("1_000"), Some(1000.0));
    assert_eq!(parse_number_literal(".5"), Some(0.5));
    assert_eq!(parse_number_literal("5."), Some(5.0));
    assert_eq!(parse_number_literal("2e3"), Some(2000.0));
  }

  #[test]
  fn converts_strings() {
    assert_eq!(string_to_number(""), 0.0);
    assert_eq!(string_to_number("  12 \n"), 12.0);
    assert_eq!(string_to_number("0x10"), 16.0);
    assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
    assert!(string_to_number("infinity").is_nan());
    assert!(string_to_number("12px").is_nan());
    assert!(string_to_number("-0x10").is_nan());
    assert_eq!(string_to_number("1e3"), 1000.0);
  }
}
