use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::rc::Rc;

/// A JavaScript String value.
///
/// Strings are sequences of UTF-16 code units and may contain unpaired surrogates. Cloning is
/// cheap; the units are shared.
#[derive(Clone)]
pub struct JsString {
  units: Rc<[u16]>,
}

impl JsString {
  pub fn from_code_units(units: &[u16]) -> Self {
    Self {
      units: Rc::from(units),
    }
  }

  pub fn from_u16_vec(units: Vec<u16>) -> Self {
    Self {
      units: Rc::from(units),
    }
  }

  pub fn len_code_units(&self) -> usize {
    self.units.len()
  }

  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }

  pub fn as_code_units(&self) -> &[u16] {
    self.units.as_ref()
  }

  pub fn to_utf8_lossy(&self) -> String {
    String::from_utf16_lossy(self.as_code_units())
  }

  /// The string as UTF-8, or `None` if it contains an unpaired surrogate.
  pub fn to_utf8(&self) -> Option<String> {
    String::from_utf16(self.as_code_units()).ok()
  }

  pub fn concat(&self, other: &JsString) -> JsString {
    if other.is_empty() {
      return self.clone();
    }
    if self.is_empty() {
      return other.clone();
    }
    let mut units = Vec::with_capacity(self.units.len() + other.units.len());
    units.extend_from_slice(&self.units);
    units.extend_from_slice(&other.units);
    JsString::from_u16_vec(units)
  }

  pub fn slice(&self, start: usize, end: usize) -> JsString {
    let end = end.min(self.units.len());
    let start = start.min(end);
    JsString::from_code_units(&self.units[start..end])
  }

  /// Index of the first occurrence of `needle` at or after `from`.
  pub fn find(&self, needle: &[u16], from: usize) -> Option<usize> {
    let hay = self.as_code_units();
    if needle.is_empty() {
      return (from <= hay.len()).then_some(from);
    }
    if needle.len() > hay.len() {
      return None;
    }
    (from..=hay.len() - needle.len()).find(|&i| &hay[i..i + needle.len()] == needle)
  }

  /// Index of the last occurrence of `needle` starting at or before `from`.
  pub fn rfind(&self, needle: &[u16], from: usize) -> Option<usize> {
    let hay = self.as_code_units();
    if needle.len() > hay.len() {
      return None;
    }
    let last = (hay.len() - needle.len()).min(from);
    (0..=last)
      .rev()
      .find(|&i| &hay[i..i + needle.len()] == needle)
  }
}

impl From<&str> for JsString {
  fn from(s: &str) -> Self {
    JsString::from_u16_vec(s.encode_utf16().collect())
  }
}

impl From<String> for JsString {
  fn from(s: String) -> Self {
    JsString::from(s.as_str())
  }
}

impl PartialEq for JsString {
  fn eq(&self, other: &Self) -> bool {
    self.units == other.units
  }
}

impl Eq for JsString {}

impl Hash for JsString {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.units.hash(state);
  }
}

impl PartialOrd for JsString {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for JsString {
  fn cmp(&self, other: &Self) -> Ordering {
    self.units.as_ref().cmp(other.units.as_ref())
  }
}

impl fmt::Debug for JsString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", self.to_utf8_lossy())
  }
}

impl fmt::Display for JsString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.to_utf8_lossy())
  }
}

#[cfg(test)]
mod tests {
  use super::JsString;

  #[test]
  fn search() {
    let s = JsString::from("abcabc");
    let bc: Vec<u16> = "bc".encode_utf16().collect();
    assert_eq!(s.find(&bc, 0), Some(1));
    assert_eq!(s.find(&bc, 2), Some(4));
    assert_eq!(s.rfind(&bc, 6), Some(4));
    assert_eq!(s.rfind(&bc, 3), Some(1));
    assert_eq!(s.find(&[], 6), Some(6));
  }

  #[test]
  fn unpaired_surrogates_are_not_utf8() {
    let s = JsString::from_u16_vec(vec![0xD800]);
    assert_eq!(s.to_utf8(), None);
    assert_eq!(JsString::from("é").to_utf8().as_deref(), Some("é"));
  }
}
