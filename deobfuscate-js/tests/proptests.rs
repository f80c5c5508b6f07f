mod common;

use common::bare_config;
use common::run;
use proptest::prelude::*;

fn element() -> impl Strategy<Value = (String, String)> {
  // Source text and how it prints once substituted.
  prop_oneof![
    (0u32..1000).prop_map(|n| (n.to_string(), n.to_string())),
    "[a-z]{0,6}".prop_map(|s| (format!("'{s}'"), format!("\"{s}\""))),
    any::<bool>().prop_map(|b| (b.to_string(), b.to_string())),
    Just(("null".to_string(), "null".to_string())),
  ]
}

fn identifier() -> impl Strategy<Value = String> {
  "[a-z]{1,3}".prop_filter("keyword", |s| {
    !["do", "if", "in", "for", "let", "new", "try", "var"].contains(&s.as_str())
  })
}

proptest! {
  #[test]
  fn constant_reads_are_replaced(
    elements in prop::collection::vec(element(), 1..8),
    reads in prop::collection::vec(0usize..12, 1..10),
  ) {
    let mut config = bare_config();
    config.arrays.unpack_arrays = true;
    config.arrays.remove_arrays = true;

    let array = elements.iter().map(|(src, _)| src.as_str()).collect::<Vec<_>>().join(",");
    let args = reads.iter().map(|i| format!("_0x1[{i}]")).collect::<Vec<_>>().join(",");
    let out = run(&format!("var _0x1=[{array}];log({args});"), &config);

    let expected_args = reads
      .iter()
      .map(|&i| match elements.get(i) {
        Some((_, printed)) => printed.clone(),
        None => format!("_0x1[{i}]"),
      })
      .collect::<Vec<_>>()
      .join(",");
    let in_range = reads.iter().all(|&i| i < elements.len());
    let expected = if in_range {
      format!("log({expected_args});")
    } else {
      // Out-of-range reads keep the array alive.
      let printed = elements.iter().map(|(_, p)| p.as_str()).collect::<Vec<_>>().join(",");
      format!("var _0x1=[{printed}];log({expected_args});")
    };
    prop_assert_eq!(out, expected);
  }

  #[test]
  fn non_constant_indices_are_left_alone(index in identifier()) {
    let mut config = bare_config();
    config.arrays.unpack_arrays = true;
    config.arrays.remove_arrays = true;
    let source = format!("var _0x1=[1,2];log(_0x1[{index}],_0x1[0]);");
    let out = run(&source, &config);
    prop_assert_eq!(out, format!("var _0x1=[1,2];log(_0x1[{index}],1);"));
  }
}
