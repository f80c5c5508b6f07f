use sandbox_js::Budget;
use serde::Deserialize;
use serde::Serialize;

/// Which transforms run and how the result is printed. Deserializes from camelCase JSON; any
/// omitted field keeps its default, and every transform is enabled by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
  pub verbose: bool,
  pub is_module: bool,
  pub arrays: ArraysConfig,
  pub proxy_functions: ProxyFunctionsConfig,
  pub expressions: ExpressionsConfig,
  pub miscellaneous: MiscellaneousConfig,
  pub sandbox: SandboxConfig,
}

impl Config {
  /// Every transform turned off. Function pre-execution and cleanup still run.
  pub fn disabled() -> Config {
    Config {
      arrays: ArraysConfig {
        unpack_arrays: false,
        remove_arrays: false,
      },
      proxy_functions: ProxyFunctionsConfig {
        replace_proxy_functions: false,
        remove_proxy_functions: false,
      },
      expressions: ExpressionsConfig {
        simplify_expressions: false,
        remove_dead_branches: false,
        undo_string_operations: false,
      },
      miscellaneous: MiscellaneousConfig {
        simplify_properties: false,
        rename_hex_identifiers: false,
        ..MiscellaneousConfig::default()
      },
      ..Config::default()
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArraysConfig {
  pub unpack_arrays: bool,
  /// Remove unpacked arrays once nothing refers to them.
  pub remove_arrays: bool,
}

impl Default for ArraysConfig {
  fn default() -> Self {
    ArraysConfig {
      unpack_arrays: true,
      remove_arrays: true,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyFunctionsConfig {
  pub replace_proxy_functions: bool,
  pub remove_proxy_functions: bool,
}

impl Default for ProxyFunctionsConfig {
  fn default() -> Self {
    ProxyFunctionsConfig {
      replace_proxy_functions: true,
      remove_proxy_functions: true,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpressionsConfig {
  pub simplify_expressions: bool,
  pub remove_dead_branches: bool,
  pub undo_string_operations: bool,
}

impl Default for ExpressionsConfig {
  fn default() -> Self {
    ExpressionsConfig {
      simplify_expressions: true,
      remove_dead_branches: true,
      undo_string_operations: true,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MiscellaneousConfig {
  pub beautify: bool,
  pub simplify_properties: bool,
  pub rename_hex_identifiers: bool,
  /// Seed for shuffling the replacement names, so renaming is reproducible.
  pub rename_seed: u64,
}

impl Default for MiscellaneousConfig {
  fn default() -> Self {
    MiscellaneousConfig {
      beautify: true,
      simplify_properties: true,
      rename_hex_identifiers: true,
      rename_seed: 0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SandboxConfig {
  pub fuel: u64,
  pub max_stack_depth: usize,
}

impl Default for SandboxConfig {
  fn default() -> Self {
    let budget = Budget::default();
    SandboxConfig {
      fuel: budget.fuel,
      max_stack_depth: budget.max_stack_depth,
    }
  }
}

impl SandboxConfig {
  pub fn budget(&self) -> Budget {
    Budget {
      fuel: self.fuel,
      max_stack_depth: self.max_stack_depth,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_json_keeps_defaults() {
    let config: Config = serde_json::from_str(
      r#"{"isModule": true, "arrays": {"removeArrays": false}, "miscellaneous": {"renameSeed": 7}}"#,
    )
    .unwrap();
    assert!(config.is_module);
    assert!(config.arrays.unpack_arrays);
    assert!(!config.arrays.remove_arrays);
    assert!(config.miscellaneous.beautify);
    assert_eq!(config.miscellaneous.rename_seed, 7);
    assert_eq!(config.sandbox, SandboxConfig::default());
  }

  #[test]
  fn serializes_camel_case() {
    let json = serde_json::to_value(Config::default()).unwrap();
    assert_eq!(json["proxyFunctions"]["replaceProxyFunctions"], true);
    assert_eq!(json["miscellaneous"]["renameHexIdentifiers"], true);
    assert_eq!(json["sandbox"]["maxStackDepth"], 64);
  }
}
