#![allow(dead_code)]

use deobfuscate_js::deobfuscate;
use deobfuscate_js::Config;

/// Every transform off and compact output, for enabling transforms one at a time.
pub fn bare_config() -> Config {
  let mut config = Config::disabled();
  config.miscellaneous.beautify = false;
  config
}

/// Every transform on, compact output.
pub fn full_config() -> Config {
  let mut config = Config::default();
  config.miscellaneous.beautify = false;
  config
}

pub fn run(source: &str, config: &Config) -> String {
  deobfuscate(source, config).expect("deobfuscate source")
}
