use eval::Evaluator;
use eval::SandboxEvaluator;
use passes::PassCtx;
use passes::PassPipeline;
use print_js::print;
use print_js::PrintOptions;
use syntax_js::parse;
use syntax_js::ParseOptions;
use tracing::debug;

pub mod config;
pub mod err;
pub mod eval;
pub mod graph;
pub mod literal;
pub mod mutate;
pub mod passes;
pub mod scope;

pub use config::Config;
pub use err::DeobfuscateError;
pub use err::DeobfuscateResult;
pub use passes::rename::NameMapping;

/// Output of [`deobfuscate_with_mapping`].
#[derive(Debug)]
pub struct Deobfuscated {
  pub code: String,
  /// How the renamer renamed identifiers. `None` when renaming is disabled.
  pub name_mapping: Option<NameMapping>,
}

/// Deobfuscates JavaScript source code.
///
/// Functions marked for pre-execution are run in a sandbox bounded by `config.sandbox`.
///
/// # Examples
///
/// ```
/// use deobfuscate_js::{deobfuscate, Config};
///
/// let mut config = Config::default();
/// config.miscellaneous.beautify = false;
/// let code = deobfuscate("var _0x1 = [10, 20, 30]; console.log(_0x1[1]);", &config).unwrap();
/// assert_eq!(code, "console.log(20);");
/// ```
pub fn deobfuscate(source: &str, config: &Config) -> DeobfuscateResult<String> {
  Ok(deobfuscate_with_mapping(source, config)?.code)
}

/// Like [`deobfuscate`], also returning the renamer's name mapping.
pub fn deobfuscate_with_mapping(source: &str, config: &Config) -> DeobfuscateResult<Deobfuscated> {
  let mut evaluator = SandboxEvaluator::new(config.sandbox.budget());
  deobfuscate_with_evaluator(source, config, &mut evaluator)
}

/// Like [`deobfuscate_with_mapping`], running marked functions through `evaluator`.
pub fn deobfuscate_with_evaluator(
  source: &str,
  config: &Config,
  evaluator: &mut dyn Evaluator,
) -> DeobfuscateResult<Deobfuscated> {
  let mut program = parse(source, ParseOptions {
    is_module: config.is_module,
  })?;
  let mut pipeline = PassPipeline::from_config(config);
  debug!(?pipeline, "deobfuscating");
  let mut cx = PassCtx::new(config, evaluator);
  pipeline.run(&mut cx, &mut program)?;
  let code = print(&program, PrintOptions {
    pretty: config.miscellaneous.beautify,
  });
  Ok(Deobfuscated {
    code,
    name_mapping: cx.name_mapping,
  })
}
