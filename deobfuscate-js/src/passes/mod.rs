use crate::config::Config;
use crate::err::DeobfuscateResult;
use crate::eval::Evaluator;
use rename::NameMapping;
use std::fmt;
use syntax_js::ast::Node;
use tracing::debug;
use tracing::info;

pub mod arrays;
pub mod branches;
pub mod cleanup;
pub mod execute;
pub mod properties;
pub mod proxy;
pub mod rename;
pub mod simplify;
pub mod strings;

/// State shared by the passes of one pipeline run. Scope trees are not shared: every pass builds
/// its own from the current program.
pub struct PassCtx<'a> {
  pub config: &'a Config,
  pub evaluator: &'a mut dyn Evaluator,
  /// Filled in by the renamer.
  pub name_mapping: Option<NameMapping>,
}

impl<'a> PassCtx<'a> {
  pub fn new(config: &'a Config, evaluator: &'a mut dyn Evaluator) -> Self {
    Self {
      config,
      evaluator,
      name_mapping: None,
    }
  }
}

pub trait Pass {
  fn name(&self) -> &'static str;
  /// Returns whether the program changed.
  fn run(&mut self, cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool>;
}

pub struct PassPipeline {
  passes: Vec<Box<dyn Pass>>,
}

impl PassPipeline {
  pub fn new(passes: Vec<Box<dyn Pass>>) -> Self {
    Self { passes }
  }

  /// The passes enabled by `config`, in pipeline order. Pre-execution and cleanup are always
  /// included.
  pub fn from_config(config: &Config) -> Self {
    let mut passes: Vec<Box<dyn Pass>> = vec![Box::new(execute::ExecutePass)];
    if config.proxy_functions.replace_proxy_functions {
      passes.push(Box::new(proxy::ProxyPass {
        remove: config.proxy_functions.remove_proxy_functions,
      }));
    }
    if config.expressions.simplify_expressions {
      passes.push(Box::new(simplify::SimplifyPass));
    }
    if config.arrays.unpack_arrays {
      passes.push(Box::new(arrays::ArraysPass {
        remove: config.arrays.remove_arrays,
      }));
    }
    if config.expressions.undo_string_operations {
      passes.push(Box::new(strings::StringsPass));
    }
    if config.expressions.simplify_expressions {
      passes.push(Box::new(simplify::SimplifyPass));
    }
    if config.expressions.remove_dead_branches {
      passes.push(Box::new(branches::BranchesPass));
    }
    if config.miscellaneous.simplify_properties {
      passes.push(Box::new(properties::PropertiesPass));
    }
    if config.miscellaneous.rename_hex_identifiers {
      passes.push(Box::new(rename::RenamePass {
        seed: config.miscellaneous.rename_seed,
      }));
    }
    passes.push(Box::new(cleanup::CleanupPass));
    Self::new(passes)
  }

  pub fn names(&self) -> Vec<&'static str> {
    self.passes.iter().map(|p| p.name()).collect()
  }

  /// Runs every pass once, in order. The first fatal error aborts the run.
  pub fn run(&mut self, cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let mut changed = false;
    for pass in self.passes.iter_mut() {
      if cx.config.verbose {
        info!(pass = pass.name(), "running pass");
      } else {
        debug!(pass = pass.name(), "running pass");
      }
      let pass_changed = pass.run(cx, program)?;
      debug!(pass = pass.name(), changed = pass_changed, "finished pass");
      changed |= pass_changed;
    }
    Ok(changed)
  }
}

impl fmt::Debug for PassPipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PassPipeline")
      .field("passes", &self.names())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::PassPipeline;
  use crate::config::Config;

  #[test]
  fn pipeline_order_follows_config() {
    assert_eq!(PassPipeline::from_config(&Config::default()).names(), vec![
      "execute",
      "proxy",
      "simplify",
      "arrays",
      "strings",
      "simplify",
      "branches",
      "properties",
      "rename",
      "cleanup",
    ]);
    assert_eq!(PassPipeline::from_config(&Config::disabled()).names(), vec![
      "execute", "cleanup"
    ]);
  }
}
