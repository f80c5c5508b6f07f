use clap::Parser;
use deobfuscate_js::deobfuscate_with_mapping;
use deobfuscate_js::Config;
use deobfuscate_js::DeobfuscateError;
use std::fs;
use std::fs::File;
use std::io::stdin;
use std::io::stdout;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
  name = "deobfuscate-js",
  about = "Undoes common JavaScript obfuscation techniques"
)]
struct Cli {
  /// File to deobfuscate; omit for stdin.
  #[arg(short, long)]
  input: Option<PathBuf>,

  /// Output destination; omit for stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Parse the input as a module instead of a global script.
  #[arg(short, long)]
  module: bool,

  /// Overwrite the output file if it already exists.
  #[arg(short, long)]
  force: bool,

  /// JSON config file. Omitted fields keep their defaults.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Log each pass as it runs.
  #[arg(short, long)]
  verbose: bool,

  /// Write the renamer's name mapping to this file as JSON.
  #[arg(long)]
  mapping: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
  #[error("the output file {0} already exists; pass --force to overwrite it")]
  OutputExists(String),

  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    source: std::io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: String,
    source: std::io::Error,
  },

  #[error("invalid config {path}: {source}")]
  Config {
    path: String,
    source: serde_json::Error,
  },

  #[error("failed to serialize the name mapping: {0}")]
  Mapping(serde_json::Error),

  #[error(transparent)]
  Deobfuscate(#[from] DeobfuscateError),
}

fn init_tracing(verbose: bool) {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(false)
    .try_init();
}

fn load_config(args: &Cli) -> Result<Config, CliError> {
  let mut config = match args.config.as_ref() {
    Some(path) => {
      let raw = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
      })?;
      serde_json::from_str(&raw).map_err(|source| CliError::Config {
        path: path.display().to_string(),
        source,
      })?
    }
    None => Config::default(),
  };
  config.is_module |= args.module;
  config.verbose |= args.verbose;
  Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String, CliError> {
  let name = path.map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
  let mut source = String::new();
  let res = match path {
    Some(p) => File::open(p).and_then(|mut f| f.read_to_string(&mut source)),
    None => stdin().read_to_string(&mut source),
  };
  res.map_err(|source| CliError::Read { path: name, source })?;
  Ok(source)
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
  fs::write(path, contents).map_err(|source| CliError::Write {
    path: path.display().to_string(),
    source,
  })
}

fn run(args: Cli) -> Result<(), CliError> {
  // Checked up front so a refusal leaves nothing behind.
  for path in [args.output.as_ref(), args.mapping.as_ref()].into_iter().flatten() {
    if !args.force && path.exists() {
      return Err(CliError::OutputExists(path.display().to_string()));
    }
  }
  let config = load_config(&args)?;
  let source = read_input(args.input.as_deref())?;
  let result = deobfuscate_with_mapping(&source, &config)?;

  let mapping = match (args.mapping.as_ref(), result.name_mapping.as_ref()) {
    (Some(path), Some(mapping)) => Some((path, mapping.to_json().map_err(CliError::Mapping)?)),
    (Some(path), None) => {
      warn!(path = %path.display(), "renaming is disabled; no name mapping was written");
      None
    }
    (None, _) => None,
  };

  match args.output.as_ref() {
    Some(path) => {
      write_file(path, &result.code)?;
      info!("The output file {} has been created", path.display());
    }
    None => {
      let mut out = stdout();
      out
        .write_all(result.code.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|source| CliError::Write {
          path: "<stdout>".to_string(),
          source,
        })?;
    }
  }
  if let Some((path, json)) = mapping {
    write_file(path, &json)?;
    info!("The name mapping {} has been created", path.display());
  }
  Ok(())
}

fn main() -> ExitCode {
  let args = Cli::parse();
  init_tracing(args.verbose);
  match run(args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      error!("{err}");
      ExitCode::FAILURE
    }
  }
}
