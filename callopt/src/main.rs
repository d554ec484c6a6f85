///
/// callopt CLI
///
/// - callopt compile <unit.json>: Lower the calls of a unit to C statements
/// - callopt rules: List the builtin optimizers that are active
///
/// Configuration is read from --config, or from callopt.toml next to the
/// unit file when present.
///

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, WrapErr};
use tracing::{Level, debug};

use callopt::{Compiler, Config, DiagnosticReporter, OptimizerRegistry, SourceFile, Unit};

#[derive(Parser)]
#[command(name = "callopt")]
#[command(author, version, about = "Builtin call optimizer", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a unit of call expressions (JSON) to C
    Compile {
        /// The unit file
        file: PathBuf,

        /// Path to callopt.toml
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the generated code here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not print #include lines
        #[arg(long)]
        no_headers: bool,
    },

    /// List the active builtin optimizers
    Rules {
        /// Path to callopt.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            file,
            config,
            output,
            no_headers,
        } => compile(&file, config.as_deref(), output.as_deref(), no_headers),
        Commands::Rules { config } => {
            let config = load_config(config.as_deref(), Path::new("."))?;
            let registry = OptimizerRegistry::from_config(&config.optimizer);
            for name in registry.names() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn load_config(explicit: Option<&Path>, dir: &Path) -> miette::Result<Config> {
    let config = match explicit {
        Some(path) => Config::load(path),
        None => Config::discover(dir),
    };
    config.into_diagnostic()
}

fn compile(
    file: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    no_headers: bool,
) -> miette::Result<()> {
    let base = file.parent().unwrap_or(Path::new("."));
    let config = load_config(config, base)?;

    let text = fs::read_to_string(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read {}", file.display()))?;
    let unit = Unit::from_json(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("invalid unit {}", file.display()))?;
    debug!(calls = unit.calls.len(), variables = unit.variables.len(), "unit loaded");

    let compiler = Compiler::new(&config);
    let compiled = match compiler.compile_unit(&unit) {
        Ok(compiled) => compiled,
        Err(err) => {
            let source = unit.source.as_ref().and_then(|path| {
                let path = base.join(path);
                let text = fs::read_to_string(&path).ok()?;
                Some(SourceFile::new(path.display().to_string(), text))
            });
            return Err(DiagnosticReporter::new(source.as_ref()).to_report(&err));
        }
    };

    let rendered = compiled.render(config.output.headers && !no_headers);
    match output {
        Some(path) => fs::write(path, rendered)
            .into_diagnostic()
            .wrap_err_with(|| format!("cannot write {}", path.display()))?,
        None => print!("{}", rendered),
    }
    Ok(())
}
