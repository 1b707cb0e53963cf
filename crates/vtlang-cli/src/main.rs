//! Command-line interface for vtlang.

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vtlang_symbolic::{
    build_model, extract, to_smtlib, Backend, CheckConfig, EnumerationBackend, Outcome,
    SymbolicDomain, SymbolicError, SymbolicModel, Z3Backend,
};
use vtlang_syntax::{parse, pretty_print, Program};
use vtlang_topology::{Topology, TopologyError};

/// Exit status when the assertions are unsatisfiable.
const EXIT_UNSAT: i32 = 2;
/// Exit status when the backend could not decide.
const EXIT_UNKNOWN: i32 = 3;

/// CLI error with source context for pretty printing.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("failed to read file: {message}")]
    IoError { message: String },

    #[error("topology error: {message}")]
    #[diagnostic(code(vtlang::topology_error))]
    TopologyError { message: String },

    #[error("parse error: {message}")]
    #[diagnostic(code(vtlang::parse_error))]
    ParseError {
        message: String,
        #[source_code]
        src: NamedSource<Arc<String>>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("compile error: {message}")]
    #[diagnostic(code(vtlang::compile_error))]
    CompileError {
        message: String,
        #[source_code]
        src: NamedSource<Arc<String>>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("model error: {message}")]
    #[diagnostic(code(vtlang::model_error))]
    ModelError { message: String },
}

impl CliError {
    fn from_parse_error(e: vtlang_syntax::ParseError, source: Arc<String>, filename: &str) -> Self {
        let span = e.span();
        CliError::ParseError {
            message: e.to_string(),
            src: NamedSource::new(filename, source),
            span: (span.start, span.len()).into(),
        }
    }

    fn from_symbolic_error(e: SymbolicError, source: Arc<String>, filename: &str) -> Self {
        match e.span() {
            Some(span) => CliError::CompileError {
                message: e.to_string(),
                src: NamedSource::new(filename, source),
                span: (span.start, span.len()).into(),
            },
            None => CliError::ModelError {
                message: e.to_string(),
            },
        }
    }
}

impl From<TopologyError> for CliError {
    fn from(e: TopologyError) -> Self {
        CliError::TopologyError {
            message: e.to_string(),
        }
    }
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "vtlang", version)]
#[command(about = "Symbolic verification of infrastructure topologies", long_about = None)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Decision procedure for `check`.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendKind {
    /// Z3 over the enumeration-sort encoding
    Z3,
    /// Backtracking search over node assignments
    Enumeration,
}

impl BackendKind {
    fn build(self, config: CheckConfig) -> Box<dyn Backend> {
        match self {
            BackendKind::Z3 => Box::new(Z3Backend::new(config)),
            BackendKind::Enumeration => Box::new(EnumerationBackend::new(config)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check an assertion program against a topology
    Check {
        /// Resolved topology (JSON)
        #[arg(value_name = "TOPOLOGY")]
        topology: PathBuf,

        /// Assertion program
        #[arg(value_name = "PROGRAM")]
        program: PathBuf,

        /// Wall-clock budget for the check in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Maximum number of variable assignments to try (enumeration only)
        #[arg(long)]
        max_assignments: Option<u64>,

        /// Decision procedure
        #[arg(long, value_enum, default_value_t = BackendKind::Z3)]
        backend: BackendKind,
    },

    /// Parse an assertion program and print it in canonical form
    Parse {
        /// Assertion program
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show the symbol sorts extracted from a topology
    Symbols {
        /// Resolved topology (JSON)
        #[arg(value_name = "TOPOLOGY")]
        topology: PathBuf,
    },

    /// Emit the model and assertions as an SMT-LIB 2 script
    Smt2 {
        /// Resolved topology (JSON)
        #[arg(value_name = "TOPOLOGY")]
        topology: PathBuf,

        /// Assertion program
        #[arg(value_name = "PROGRAM")]
        program: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let result = match cli.command {
        Commands::Check {
            topology,
            program,
            timeout_ms,
            max_assignments,
            backend,
        } => cmd_check(
            &topology,
            &program,
            backend.build(CheckConfig {
                timeout_ms,
                max_assignments,
            }),
        ),
        Commands::Parse { file } => cmd_parse(&file),
        Commands::Symbols { topology } => cmd_symbols(&topology),
        Commands::Smt2 {
            topology,
            program,
            output,
        } => cmd_smt2(&topology, &program, output.as_deref()),
    };

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
        }
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    }
}

fn read_source(file: &Path) -> CliResult<Arc<String>> {
    fs::read_to_string(file)
        .map(Arc::new)
        .map_err(|e| CliError::IoError {
            message: format!("{}: {}", file.display(), e),
        })
}

fn load_program(file: &Path) -> CliResult<(Program, Arc<String>, String)> {
    let filename = file.display().to_string();
    let source = read_source(file)?;
    let program =
        parse(&source).map_err(|e| CliError::from_parse_error(e, source.clone(), &filename))?;
    Ok((program, source, filename))
}

/// Load the topology, build the grounded model, and compile the program into it.
fn load_model(topology: &Path, program: &Path) -> CliResult<SymbolicModel> {
    info!("loading topology...");
    let topology = Topology::from_json_file(topology)?;

    info!("parsing...");
    let (program, source, filename) = load_program(program)?;

    info!("building model...");
    let mut model = build_model(&topology).map_err(|e| CliError::ModelError {
        message: e.to_string(),
    })?;

    info!("compiling...");
    model
        .compile(&program)
        .map_err(|e| CliError::from_symbolic_error(e, source, &filename))?;
    Ok(model)
}

fn cmd_check(topology: &Path, program: &Path, backend: Box<dyn Backend>) -> CliResult<i32> {
    let model = load_model(topology, program)?;

    info!(backend = backend.name(), "checking...");
    let start = Instant::now();
    let outcome = backend.check(&model);
    let elapsed = start.elapsed();

    println!();
    let code = match outcome {
        Outcome::Sat { witness } => {
            println!("Result: SAT");
            if !witness.bindings.is_empty() {
                println!("  Witness:");
                for line in witness.to_string().lines() {
                    println!("    {}", line);
                }
            }
            0
        }
        Outcome::Unsat => {
            println!("Result: UNSAT");
            EXIT_UNSAT
        }
        Outcome::Unknown { reason } => {
            println!("Result: UNKNOWN");
            println!("  Reason: {}", reason);
            EXIT_UNKNOWN
        }
    };
    println!("  Constraints: {}", model.constraints().len());
    println!("  Time: {:.2}s", elapsed.as_secs_f64());
    Ok(code)
}

fn cmd_parse(file: &Path) -> CliResult<i32> {
    let (program, _, _) = load_program(file)?;
    print!("{}", pretty_print(&program));
    Ok(0)
}

fn cmd_symbols(topology: &Path) -> CliResult<i32> {
    let topology = Topology::from_json_file(topology)?;
    let domain = SymbolicDomain::from_extracted(&extract(&topology)).map_err(|e| {
        CliError::ModelError {
            message: e.to_string(),
        }
    })?;
    print!("{}", domain);
    Ok(0)
}

fn cmd_smt2(topology: &Path, program: &Path, output: Option<&Path>) -> CliResult<i32> {
    let model = load_model(topology, program)?;
    let script = to_smtlib(&model).map_err(|e| CliError::ModelError {
        message: e.to_string(),
    })?;

    match output {
        Some(path) => {
            fs::write(path, &script).map_err(|e| CliError::IoError {
                message: format!("{}: {}", path.display(), e),
            })?;
            info!(path = %path.display(), "wrote SMT-LIB script");
        }
        None => print!("{}", script),
    }
    Ok(0)
}
