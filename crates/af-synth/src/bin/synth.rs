//! CLI for running accessor synthesis over a JSON model file.
//!
//! # Usage
//!
//! ```bash
//! # Synthesize and print every structure
//! cargo run -p af-synth --features cli -- --model model.json
//!
//! # Custom naming rules, plus post-synthesis invariant checks
//! cargo run -p af-synth --features cli -- --model model.json --config af-synth.json --check
//! ```
//!
//! Exits with status 1 when any error diagnostic was reported or an invariant failed.

use std::path::PathBuf;
use std::process::ExitCode;

use af_core::{AccessorInvariants, DiagnosticLog, PropertyChecker};
use af_synth::render::render_structure;
use af_synth::{ModelFile, SynthConfig, Synthesizer};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "af-synth")]
#[command(about = "Synthesize field accessors for a declaration model", long_about = None)]
#[command(version)]
struct Args {
    /// JSON model file with structures and getter requests
    #[arg(short, long)]
    model: PathBuf,

    /// JSON synthesis configuration (naming rules, default access level)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Check accessor invariants on every structure after synthesis
    #[arg(long)]
    check: bool,

    /// Print only diagnostics, not the rendered structures
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match SynthConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => SynthConfig::default(),
    };

    let model = match ModelFile::load(&args.model).and_then(|file| file.into_model(config.default_level)) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Error loading model: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let synthesizer = Synthesizer::new(config);
    let mut tree = model.tree;
    let mut log = DiagnosticLog::new();

    for request in &model.requests {
        // Errors are already in the log; keep going with the remaining requests.
        let _ = synthesizer.handle(&mut tree, request, &mut log);
    }

    if !args.quiet {
        for &structure in &model.structures {
            match render_structure(&tree, structure) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Error rendering {}: {}", structure, e),
            }
        }
    }

    let mut failed = log.has_errors();

    if args.check {
        for &structure in &model.structures {
            let checker = AccessorInvariants::new(&tree, structure);
            let summary = checker.summary();
            println!("{}", summary.format_report());
            failed |= !checker.all_hold();
        }
    }

    if !log.is_empty() {
        eprintln!("{}", log.format_report());
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
