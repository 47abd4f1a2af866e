//! scangen CLI - compile token specs into scanners.
//!
//! Usage:
//!   scangen spec.ini                     # emit Rust tables to stdout
//!   scangen -t dot spec.ini             # Graphviz rendering
//!   scangen -t json spec.ini            # JSON dump of the automata
//!   scangen -t execute spec.ini         # scan stdin with the scanner
//!   scangen -o out.rs spec.ini          # write to a file
//!
//! With no spec paths the spec is read from stdin. Every `[section]` of
//! the spec compiles to its own automaton.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use scangen::emit::{DotTarget, JsonTarget, RustTarget, Target};
use scangen::regex::{ExprPool, UnicodeTables};
use scangen::spec::parse_spec;
use scangen::{dfa, Dfa};

#[derive(Parser)]
#[command(name = "scangen")]
#[command(version, about = "Compile token specs into DFA scanners", long_about = None)]
struct Cli {
    /// Target language
    #[arg(short, long, value_enum, default_value = "rust")]
    target: TargetKind,

    /// Output file (default: standard output)
    #[arg(short, long, value_name = "outfile")]
    output: Option<PathBuf>,

    /// Spec files (default: standard input)
    #[arg(value_name = "infile")]
    paths: Vec<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum TargetKind {
    /// Graphviz digraphs
    Dot,
    /// Self-contained Rust tables
    Rust,
    /// JSON dump of the automata
    Json,
    /// Run the first automaton over standard input
    Execute,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let text = read_specs(&cli.paths)?;
    let automata = compile(&text)?;

    if cli.target == TargetKind::Execute {
        return execute(&automata);
    }

    let mut sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let mut target: Box<dyn Target> = match cli.target {
        TargetKind::Dot => Box::new(DotTarget),
        TargetKind::Rust => Box::new(RustTarget),
        TargetKind::Json => Box::new(JsonTarget::new()),
        TargetKind::Execute => unreachable!(),
    };

    target.emit_header(&mut sink)?;
    for (name, dfa) in &automata {
        target.emit_automaton(&mut sink, name, dfa)?;
    }
    target.emit_trailer(&mut sink)?;
    sink.flush()?;
    Ok(())
}

fn read_specs(paths: &[PathBuf]) -> Result<String> {
    if paths.is_empty() {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    let mut text = String::new();
    for path in paths {
        let part = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        text.push_str(&part);
        text.push('\n');
    }
    Ok(text)
}

/// Compile every section of the spec that declares tokens.
fn compile(text: &str) -> Result<Vec<(String, Dfa)>> {
    let specs = parse_spec(text, &UnicodeTables)?;
    let mut automata = Vec::new();
    for spec in &specs {
        if spec.is_empty() {
            continue;
        }
        // one interner per compilation; dropped once the DFA exists
        let mut pool = ExprPool::new();
        let resolved = spec.resolve(&mut pool)?;
        let dfa = dfa::build(&mut pool, &resolved)?;
        info!(section = %spec.name, states = dfa.states().len(), "compiled");
        automata.push((spec.name.clone(), dfa));
    }
    if automata.is_empty() {
        bail!("spec declares no tokens");
    }
    Ok(automata)
}

/// Scan standard input with the first automaton and print one
/// `token lexeme` line per match.
fn execute(automata: &[(String, Dfa)]) -> Result<()> {
    let (_, dfa) = &automata[0];
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for item in dfa.scan(input.chars()) {
        let (token, lexeme) = item?;
        let name = dfa.token_name(token).unwrap_or("?");
        writeln!(out, "{} {:?}", name, lexeme)?;
    }
    Ok(())
}
