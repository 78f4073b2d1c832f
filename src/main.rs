//! cadenza: compile EMEL scripts and SUSL scores from the command line.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use log::{debug, info};

use cadenza::susl::ast::CommandKind;
use cadenza::susl::reader;
use cadenza::{CompileOutput, CompilerConfig, ParseResult};

#[derive(Parser, Debug)]
#[command(name = "cadenza", version)]
#[command(about = "Compile EMEL scripts and SUSL scores", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.cadenza/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a source file; the header picks the language
    Compile {
        input: PathBuf,
        /// Output path (defaults to the input with a .txt or .bin extension)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print each language's confidence for a source file
    Detect { input: PathBuf },
    /// Summarise a compiled score binary
    Inspect { file: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CompilerConfig::load_from(path).unwrap_or_else(|e| {
            eprintln!("cannot load {}: {e}", path.display());
            process::exit(2);
        }),
        None => CompilerConfig::load(),
    };

    let default_filter = config.log_level.as_deref().unwrap_or("warn");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let code = match cli.command {
        Command::Compile { input, output } => compile(&config, &input, output),
        Command::Detect { input } => detect(&config, &input),
        Command::Inspect { file } => inspect(&file),
    };
    process::exit(code);
}

fn read_source(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            eprintln!("cannot read {}: {e}", path.display());
            None
        }
    }
}

/// Default destination: next to the input, or under `output_dir` if set.
fn output_path(config: &CompilerConfig, input: &Path, out: &CompileOutput) -> PathBuf {
    let path = input.with_extension(out.extension());
    match (&config.output_dir, path.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => path,
    }
}

fn report(input: &Path, result: &ParseResult) {
    let lang = result.language.as_deref().unwrap_or("?");
    for err in &result.errors {
        eprintln!("{}: {lang} {err}", input.display());
    }
}

fn compile(config: &CompilerConfig, input: &Path, output: Option<PathBuf>) -> i32 {
    let Some(text) = read_source(input) else {
        return 1;
    };
    let orchestrator = config.build_orchestrator();
    let result = orchestrator.compile(&text);
    if !result.is_success() {
        report(input, &result);
        return 1;
    }
    let Some(out) = result.output else {
        info!("{} is empty, nothing written", input.display());
        return 0;
    };

    let dest = output.unwrap_or_else(|| output_path(config, input, &out));
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("cannot create {}: {e}", parent.display());
            return 1;
        }
    }
    if let Err(e) = std::fs::write(&dest, out.as_bytes()) {
        eprintln!("cannot write {}: {e}", dest.display());
        return 1;
    }
    debug!("wrote {} bytes", out.as_bytes().len());
    println!(
        "{} -> {} ({})",
        input.display(),
        dest.display(),
        result.language.as_deref().unwrap_or("?")
    );
    0
}

fn detect(config: &CompilerConfig, input: &Path) -> i32 {
    let Some(text) = read_source(input) else {
        return 1;
    };
    let orchestrator = config.build_orchestrator();
    for (name, score) in orchestrator.confidences(&text) {
        println!("{name:<6} {score:>3}");
    }
    0
}

fn inspect(file: &Path) -> i32 {
    let bytes = match std::fs::read(file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("cannot read {}: {e}", file.display());
            return 1;
        }
    };
    let score = match reader::decode(&bytes) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: {e}", file.display());
            return 1;
        }
    };

    println!("version        {}", score.version);
    println!("timebase       {}", score.timebase);
    println!("tempo          {}", score.tempo);
    println!(
        "time signature {}/{}",
        score.time_signature.numerator, score.time_signature.denominator
    );
    println!("defaults       {}", score.defaults.len());

    let mut counts = [0usize; 4];
    for cmd in &score.commands {
        let slot = match cmd.kind {
            CommandKind::Note(_) => 0,
            CommandKind::Rest { .. } => 1,
            CommandKind::Tempo { .. } => 2,
            CommandKind::TimeSignature(_) => 3,
        };
        counts[slot] += 1;
    }
    println!(
        "commands       {} ({} notes, {} rests, {} tempo, {} time signature)",
        score.commands.len(),
        counts[0],
        counts[1],
        counts[2],
        counts[3]
    );
    0
}
