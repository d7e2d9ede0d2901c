//! CyberBasic CLI

use clap::{Parser, Subcommand};
use cyberbasic::{Host, Interpreter, InterpreterConfig};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cyberbasic", version, about = "CyberBasic - BASIC-derived scripting runtime")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program from its JSON AST
    Run {
        /// Program file (serialized AST)
        file: PathBuf,
        /// Start in OPTION EXPLICIT mode
        #[arg(long)]
        strict: bool,
        /// Enable debug diagnostics
        #[arg(short, long)]
        debug: bool,
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Decode and pretty-print a program (debug)
    Dump {
        /// Program file (serialized AST)
        file: PathBuf,
    },
}

fn main() {
    cyberbasic::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            file,
            strict,
            debug,
            config,
        } => run_file(&file, strict, debug, config.as_deref()),
        Command::Dump { file } => dump_file(&file),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run_file(path: &Path, strict: bool, debug: bool, config: Option<&Path>) -> cyberbasic::Result<i32> {
    let mut config = match config {
        Some(path) => InterpreterConfig::load(path)?,
        None => InterpreterConfig::default(),
    };
    // Flags only ever switch modes on
    config.strict |= strict;
    config.debug |= debug;

    let program = cyberbasic::load_program(path)?;
    let mut host = Host::new();
    cyberbasic::console::register_console(&mut host.functions)?;

    let mut interp = Interpreter::new(&host).with_config(config);
    Ok(interp.interpret(&program))
}

fn dump_file(path: &Path) -> cyberbasic::Result<i32> {
    let program = cyberbasic::load_program(path)?;
    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(0)
}
