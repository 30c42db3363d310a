use anyhow::Result;
use clap::{Parser, Subcommand};
use cotton_diagnostics::Diagnostic;
use cotton_runtime::Runtime;
use std::path::PathBuf;

// CLI harness exit codes
const EXIT_OK: i32 = 0;
const EXIT_RUNTIME_ERROR: i32 = 1;
const EXIT_PARSE_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "cotton")]
#[command(version = "0.3.0")]
#[command(about = "Cotton Programming Language Interpreter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Cotton source file
    Run {
        /// Input .ctn file or code string with -c
        #[arg(value_name = "INPUT")]
        input: Option<PathBuf>,

        /// Execute code from string
        #[arg(short, long, value_name = "CODE")]
        code: Option<String>,
    },

    /// Check syntax without running
    Check {
        /// Input .ctn file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Dump the parsed AST as JSON
        #[arg(long)]
        dump_ast: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Run { input, code } => cmd_run(input, code),
        Commands::Check { input, dump_ast } => cmd_check(input, dump_ast),
    };
    std::process::exit(code);
}

fn read_input(input: Option<PathBuf>, code: Option<String>) -> Result<(String, String, Option<PathBuf>)> {
    if let Some(code) = code {
        return Ok((code, "<inline>".to_string(), None));
    }
    let Some(path) = input else {
        anyhow::bail!("Either INPUT file or -c CODE must be provided");
    };
    let source = std::fs::read_to_string(&path)?;
    Ok((source, path.display().to_string(), Some(path)))
}

fn cmd_run(input: Option<PathBuf>, code: Option<String>) -> i32 {
    let (source, file, path) = match read_input(input, code) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {}", e);
            return EXIT_RUNTIME_ERROR;
        }
    };

    let mut rt = Runtime::new();
    rt.source_path = path;

    let program = {
        let parsed = cotton_parser::Parser::new(&source, &mut rt.names)
            .and_then(|mut p| p.parse_program());
        match parsed {
            Ok(p) => p,
            Err(e) => {
                report_parse_error(&file, &source, e);
                return EXIT_PARSE_ERROR;
            }
        }
    };

    log::info!("running {}", file);
    match rt.run_program(&program, false) {
        Ok(_) => EXIT_OK,
        Err(e) => {
            report_runtime_error(&file, &source, &e);
            EXIT_RUNTIME_ERROR
        }
    }
}

fn cmd_check(input: PathBuf, dump_ast: bool) -> i32 {
    let source = match std::fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return EXIT_PARSE_ERROR;
        }
    };
    let file = input.display().to_string();

    let mut names = cotton_ast::NameTable::new();
    let parsed = cotton_parser::Parser::new(&source, &mut names)
        .and_then(|mut p| p.parse_program());
    match parsed {
        Ok(program) => {
            if dump_ast {
                match serde_json::to_string_pretty(&program) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("error: failed to serialize AST: {}", e),
                }
            } else {
                println!("Syntax OK");
            }
            EXIT_OK
        }
        Err(e) => {
            report_parse_error(&file, &source, e);
            EXIT_PARSE_ERROR
        }
    }
}

fn report_parse_error(file: &str, source: &str, e: cotton_parser::ParseError) {
    let span = clamp_span(e.span(), source.len());
    let diag = Diagnostic::error(e.to_string(), span);
    eprint!("{}", diag.format(file, source));
}

fn report_runtime_error(file: &str, source: &str, e: &cotton_runtime::RuntimeError) {
    let mut diag = Diagnostic::error(e.message.clone(), e.span.start..e.span.end);
    for area in &e.trace {
        diag = diag.with_note("Error occurred here".to_string(), area.start..area.end);
    }
    eprint!("{}", diag.format(file, source));
}

fn clamp_span(span: std::ops::Range<usize>, len: usize) -> std::ops::Range<usize> {
    span.start.min(len)..span.end.min(len)
}
