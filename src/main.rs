use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use ferrolox as lox;

use lox::expr::NodeId;
use lox::interpreter::Interpreter;
use lox::parser::Parser;
use lox::resolver::Resolver;
use lox::scanner::Scanner;
use lox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox dialect interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit the token stream as a JSON array instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Runs input from a file as a program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session
    Repl,
}

/// Exit status of one scan/parse/resolve/interpret pipeline run.
enum Outcome {
    Success,
    /// Lex, parse or resolve error; nothing was executed.
    StaticError,
    /// Execution started and stopped at a runtime error.
    RuntimeError,
}

/// Reads the contents of a file into a Vec<u8> through a memory map.
fn read_source(filename: &PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // A zero-length mapping is an error on most platforms.
    if len == 0 {
        return Ok(Vec::new());
    }

    let mmap =
        unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", mmap.len(), filename);
    Ok(mmap.to_vec())
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with timestamp, module and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'ferrolox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("ferrolox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{} {}:{}] - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Scan, parse, resolve and interpret one source fragment against a live
/// interpreter.  `next_id` threads the parser's node-id counter between
/// fragments so REPL lines never collide in the binding table.
fn run_fragment(source: &[u8], interpreter: &mut Interpreter, next_id: &mut NodeId) -> Outcome {
    let mut tokens: Vec<Token> = Vec::new();
    let mut lex_failed = false;

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => {
                lex_failed = true;
                eprintln!("{}", e);
            }
        }
    }

    if lex_failed {
        debug!("Lexing failed");
        return Outcome::StaticError;
    }

    let mut parser = Parser::starting_at(tokens, *next_id);
    let statements = parser.parse();
    *next_id = parser.next_id();

    if !parser.errors().is_empty() {
        debug!("Parsing failed with {} error(s)", parser.errors().len());
        for error in parser.errors() {
            eprintln!("{}", error);
        }
        return Outcome::StaticError;
    }

    let resolve_errors = Resolver::new(interpreter).resolve(&statements);
    if !resolve_errors.is_empty() {
        debug!("Resolution failed with {} error(s)", resolve_errors.len());
        for error in &resolve_errors {
            eprintln!("{}", error);
        }
        return Outcome::StaticError;
    }

    match interpreter.interpret(&statements) {
        Ok(()) => Outcome::Success,
        Err(e) => {
            debug!("Runtime debug: {}", e);
            eprintln!("{}", e);
            Outcome::RuntimeError
        }
    }
}

fn repl() -> Result<()> {
    info!("Starting REPL session");

    let mut interpreter = Interpreter::new();
    let mut next_id: NodeId = 0;

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        line.clear();
        let bytes = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        // EOF (ctrl-D) ends the session.
        if bytes == 0 {
            println!();
            break;
        }

        if line.trim().is_empty() {
            continue;
        }

        // Errors are reported and the session continues; definitions from
        // earlier lines survive.
        run_fragment(line.as_bytes(), &mut interpreter, &mut next_id);
    }

    info!("REPL session ended");
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logger before parsing CLI args
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");
                let buf = read_source(&filename)?;
                let mut tokens: Vec<Token> = Vec::new();
                let mut tokenized = true;

                for item in Scanner::new(&buf) {
                    match item {
                        Ok(token) => {
                            debug!("Scanned token: {}", token);
                            tokens.push(token);
                        }

                        Err(e) => {
                            tokenized = false;

                            debug!("Tokenization debug: {}", e);

                            eprintln!("{}", e);
                        }
                    }
                }

                if json {
                    let rendered = serde_json::to_string_pretty(&tokens)
                        .context("Failed to serialize tokens")?;
                    println!("{}", rendered);
                } else {
                    for token in &tokens {
                        println!("{}", token);
                    }
                }

                if !tokenized {
                    debug!("Tokenization failed, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Tokenization completed successfully");
            }
            None => {
                info!("No filepath provided for Tokenize");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                let buf = read_source(&filename)?;
                let mut interpreter = Interpreter::new();
                let mut next_id: NodeId = 0;

                match run_fragment(&buf, &mut interpreter, &mut next_id) {
                    Outcome::Success => {
                        info!("Program completed successfully");
                    }

                    Outcome::StaticError => {
                        debug!("Static analysis failed, exiting with code 65");
                        std::process::exit(65);
                    }

                    Outcome::RuntimeError => {
                        debug!("Runtime error, exiting with code 70");
                        std::process::exit(70);
                    }
                }
            }
            None => {
                info!("No filepath provided for Run");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Repl => repl()?,
    }

    Ok(())
}
