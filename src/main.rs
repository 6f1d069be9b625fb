use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::config::{InterpreterConfig, DEFAULT_MAX_CALL_DEPTH};
use rox::error::{RunError, EX_DATAERR, EX_USAGE};
use rox::scanner::Scanner;
use rox::session::{self, Session};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    /// Defaults to an interactive prompt
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Don't print the value of bare expression statements
    #[arg(long, global = true)]
    no_echo: bool,

    /// Bind `var x;` to nil instead of leaving it undefined
    #[arg(long, global = true)]
    nil_vars: bool,

    /// Nested call depth that aborts with "Stack overflow."
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses a program and prints it back in canonical form
    Parse {
        filename: PathBuf,

        /// Print the syntax tree as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a program
    Run { filename: PathBuf },

    /// Starts an interactive prompt
    Repl,
}

impl Cli {
    fn config(&self) -> InterpreterConfig {
        InterpreterConfig::default()
            .with_echo(!self.no_echo)
            .with_nil_vars(self.nil_vars)
            .with_max_call_depth(self.max_call_depth)
    }
}

fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("{:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Print every diagnostic of a failed run and return the exit status.
fn report(error: &RunError) -> i32 {
    match error {
        RunError::Syntax(errors) => {
            for e in errors {
                eprintln!("{}", e);
            }
        }
        RunError::Runtime(e) => eprintln!("{}", e),
    }

    error.exit_code()
}

fn tokenize(filename: &Path) -> Result<i32> {
    let source = read_file(filename)?;
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => println!("{}", token),
            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized { 0 } else { EX_DATAERR })
}

fn parse(filename: &Path, json: bool) -> Result<i32> {
    let source = read_file(filename)?;

    let statements = match session::parse_program(&source) {
        Ok(statements) => statements,
        Err(e) => return Ok(report(&e)),
    };

    if json {
        let out = serde_json::to_string_pretty(&statements).context("Failed to serialize AST")?;
        println!("{}", out);
    } else {
        print!("{}", AstPrinter::program(&statements));
    }

    Ok(0)
}

fn evaluate(filename: &Path, config: InterpreterConfig) -> Result<i32> {
    let source = read_file(filename)?;
    let mut session = Session::new(config);

    match session.evaluate(&source) {
        Ok(value) => {
            println!("{}", value);
            Ok(0)
        }
        Err(e) => Ok(report(&e)),
    }
}

fn run(filename: &Path, config: InterpreterConfig) -> Result<i32> {
    let source = read_file(filename)?;
    let mut session = Session::new(config);

    match session.run(&source) {
        Ok(()) => {
            info!("Program executed successfully");
            Ok(0)
        }
        Err(e) => Ok(report(&e)),
    }
}

/// Read-eval-print loop. Errors are reported and the session continues
/// with its globals intact.
fn repl(config: InterpreterConfig) -> Result<i32> {
    let mut session = Session::new(config);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        if let Err(e) = session.run(&line) {
            report(&e);
        }
    }

    Ok(0)
}

fn main() -> Result<()> {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            process::exit(EX_USAGE);
        }
        Err(e) => e.exit(),
    };

    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let config = args.config();

    let code = match &args.commands {
        Some(Commands::Tokenize { filename }) => tokenize(filename)?,
        Some(Commands::Parse { filename, json }) => parse(filename, *json)?,
        Some(Commands::Evaluate { filename }) => evaluate(filename, config)?,
        Some(Commands::Run { filename }) => run(filename, config)?,
        Some(Commands::Repl) | None => repl(config)?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        process::exit(code);
    }

    Ok(())
}
