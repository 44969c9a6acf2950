use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::scanner::Scanner;
use rox::{Config, LoxError, RunStatus, Session};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Do not treat unused local variables as errors
    #[arg(long, global = true)]
    allow_unused: bool,

    /// Maximum call depth before a run aborts with "Stack overflow."
    #[arg(long, global = true, value_name = "N", default_value_t = Config::DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt
    Repl,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            report_unused: !self.allow_unused,
            max_call_depth: self.max_depth,
        }
    }
}

/// Reads the contents of a file into a Vec<u8>
fn read_file(filename: &PathBuf) -> Result<Vec<u8>> {
    info!("Reading file: {:?}", filename);
    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn read_source(filename: &PathBuf) -> Result<String> {
    let buf = read_file(filename)?;
    String::from_utf8(buf)
        .map_err(LoxError::from)
        .context(format!("{:?} is not valid UTF-8", filename))
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'rox::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
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

fn tokenize(filename: &PathBuf, json: bool) -> Result<RunStatus> {
    let buf = read_file(filename)?;
    let mut tokens = Vec::new();
    let mut status = RunStatus::Ok;

    for token in Scanner::new(&buf) {
        match token {
            Ok(token) => {
                debug!("Scanned token: {}", token);
                tokens.push(token);
            }
            Err(e) => {
                status = RunStatus::StaticError;
                eprintln!("{}", e);
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&tokens).context("Failed to serialize tokens")?
        );
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    Ok(status)
}

fn repl(config: Config) -> Result<RunStatus> {
    let mut session = Session::new(config);
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        if stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read input")?
            == 0
        {
            println!();
            break;
        }

        let status = session.run_line(&line);
        debug!("REPL line finished with {:?}", status);
    }

    Ok(RunStatus::Ok)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let config = args.config();

    let status = match &args.commands {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");
            tokenize(filename, *json)?
        }

        Commands::Evaluate { filename } => {
            info!("Running Evaluate subcommand");
            let source = read_source(filename)?;
            let mut session = Session::new(config);

            match session.evaluate(&source) {
                Ok(value) => {
                    println!("{}", value);
                    RunStatus::Ok
                }
                Err(status) => status,
            }
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source = read_source(filename)?;
            info!("Provided input:\n {}", source);

            Session::new(config).run(&source)
        }

        Commands::Repl => {
            info!("Running Repl subcommand");
            repl(Config {
                max_call_depth: config.max_call_depth,
                ..Config::repl()
            })?
        }
    };

    if status != RunStatus::Ok {
        debug!("Exiting with {:?}", status);
        std::process::exit(status.exit_code());
    }

    Ok(())
}
