use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use encryscript_highlight::lexer::format_tokens;
use encryscript_highlight::render::{dump_json, dump_text, paint_line};
use encryscript_highlight::{RuleTable, Scanner, State, Vocabulary};

#[derive(Parser)]
#[command(name = "encryscript-highlight")]
#[command(author, version, about = "Syntax highlighter for EncryScript", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file overriding the built-in word lists
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,

    /// State the first line starts in
    #[arg(long, global = true, default_value = "start")]
    state: State,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DumpFormat {
    /// One token per line (default)
    #[value(name = "text")]
    Text,
    /// JSON array, one entry per source line
    #[value(name = "json")]
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a source file with terminal colors
    Highlight {
        /// The source file to highlight
        input: PathBuf,

        /// Prefix every line with its number and end state
        #[arg(long)]
        show_states: bool,
    },

    /// Dump the classified tokens of a source file
    Tokens {
        /// The source file to tokenize
        input: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: DumpFormat,
    },

    /// Tokenize lines interactively, carrying state from line to line
    Repl,
}

fn main() -> Result<()> {
    // Initialize logger before parsing CLI args
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let result = load_table(cli.vocabulary.as_ref()).and_then(|table| {
        let scanner = Scanner::new(&table);
        match cli.command {
            Commands::Highlight { input, show_states } => {
                highlight(&scanner, input, cli.state, show_states)
            }
            Commands::Tokens { input, format } => tokens(&scanner, input, cli.state, format),
            Commands::Repl => repl(&scanner, cli.state),
        }
    });

    if let Err(e) = result {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

fn load_table(vocabulary: Option<&PathBuf>) -> Result<RuleTable> {
    let vocabulary = match vocabulary {
        Some(path) => {
            log::info!("Loading vocabulary from {:?}", path);
            Vocabulary::from_json_file(path)?
        }
        None => Vocabulary::default(),
    };
    Ok(RuleTable::encryscript(&vocabulary)?)
}

fn read_source(input: &PathBuf) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("Failed to read source file: {:?}", input))
}

fn highlight(scanner: &Scanner<'_>, input: PathBuf, start: State, show_states: bool) -> Result<()> {
    log::debug!("Highlighting {:?}", input);
    let source = read_source(&input)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (i, result) in scanner.scan_lines(&source, start).iter().enumerate() {
        if show_states {
            write!(
                out,
                "{} {} ",
                format!("{:4}", i + 1).dimmed(),
                format!("{:<22}", result.end_state.name()).dimmed()
            )?;
        }
        writeln!(out, "{}", paint_line(result))?;
    }
    Ok(())
}

fn tokens(scanner: &Scanner<'_>, input: PathBuf, start: State, format: DumpFormat) -> Result<()> {
    log::debug!("Tokenizing {:?}", input);
    let source = read_source(&input)?;
    let results = scanner.scan_lines(&source, start);

    match format {
        DumpFormat::Text => println!("{}", dump_text(&results)),
        DumpFormat::Json => println!("{}", dump_json(&results)?),
    }
    Ok(())
}

fn repl(scanner: &Scanner<'_>, start: State) -> Result<()> {
    println!("{}", "EncryScript highlighter REPL".bold());
    println!("Type ':quit' or ':q' to exit, ':help' for help\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut state = start;
    let mut line_number = 1;

    loop {
        // Print prompt
        print!("{}:{:03}> ", state, line_number);
        stdout.flush()?;

        // Read input
        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            println!();
            break;
        }
        let input = input.trim_end_matches(['\n', '\r']);

        // Handle REPL commands
        match input.trim() {
            ":quit" | ":q" => {
                println!("Goodbye!");
                break;
            }
            ":help" | ":h" => {
                println!("REPL commands:");
                println!("  :quit, :q    Exit the REPL");
                println!("  :help, :h    Show this help message");
                println!("  :reset, :r   Go back to the start state");
                println!("\nEvery other line is tokenized in the current state.");
                continue;
            }
            ":reset" | ":r" => {
                state = State::INITIAL;
                continue;
            }
            _ => {}
        }

        let result = scanner.scan(input, state);
        println!("{}", paint_line(&result));
        println!("{}", format_tokens(&result));
        state = result.end_state;
        line_number += 1;
    }

    Ok(())
}
