//! ionql CLI
//!
//! Command-line tool for tokenizing, parsing and (de)serializing queries.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_ionql_core::parser::{self as query, ParseOptions, Parser as QueryParser};
use oxide_ionql_core::protocol::{self, AstVersion, DeserializeOptions, Deserializer};
use oxide_ionql_core::{value, Token, Value};

/// Parser and AST protocol tools for a PartiQL-style query language.
#[derive(Parser)]
#[command(name = "ionql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Maximum nesting accepted when parsing queries or reading serialized
    /// ASTs. Defaults to 200 for queries and 400 for serialized input.
    #[arg(long, env = "IONQL_MAX_DEPTH")]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a query.
    Tokens {
        /// Query text, or `-` for stdin.
        query: String,

        /// Print tokens as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Parse a query and print its serialized AST.
    Parse {
        /// Query text, or `-` for stdin.
        query: String,

        /// Emit the older envelope-less format.
        #[arg(long)]
        v0: bool,

        /// Break nested nodes across lines.
        #[arg(long)]
        pretty: bool,
    },

    /// Check that a query parses.
    Check {
        /// Query text, or `-` for stdin.
        query: String,
    },

    /// Read a serialized AST and print it in the current format.
    Deserialize {
        /// Input file (stdin if not specified).
        file: Option<PathBuf>,

        /// Break nested nodes across lines.
        #[arg(long)]
        pretty: bool,
    },
}

/// One token as printed by `tokens --json`.
#[derive(Serialize)]
struct TokenRow {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    line: usize,
    column: usize,
    length: usize,
}

impl From<&Token> for TokenRow {
    fn from(token: &Token) -> Self {
        Self {
            kind: token.kind.describe(),
            value: token.value.as_ref().map(Value::to_string),
            line: token.span.line,
            column: token.span.column,
            length: token.span.length,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = parse_options(cli.max_depth);

    match cli.command {
        Commands::Tokens { query, json } => {
            let query = read_query(&query)?;
            let tokens = oxide_ionql_core::tokenize(&query)?;
            debug!(count = tokens.len(), "tokenized");
            let rows: Vec<TokenRow> = tokens.iter().map(TokenRow::from).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    println!(
                        "{:>4}:{:<4} {:<20} {}",
                        row.line,
                        row.column,
                        row.kind,
                        row.value.as_deref().unwrap_or("")
                    );
                }
            }
        }

        Commands::Parse { query, v0, pretty } => {
            let query = read_query(&query)?;
            let expr = QueryParser::with_options(&query, options).parse_statement()?;
            let version = if v0 { AstVersion::V0 } else { AstVersion::CURRENT };
            print_value(&protocol::serialize_with_version(&expr, version), pretty);
        }

        Commands::Check { query } => {
            let query = read_query(&query)?;
            QueryParser::with_options(&query, options).parse_statement()?;
            info!("OK");
        }

        Commands::Deserialize { file, pretty } => {
            let text = match file {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => read_stdin()?,
            };
            let expr = deserializer(cli.max_depth).deserialize_str(&text)?;
            print_value(&protocol::serialize(&expr), pretty);
        }
    }

    Ok(())
}

fn parse_options(max_depth: Option<usize>) -> ParseOptions {
    ParseOptions {
        max_depth: max_depth.unwrap_or(query::DEFAULT_MAX_DEPTH),
    }
}

fn deserializer(max_depth: Option<usize>) -> Deserializer {
    Deserializer::with_options(DeserializeOptions {
        max_depth: max_depth.unwrap_or(value::DEFAULT_MAX_DEPTH),
    })
}

/// Returns the query argument, or stdin for `-`.
fn read_query(arg: &str) -> anyhow::Result<String> {
    if arg == "-" {
        read_stdin()
    } else {
        Ok(arg.to_string())
    }
}

fn read_stdin() -> anyhow::Result<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("failed to read stdin")?;
    Ok(text)
}

fn print_value(value: &Value, pretty: bool) {
    if pretty {
        println!("{}", value.to_pretty_string());
    } else {
        println!("{value}");
    }
}
