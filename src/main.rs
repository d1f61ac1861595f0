use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sqlmeta::{analyze, generalize_sql, AnalyzeOptions, AnalyzerConfig, Query};

#[derive(Parser)]
#[command(name = "sqlmeta")]
#[command(author, version, about = "Extract tables, columns and other metadata from SQL queries")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report metadata for every statement of a query or of SQL files
    Analyze {
        /// Query text to analyze instead of files
        #[arg(short, long, conflicts_with = "paths")]
        query: Option<String>,

        /// SQL files, or directories to search for .sql files
        paths: Vec<PathBuf>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Maximum number of tokens in one statement
        #[arg(long, default_value_t = AnalyzerConfig::DEFAULT_MAX_TOKENS)]
        max_tokens: usize,

        /// Maximum parenthesis nesting depth
        #[arg(long, default_value_t = AnalyzerConfig::DEFAULT_MAX_NESTING_DEPTH)]
        max_nesting_depth: usize,

        /// Maximum depth of sub-queries re-analyzed during column resolution
        #[arg(long, default_value_t = AnalyzerConfig::DEFAULT_MAX_RECURSION_DEPTH)]
        max_recursion_depth: usize,
    },
    /// Print the literal-free fingerprint of a query
    Generalize {
        /// Query text
        sql: String,
    },
    /// Print the tables a query uses, one per line
    Tables {
        /// Query text
        sql: String,
    },
    /// Print the columns a query uses, one per line
    Columns {
        /// Query text
        sql: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            query,
            paths,
            verbose,
            max_tokens,
            max_nesting_depth,
            max_recursion_depth,
        } => {
            let options = AnalyzeOptions {
                query,
                paths,
                config: AnalyzerConfig {
                    max_tokens,
                    max_nesting_depth,
                    max_recursion_depth,
                },
                verbose,
            };

            for report in analyze(options)? {
                println!("{report}");
            }
        }
        Commands::Generalize { sql } => {
            println!("{}", generalize_sql(&sql));
        }
        Commands::Tables { sql } => {
            for table in Query::new(sql).tables()? {
                println!("{table}");
            }
        }
        Commands::Columns { sql } => {
            for column in Query::new(sql).columns()? {
                println!("{column}");
            }
        }
    }

    Ok(())
}
