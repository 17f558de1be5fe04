//! keep: compile and run wire-format relations
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL for a relation
//! keep sql --schema schema.toml --query '{"type":"table","name":"blogs"}'
//!
//! # Run it
//! keep run --schema schema.toml --query query.json --database-url sqlite://blog.db
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use keep::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keep")]
#[command(version)]
#[command(about = "Compile relational algebra to SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    keep sql --schema schema.toml --query '{\"type\":\"table\",\"name\":\"blogs\"}'
    keep run --schema schema.toml --query query.json --format json
    keep wire --schema schema.toml --query query.json")]
struct Cli {
    /// Config file (defaults to ./keep.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL and placeholders for a relation
    Sql(QueryArgs),
    /// Execute a relation and print its rows
    Run {
        #[command(flatten)]
        query: QueryArgs,

        /// Database connection URL
        #[arg(long, env = "KEEP_DATABASE_URL")]
        database_url: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Re-emit a relation in canonical wire form
    Wire(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Schema file declaring the tables
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Relation in wire form: inline JSON or a path to a JSON file
    #[arg(short, long)]
    query: String,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = KeepConfig::load(cli.config.as_deref())?;
    init_tracing(&config, cli.verbose);

    match &cli.command {
        Commands::Sql(args) => {
            let (algebra, relation) = load_relation(args, &config)?;
            let (sql, placeholders) = algebra.to_sql(relation)?;
            print_sql(&sql, &placeholders);
        }
        Commands::Wire(args) => {
            let (algebra, relation) = load_relation(args, &config)?;
            let wire = algebra.wire_representation(relation)?;
            println!("{}", serde_json::to_string_pretty(&wire)?);
        }
        Commands::Run {
            query,
            database_url,
            format,
        } => {
            let (algebra, relation) = load_relation(query, &config)?;
            let mut builder = keep::config::KeepConfigBuilder::from_config(config.clone());
            if let Some(url) = database_url {
                builder = builder.database(url.clone());
            }
            let config = builder.build();
            if config.database_url.is_none() {
                anyhow::bail!("No database URL. Use --database-url or set KEEP_DATABASE_URL");
            }

            if cli.verbose {
                let (sql, placeholders) = algebra.to_sql(relation)?;
                print_sql(&sql, &placeholders);
                println!();
            }

            let db = Database::connect_with(&config).await?;
            let tuples = db.all(&algebra, relation).await?;
            match format {
                OutputFormat::Json => {
                    let json: Vec<serde_json::Value> = tuples.iter().map(Tuple::to_json).collect();
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                OutputFormat::Table => print_table(&tuples),
            }
        }
    }
    Ok(())
}

fn init_tracing(config: &KeepConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("keep=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_relation(args: &QueryArgs, config: &KeepConfig) -> Result<(Algebra, RelationId)> {
    let schema_path = args
        .schema
        .clone()
        .or_else(|| config.schema_path.as_ref().map(PathBuf::from))
        .context("No schema. Use --schema or set schema_path in keep.toml")?;
    let mut algebra = SchemaConfig::load(&schema_path)?.to_algebra()?;

    let text = if args.query.trim_start().starts_with('{') {
        args.query.clone()
    } else {
        std::fs::read_to_string(&args.query)
            .with_context(|| format!("Failed to read query file {}", args.query))?
    };
    let wire: serde_json::Value = serde_json::from_str(&text).context("Query is not valid JSON")?;
    let relation = algebra.from_wire(&wire)?;
    Ok((algebra, relation))
}

fn print_sql(sql: &str, placeholders: &Placeholders) {
    println!("{}", "Generated SQL:".green().bold());
    println!("{}", sql.white());

    if !placeholders.is_empty() {
        println!();
        println!("{}", "Placeholders:".cyan());
        for (name, value) in placeholders.iter() {
            println!("  :{} = {}", name, value.to_string().yellow());
        }
    }
}

fn print_table(tuples: &[Tuple]) {
    if tuples.is_empty() {
        println!("{}", "(0 rows)".dimmed());
        return;
    }

    let rows: Vec<Vec<(String, String)>> = tuples.iter().map(flatten).collect();
    let mut headers: Vec<&str> = Vec::new();
    for (name, _) in rows.iter().flatten() {
        if !headers.contains(&name.as_str()) {
            headers.push(name);
        }
    }
    let widths: Vec<usize> = headers
        .iter()
        .map(|header| {
            rows.iter()
                .map(|row| cell(row, header).len())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| format!("{:width$}", header, width = width))
        .collect();
    println!("{}", header_line.join(" | ").bold());
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    println!("{}", rule.join("-+-").dimmed());

    for row in &rows {
        let cells: Vec<String> = headers
            .iter()
            .zip(&widths)
            .map(|(header, width)| format!("{:width$}", cell(row, header), width = width))
            .collect();
        println!("{}", cells.join(" | "));
    }

    println!();
    println!("{}", format!("({} rows)", rows.len()).dimmed());
}

fn cell(row: &[(String, String)], header: &str) -> String {
    row.iter()
        .find(|(name, _)| name == header)
        .map(|(_, value)| value.clone())
        .unwrap_or_else(|| "NULL".to_string())
}

/// `table.column` cells. Unmatched join components contribute no cells.
fn flatten(tuple: &Tuple) -> Vec<(String, String)> {
    match tuple {
        Tuple::Record(record) => record
            .fields()
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect(),
        Tuple::Composite(components) => components
            .iter()
            .filter_map(|(key, record)| record.as_ref().map(|record| (key, record)))
            .flat_map(|(key, record)| {
                record
                    .fields()
                    .iter()
                    .map(move |(name, value)| (format!("{}.{}", key, name), value.to_string()))
            })
            .collect(),
    }
}
