//! sqlexpr: expression-tree to SQL compiler CLI
//!
//! # Usage
//!
//! ```bash
//! # Compile a serialized expression tree
//! sqlexpr compile where.json --schema schema.json --dialect oracle
//!
//! # Render a literal
//! sqlexpr value '"O'\''Brien"' --dialect mysql
//!
//! # Escape LIKE wildcards
//! sqlexpr escape '50%_off'
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sqlexpr::prelude::*;

#[derive(Parser)]
#[command(name = "sqlexpr")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile ORM expression trees to dialect-correct SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlexpr compile where.json --schema schema.json
    sqlexpr compile select.json --fields --dialect sqlserver
    sqlexpr value 3.14159 --dialect oracle
    sqlexpr dialects")]
struct Cli {
    /// Config file (default: ./sqlexpr.toml, then the user config dir)
    #[arg(short, long, global = true, env = "SQLEXPR_CONFIG")]
    config: Option<PathBuf>,

    /// Target SQL dialect (overrides the config file)
    #[arg(short, long, global = true)]
    dialect: Option<Dialect>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an expression tree from a JSON file
    Compile {
        /// JSON file: { "expression": ..., "aliases": { ... } }
        input: PathBuf,
        /// JSON schema: { "entities": { "Orders": { "table": ..., "fields": [...] } } }
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Render LIKE templates without upper()
        #[arg(long)]
        strip_upper_in_like: bool,
        /// Compile as a select/order-by field list instead of a predicate
        #[arg(long)]
        fields: bool,
    },
    /// Render a JSON value as a SQL literal
    Value { json: String },
    /// Escape LIKE wildcards
    Escape { text: String },
    /// List supported dialects
    Dialects,
}

#[derive(Deserialize)]
struct CompileInput {
    expression: Expression,
    #[serde(default)]
    aliases: AliasMap,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => CompilerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CompilerConfig::discover()?,
    };
    if let Some(d) = cli.dialect {
        config.dialect = d;
    }

    match cli.command {
        Commands::Compile {
            input,
            schema,
            strip_upper_in_like,
            fields,
        } => {
            if strip_upper_in_like {
                config.strip_upper_in_like = true;
            }
            compile(&config, &input, schema.as_deref(), fields)?;
        }
        Commands::Value { json } => {
            let parsed: serde_json::Value =
                serde_json::from_str(&json)
                    .with_context(|| format!("invalid JSON value: {}", json))?;
            let value = json_to_value(parsed);
            let sql = config
                .dialect_provider()
                .render_value(&value, &value.host_type());
            println!("{}", sql.green());
        }
        Commands::Escape { text } => {
            println!("{}", config.dialect_provider().escape_wildcards(&text));
        }
        Commands::Dialects => {
            for d in Dialect::ALL {
                let marker = if d == config.dialect { "*".green().bold() } else { " ".normal() };
                println!("{} {}", marker, d.as_str().cyan());
            }
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SQLEXPR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn compile(
    config: &CompilerConfig,
    input: &std::path::Path,
    schema: Option<&std::path::Path>,
    fields: bool,
) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let request: CompileInput =
        serde_json::from_str(&content)
            .context("input must be { \"expression\": ..., \"aliases\": ... }")?;

    let registry = match schema {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            SchemaRegistry::from_json(&json).context("invalid schema JSON")?
        }
        None => SchemaRegistry::new(),
    };

    let compiler = ExpressionCompiler::new(config.dialect_provider(), &registry)
        .with_options(config.compile_options());
    let result = if fields {
        compiler.compile_field_list(&request.expression, &request.aliases)
    } else {
        compiler.compile_predicate(&request.expression, &request.aliases)
    };

    match result {
        Ok(sql) => {
            println!("{}", sql);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            eprintln!("  {} {}", "expression:".dimmed(), request.expression);
            std::process::exit(1);
        }
    }
}

fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::List(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(map) => {
            let mut record = Record::new("Object");
            for (k, v) in map {
                record.fields.push((k, json_to_value(v)));
            }
            Value::Object(record)
        }
    }
}
