//! qfilter: compile and run filter descriptors
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL for a descriptor
//! qfilter compile users.json
//!
//! # Same, for PostgreSQL with inline literals
//! echo '{"table":"users","filter":[{"type":"in","name":"id","value":[1,2]}]}' \
//!     | qfilter compile - --dialect postgres --inline
//!
//! # Execute against a database
//! qfilter run users.json --database-url postgres://localhost/app
//! ```

use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use qfilter::engine::logging_hook;
use qfilter::mapper::Row;
use qfilter::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qfilter")]
#[command(version)]
#[command(about = "Filter descriptors in, dialect SQL out", long_about = None)]
#[command(after_help = "EXAMPLES:
    qfilter compile users.json
    qfilter compile - --dialect postgres --inline < users.json
    qfilter run users.json --format json")]
struct Cli {
    /// SQL dialect (overrides the config file)
    #[arg(short, long, global = true)]
    dialect: Option<Dialect>,

    /// Escape values into the SQL text instead of binding them
    #[arg(long, global = true)]
    inline: bool,

    /// Reject unknown condition kinds
    #[arg(long, global = true)]
    strict: bool,

    /// Language code for localized columns
    #[arg(short, long, global = true)]
    language: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON descriptor and print the SQL with its bindings
    Compile {
        /// Descriptor file, or `-` for stdin
        input: String,
    },
    /// Compile and execute a JSON descriptor
    Run {
        /// Descriptor file, or `-` for stdin
        input: String,

        /// Database connection URL
        #[arg(long, env = "QFILTER_DATABASE_URL")]
        database_url: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show the mutation sigil reference
    Sigils,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "qfilter=debug" } else { "qfilter=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Compile { input } => compile(&cli, input),
        Commands::Run {
            input,
            database_url,
            format,
        } => run(&cli, input, database_url.as_deref(), format).await,
        Commands::Sigils => {
            show_sigils();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn read_descriptor(input: &str, cli: &Cli) -> anyhow::Result<FilterCmd> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading {}", input))?
    };

    let mut cmd: FilterCmd = serde_json::from_str(&content).context("parsing descriptor")?;
    if let Some(lang) = &cli.language {
        cmd.language = Some(lang.clone());
    }
    Ok(cmd)
}

fn build_compiler(cli: &Cli, config: &Config) -> Compiler {
    let mut options = config.compiler.options.clone();
    if cli.inline {
        options.bind_mode = BindMode::Inline;
    }
    if cli.strict {
        options.strict = true;
    }
    Compiler::with_options(cli.dialect.unwrap_or(config.compiler.dialect), options)
}

fn compile(cli: &Cli, input: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let compiler = build_compiler(cli, &config);
    let cmd = read_descriptor(input, cli)?;

    if cli.verbose {
        println!(
            "{} {} on {} ({})",
            "Descriptor:".dimmed(),
            cmd.exec.to_string().cyan(),
            cmd.qualified_table().white(),
            compiler.dialect()
        );
    }

    if cmd.exec == Exec::List {
        let (data, count) = compiler.compile_list(&cmd)?;
        print_statement("Data SQL:", &data);
        println!();
        print_statement("Count SQL:", &count);
    } else {
        print_statement("Generated SQL:", &compiler.compile(&cmd)?);
    }
    Ok(())
}

fn print_statement(title: &str, stmt: &CompiledStatement) {
    println!("{}", title.green().bold());
    println!("{}", stmt.text.white());

    if !stmt.params.is_empty() {
        println!();
        println!("{}", "Bindings:".cyan());
        for (i, param) in stmt.params.iter().enumerate() {
            match param {
                Param::In(value) => println!("  {} = {}", i + 1, value.to_string().yellow()),
                Param::Out { column } => {
                    println!("  {} => {}", i + 1, format!("out({})", column).magenta())
                }
            }
        }
    }
}

async fn run(
    cli: &Cli,
    input: &str,
    database_url: Option<&str>,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let compiler = build_compiler(cli, &config);
    if compiler.dialect() != Dialect::Postgres {
        bail!("the sqlx executor runs PostgreSQL only; pass --dialect postgres");
    }

    let Some(url) = database_url.or(config.database.url.as_deref()) else {
        bail!("No database URL. Use --database-url or set QFILTER_DATABASE_URL");
    };
    let cmd = read_descriptor(input, cli)?;

    if cli.verbose {
        println!("{} {}", "Connecting to:".dimmed(), url);
    }
    let executor = SqlxExecutor::connect(url).await?;
    let engine = Engine::new(executor, Arc::new(compiler)).with_error_hook(logging_hook());

    let output = engine.exec(&cmd).await?;
    format_output(&output, format);
    Ok(())
}

fn format_output(output: &Output, format: &OutputFormat) {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(output).unwrap_or_default());
        return;
    }

    match output {
        Output::Rows(rows) => print_table(rows),
        Output::Row(Some(row)) => print_table(std::slice::from_ref(row)),
        Output::Row(None) | Output::Value(None) | Output::Count(None) => {
            println!("{}", "(no results)".dimmed())
        }
        Output::Value(Some(value)) => println!("{}", val_to_string(value)),
        Output::Count(Some(n)) => println!("{}", n.to_string().cyan()),
        Output::Exists(found) => println!("{}", found.to_string().cyan()),
        Output::Affected(n) => println!("{} {} rows affected", "✓".green(), n),
        Output::List(list) => {
            print_table(&list.items);
            println!("{} total", list.count.to_string().cyan());
        }
    }
}

fn print_table(results: &[Row]) {
    if results.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    let columns: Vec<&String> = results
        .iter()
        .flat_map(|row| row.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut widths: HashMap<&String, usize> = columns.iter().map(|c| (*c, c.len())).collect();
    for row in results {
        for (col, val) in row {
            let len = val_to_string(val).len();
            if let Some(w) = widths.get_mut(col) {
                *w = (*w).max(len);
            }
        }
    }

    let header: Vec<String> = columns
        .iter()
        .map(|c| format!("{:width$}", c, width = widths[*c]))
        .collect();
    println!("{}", header.join(" │ ").white().bold());

    let sep: Vec<String> = columns.iter().map(|c| "─".repeat(widths[*c])).collect();
    println!("{}", sep.join("─┼─").dimmed());

    for row in results {
        let cells: Vec<String> = columns
            .iter()
            .map(|c| {
                let val = row.get(*c).map(val_to_string).unwrap_or_default();
                format!("{:width$}", val, width = widths[*c])
            })
            .collect();
        println!("{}", cells.join(" │ "));
    }

    println!();
    println!("{} row(s) returned", results.len().to_string().cyan());
}

fn val_to_string(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}

fn show_sigils() {
    println!("{}", "qfilter mutation sigils".cyan().bold());
    println!();

    let sigils = [
        ("col", "Set", "Assign the value", "\"col\" = :n"),
        ("+col", "Add", "Increment", "COALESCE(\"col\",0) + :n"),
        ("-col", "Subtract", "Decrement", "COALESCE(\"col\",0) - :n"),
        ("*col", "Multiply", "Scale up", "COALESCE(\"col\",0) * :n"),
        ("/col", "Divide", "Scale down", "COALESCE(\"col\",0) / :n"),
        (">col", "Greatest", "Raise to at least", "GREATEST(\"col\",:n)"),
        ("<col", "Least", "Lower to at most", "LEAST(\"col\",:n)"),
        ("!col", "Toggle", "Flip 0/1", "CASE \"col\" WHEN 1 THEN 0 ELSE 1 END"),
        ("=col", "Raw", "Raw SQL, insert and update", "<value as SQL>"),
        ("#col", "RawUpdate", "Raw SQL, update only", "<value as SQL>"),
    ];

    println!(
        "{:8} {:12} {:28} {}",
        "Key".white().bold(),
        "Op".white().bold(),
        "Function".white().bold(),
        "SQL Equivalent".white().bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for (key, op, function, sql) in sigils {
        println!(
            "{:8} {:12} {:28} {}",
            key.cyan().bold(),
            op.yellow(),
            function.white(),
            sql.dimmed()
        );
    }
}
