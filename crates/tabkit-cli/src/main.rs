//! tabkit CLI: load a delimited file and query it from the shell.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tabkit_core::config::{parse_delimiter, LoadOptions, SessionConfig};
use tabkit_exec::{format_groups, run_notebook, DataFrame, Session};
use tabkit_planner::{parse_expr, parse_notebook};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabkit")]
#[command(about = "Load CSV files into tables and query them with SQL or filters", long_about = None)]
struct Cli {
    /// Rows per parallel partition (overrides TABKIT_PARTITION_ROWS)
    #[arg(long, global = true)]
    partition_rows: Option<usize>,

    /// Local directory backing dbfs:/ locations (overrides TABKIT_DBFS_ROOT)
    #[arg(long, global = true)]
    dbfs_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LoadArgs {
    /// File path, file:// URI or dbfs:/ location
    location: String,

    /// First line holds column names
    #[arg(long)]
    header: bool,

    /// Infer integer/double/boolean column types
    #[arg(long)]
    infer_schema: bool,

    /// Field delimiter (one character, or \t for tab)
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    delimiter: char,
}

impl LoadArgs {
    fn options(&self) -> LoadOptions {
        LoadOptions::csv()
            .with_header(self.header)
            .with_infer_schema(self.infer_schema)
            .with_delimiter(self.delimiter)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the first rows as a grid
    Show {
        #[command(flatten)]
        load: LoadArgs,

        /// Rows to display (defaults to TABKIT_PREVIEW_ROWS or 20)
        #[arg(long)]
        rows: Option<usize>,
    },

    /// Print the column schema
    Schema {
        #[command(flatten)]
        load: LoadArgs,
    },

    /// Register the file as a view and run a query against it
    Sql {
        #[command(flatten)]
        load: LoadArgs,

        /// View name the query refers to
        #[arg(long)]
        view: String,

        /// Query text, e.g. "select * from adult_csv limit 5"
        #[arg(long)]
        query: String,

        /// Rows to display
        #[arg(long)]
        rows: Option<usize>,

        /// Emit JSON lines instead of a grid
        #[arg(long)]
        json: bool,
    },

    /// Count rows, optionally matching a predicate
    Count {
        #[command(flatten)]
        load: LoadArgs,

        /// Predicate, e.g. "income = '>50K' AND education = 'Bachelors'"
        #[arg(long = "where")]
        filter: Option<String>,
    },

    /// Count rows per value of a column
    GroupCount {
        #[command(flatten)]
        load: LoadArgs,

        /// Grouping column
        #[arg(long)]
        column: String,

        /// Predicate applied before grouping
        #[arg(long = "where")]
        filter: Option<String>,
    },

    /// Execute a YAML notebook
    Run {
        /// Path to the notebook YAML file
        #[arg(short, long)]
        notebook: PathBuf,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let mut stdout = io::stdout().lock();
    let result = run(cli, &mut stdout).and_then(|()| Ok(stdout.flush()?));
    let code = exit_code(&result, &mut io::stderr());
    if code != 0 {
        std::process::exit(code);
    }
}

/// Report a failure as `Error: ...` on `err`; returns the process exit code.
fn exit_code(result: &Result<()>, err: &mut impl Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            let _ = writeln!(err, "Error: {e:#}");
            1
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Layer the global flags over `base` (normally `SessionConfig::from_env`).
fn session_config(cli: &Cli, base: SessionConfig) -> SessionConfig {
    let mut config = base;
    if let Some(rows) = cli.partition_rows {
        config = config.with_partition_rows(rows);
    }
    if let Some(root) = &cli.dbfs_root {
        config = config.with_dbfs_root(root.clone());
    }
    config
}

fn load(session: &Session, args: &LoadArgs) -> Result<DataFrame> {
    session
        .load(&args.location, &args.options())
        .with_context(|| format!("loading {}", args.location))
}

fn filtered(df: DataFrame, filter: Option<&str>) -> Result<DataFrame> {
    match filter {
        Some(src) => Ok(df.filter(parse_expr(src)?)?),
        None => Ok(df),
    }
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = session_config(&cli, SessionConfig::from_env());
    debug!(?config, "session config");
    let session = Session::new(config);
    let preview = session.config().preview_rows;

    match cli.command {
        Commands::Show { load: args, rows } => {
            let df = load(&session, &args)?;
            write!(out, "{}", df.show_string(rows.unwrap_or(preview)))?;
        }
        Commands::Schema { load: args } => {
            let df = load(&session, &args)?;
            write!(out, "{}", df.schema_string())?;
        }
        Commands::Sql {
            load: args,
            view,
            query,
            rows,
            json,
        } => {
            let df = load(&session, &args)?;
            session.create_or_replace_temp_view(&view, &df);
            let result = session.sql(&query)?;
            if json {
                write!(out, "{}", result.to_json_lines())?;
            } else {
                write!(out, "{}", result.show_string(rows.unwrap_or(preview)))?;
            }
        }
        Commands::Count { load: args, filter } => {
            let df = filtered(load(&session, &args)?, filter.as_deref())?;
            writeln!(out, "{}", df.count())?;
        }
        Commands::GroupCount {
            load: args,
            column,
            filter,
        } => {
            let df = filtered(load(&session, &args)?, filter.as_deref())?;
            write!(out, "{}", format_groups(&df.group_by_count(&column)?))?;
        }
        Commands::Run { notebook } => {
            let src = fs::read_to_string(&notebook)
                .with_context(|| format!("reading {}", notebook.display()))?;
            let parsed = parse_notebook(&src)?;
            for output in run_notebook(&session, &parsed)? {
                write!(out, "{output}")?;
            }
        }
    }
    Ok(())
}
