mod output;

use clap::{Parser, ValueEnum};
use mt940_parser::{EngineKind, Mt940Parser, ParseError, ParserConfig};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "cli_converter",
    version,
    about = "Разбирает выписки MT940 и выводит их в JSON, CSV или таблицей.",
    long_about = None,
)]
struct Args {
    /// Входной файл MT940
    #[arg(long)]
    input: PathBuf,

    /// Формат вывода
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Использовать этот движок вместо автоопределения (general, hsbc)
    #[arg(long)]
    engine: Option<EngineKind>,

    /// Сохранять исходный текст выписок и проводок (только для json)
    #[arg(long)]
    keep_raw: bool,

    /// Подробные логи в stderr
    #[arg(long, short)]
    verbose: bool,
}

/// Поддерживаемые форматы вывода
#[derive(Copy, Clone, Debug, ValueEnum)]
enum Format {
    Json,
    Csv,
    Table,
}

/// Ошибки утилиты
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    let raw = fs::read_to_string(&args.input).map_err(|source| CliError::Read {
        path: args.input.clone(),
        source,
    })?;

    let mut config = ParserConfig::default().with_raw_data(args.keep_raw);
    if let Some(engine) = args.engine {
        config = config.with_forced_engine(engine);
    }

    let parser = Mt940Parser::new(config);
    let statements = parser.parse_checked(&raw)?;

    let flagged = statements
        .iter()
        .flat_map(|s| s.transactions())
        .filter(|tx| !tx.issues.is_empty())
        .count();
    tracing::info!(
        input = %args.input.display(),
        engine = %parser.select_engine(&raw),
        statements = statements.len(),
        flagged,
        "mt940 file parsed"
    );

    let stdout = io::stdout();
    let handle = stdout.lock();

    match args.format {
        Format::Json => output::write_json(handle, &statements)?,
        Format::Csv => output::write_csv(handle, &statements)?,
        Format::Table => output::write_table(handle, &statements)?,
    }

    Ok(())
}
