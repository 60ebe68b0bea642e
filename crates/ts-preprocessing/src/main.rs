//! CLI entry point for the time-series preprocessor.

mod logging;

use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, info_span};
use ts_preprocessing::{
    ConvertTarget, FillValue, ImputePolicy, PreprocessConfig, PreprocessError, Preprocessor,
    Scope, SourceFormat, Stage, Statistic, SyntheticSpec, TrendReport, persist,
};

/// CLI-compatible source format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    /// Delimited text (.csv, .tsv, .txt)
    Csv,
    /// Spreadsheet (.xlsx, .xls, .xlsm, .ods)
    Excel,
    /// Row-oriented JSON (.json, .jsonl)
    Json,
    /// Columnar binary (.parquet)
    Parquet,
}

impl From<CliFormat> for SourceFormat {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::Csv => SourceFormat::DelimitedText,
            CliFormat::Excel => SourceFormat::Spreadsheet,
            CliFormat::Json => SourceFormat::RowJson,
            CliFormat::Parquet => SourceFormat::ColumnarBinary,
        }
    }
}

/// CLI-compatible missing value policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImputePolicy {
    /// Drop rows with missing values (in --column, or anywhere)
    Drop,
    /// Fill with --value (in --column, or everywhere it fits)
    Constant,
    /// Fill --column with its mean
    Mean,
    /// Fill --column with its median
    Median,
    /// Fill --column with its maximum
    Max,
    /// Fill --column with its most frequent value
    Mode,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Format-aware time-series preprocessing",
    long_about = "Load a time-series file, normalize it onto a regular time grid, \
                  handle missing values and report trends.\n\n\
                  EXAMPLES:\n  \
                  # Normalize daily and report trends\n  \
                  ts-preprocessing run -i prices.csv\n\n  \
                  # Fill gaps in one column with its median and save the result\n  \
                  ts-preprocessing run -i prices.parquet --impute median --column volume -o out/clean.csv\n\n  \
                  # Write a synthetic dataset in every supported format\n  \
                  ts-preprocessing generate --out-dir data/"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preprocess one file and print a trend report
    Run(RunArgs),
    /// Write a synthetic dataset as CSV, JSON and Parquet
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Path to the time-series file
    #[arg(short, long)]
    input: PathBuf,

    /// Source format (inferred from the extension if omitted)
    #[arg(long, value_enum)]
    format: Option<CliFormat>,

    /// Grid frequency, e.g. D, 6H, 15min (overrides the config file)
    #[arg(long)]
    frequency: Option<String>,

    /// Keep the original timestamps
    #[arg(long)]
    skip_normalize: bool,

    /// Remove exact duplicate rows after loading
    #[arg(long)]
    drop_duplicates: bool,

    /// Convert a column after loading, as COLUMN=TYPE (int, float, text, datetime)
    #[arg(long, value_name = "COLUMN=TYPE")]
    convert: Vec<String>,

    /// Missing value policy
    #[arg(long, value_enum)]
    impute: Option<CliImputePolicy>,

    /// Column the policy applies to
    #[arg(long)]
    column: Option<String>,

    /// Constant for --impute constant
    #[arg(long)]
    value: Option<String>,

    /// Write the processed table here (.csv, .json, .jsonl or .parquet)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output JSON to stdout instead of the text report
    ///
    /// Disables all logs; errors are printed as JSON too.
    #[arg(long)]
    json: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Directory for the generated files
    #[arg(long, default_value = "./data")]
    out_dir: PathBuf,

    /// Number of daily rows
    #[arg(long, default_value = "100")]
    rows: usize,

    /// First date (YYYY-MM-DD)
    #[arg(long, default_value = "2023-01-01")]
    start: String,

    /// Probability that a value is missing (0.0 - 1.0)
    #[arg(long, default_value = "0.1")]
    null_ratio: f64,

    /// Random seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

/// JSON document printed by `run --json`.
#[derive(Serialize)]
struct RunOutput<'a> {
    input: &'a Path,
    format: SourceFormat,
    stage: Stage,
    rows: usize,
    columns: Vec<String>,
    report: TrendReport,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = matches!(&cli.command, Command::Run(args) if args.json);

    let _logging = match logging::init(&cli.log_level, cli.quiet, json, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.command {
        Command::Run(args) => run(args),
        Command::Generate(args) => generate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, json);
            ExitCode::FAILURE
        }
    }
}

fn report_error(e: &anyhow::Error, json: bool) {
    match e.downcast_ref::<PreprocessError>() {
        Some(pe) if json => match serde_json::to_string(pe) {
            Ok(doc) => println!("{}", doc),
            Err(_) => eprintln!("error [{}]: {}", pe.error_code(), pe),
        },
        Some(pe) => {
            error!("{}", pe);
            eprintln!("error [{}]: {}", pe.error_code(), pe);
        }
        None if json => {
            let doc = serde_json::json!({
                "code": "INVALID_ARGUMENT",
                "message": format!("{:#}", e),
            });
            println!("{}", doc);
        }
        None => eprintln!("error: {:#}", e),
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config {}", path.display()))?;
            PreprocessConfig::from_json(&text).map_err(PreprocessError::from)?
        }
        None => PreprocessConfig::default(),
    };
    if let Some(freq) = &args.frequency {
        config.frequency = freq.parse().map_err(|e| anyhow!("--frequency: {}", e))?;
    }

    let conversions = args
        .convert
        .iter()
        .map(|spec| parse_conversion(spec))
        .collect::<Result<Vec<_>>>()?;
    let policy = build_policy(args)?;

    let format = match args.format {
        Some(cli) => cli.into(),
        None => SourceFormat::from_path(&args.input).map_err(PreprocessError::from)?,
    };

    let (pre, report) = process(args, format, config, &conversions, policy.as_ref())?;

    if args.json {
        let table = pre.table().ok_or_else(|| anyhow!("no table after processing"))?;
        let output = RunOutput {
            input: &args.input,
            format,
            stage: pre.stage(),
            rows: table.height(),
            columns: table.value_columns(),
            report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

/// Drive the preprocessor through every requested step.
fn process(
    args: &RunArgs,
    format: SourceFormat,
    config: PreprocessConfig,
    conversions: &[(String, ConvertTarget)],
    policy: Option<&ImputePolicy>,
) -> ts_preprocessing::Result<(Preprocessor, TrendReport)> {
    let span = info_span!("run", input = %args.input.display());
    let mut pre = Preprocessor::new(format)
        .with_config(config)?
        .with_span(span);

    pre.load(&args.input)?;
    if args.drop_duplicates {
        pre.drop_duplicates()?;
    }
    for (column, target) in conversions {
        pre.convert_column(column, *target)?;
    }
    if !args.skip_normalize {
        pre.normalize()?;
    }
    if let Some(policy) = policy {
        pre.handle_missing_values(policy)?;
    }
    let report = pre.trend_analysis()?;

    if let Some(output) = &args.output {
        pre.export(output)?;
        info!("Saved processed table to {}", output.display());
    }
    Ok((pre, report))
}

fn parse_conversion(spec: &str) -> Result<(String, ConvertTarget)> {
    let (column, target) = spec
        .split_once('=')
        .ok_or_else(|| anyhow!("--convert expects COLUMN=TYPE, got '{}'", spec))?;
    let target = target.parse().map_err(|e| anyhow!("--convert {}: {}", column, e))?;
    Ok((column.trim().to_string(), target))
}

fn build_policy(args: &RunArgs) -> Result<Option<ImputePolicy>> {
    let Some(choice) = args.impute else {
        return Ok(None);
    };

    let scope = || match &args.column {
        Some(column) => Scope::Column(column.clone()),
        None => Scope::All,
    };
    let column = || {
        args.column
            .clone()
            .ok_or_else(|| anyhow!("--impute {:?} requires --column", choice))
    };

    let policy = match choice {
        CliImputePolicy::Drop => ImputePolicy::DropRows { scope: scope() },
        CliImputePolicy::Constant => {
            let Some(raw) = &args.value else {
                bail!("--impute constant requires --value");
            };
            ImputePolicy::FillConstant {
                scope: scope(),
                value: FillValue::from(raw.as_str()),
            }
        }
        CliImputePolicy::Mean => ImputePolicy::FillStatistic {
            column: column()?,
            statistic: Statistic::Mean,
        },
        CliImputePolicy::Median => ImputePolicy::FillStatistic {
            column: column()?,
            statistic: Statistic::Median,
        },
        CliImputePolicy::Max => ImputePolicy::FillStatistic {
            column: column()?,
            statistic: Statistic::Max,
        },
        CliImputePolicy::Mode => ImputePolicy::FillMode { column: column()? },
    };
    Ok(Some(policy))
}

fn generate(args: &GenerateArgs) -> Result<()> {
    let start = NaiveDate::parse_from_str(&args.start, "%Y-%m-%d")
        .with_context(|| format!("--start must be YYYY-MM-DD, got '{}'", args.start))?;
    if !(0.0..=1.0).contains(&args.null_ratio) {
        bail!("--null-ratio must be between 0 and 1");
    }

    let spec = SyntheticSpec {
        rows: args.rows,
        start,
        null_ratio: args.null_ratio,
        seed: args.seed,
    };
    let table = ts_preprocessing::generate(&spec)?;
    info!("Generated {} rows", table.height());

    for ext in ["csv", "json", "parquet"] {
        let path = args.out_dir.join(format!("synthetic_data.{}", ext));
        persist::write_table(&table, &path).map_err(PreprocessError::from)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
