//! iterq CLI: run YAML pipelines over JSON input.

use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use iterq_core::config::{InputFormat, QueryConfig};
use iterq_operators::ext::SequenceExt;
use iterq_operators::json::classify;
use iterq_operators::registry::{JsonSeq, Registry};
use iterq_operators::source::from_vec;
use iterq_planner::{parse_yaml_pipeline, ParsedPipeline};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "iterq")]
#[command(about = "Lazy query pipelines over JSON sequences", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline over an input file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        /// Input file, or `-` for stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Input format: `jsonl` or `json` (overrides config)
        #[arg(long)]
        format: Option<String>,

        /// Stop after this many results (overrides config)
        #[arg(long)]
        limit: Option<usize>,

        /// Pretty-print each result
        #[arg(long)]
        pretty: bool,
    },

    /// Parse a pipeline and check every step's arguments
    Validate {
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Print the steps and effective configuration of a pipeline
    Explain {
        #[arg(short, long)]
        pipeline: PathBuf,
    },
}

/// Flag overrides; applied last.
#[derive(Debug, Default)]
struct Overrides {
    format: Option<InputFormat>,
    limit: Option<usize>,
    pretty: bool,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            input,
            format,
            limit,
            pretty,
        } => {
            let result = parse_format(format.as_deref()).and_then(|format| {
                let overrides = Overrides {
                    format,
                    limit,
                    pretty,
                };
                run_pipeline(&pipeline, &input, &overrides)
            });
            if let Err(e) = result {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Validate { pipeline } => {
            if let Err(e) = validate_pipeline(&pipeline) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Pipeline is valid");
        }
        Commands::Explain { pipeline } => match load_pipeline(&pipeline) {
            Ok(parsed) => print!("{}", parsed.explain()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
    }
}

fn parse_format(format: Option<&str>) -> CliResult<Option<InputFormat>> {
    match format {
        None => Ok(None),
        Some(s) => InputFormat::parse(s)
            .map(Some)
            .ok_or_else(|| format!("unknown input format '{}'", s).into()),
    }
}

fn init_tracing(config: &QueryConfig) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.log_level.to_lowercase())
            }),
        )
        .try_init()
        .ok();
}

fn load_pipeline(path: &Path) -> CliResult<ParsedPipeline> {
    let yaml_content = fs::read_to_string(path)?;
    let parsed = parse_yaml_pipeline(&yaml_content)?;
    init_tracing(&parsed.config);
    Ok(parsed)
}

fn apply_overrides(config: &mut QueryConfig, overrides: &Overrides) {
    if let Some(format) = overrides.format {
        config.input_format = format;
    }
    if let Some(limit) = overrides.limit {
        config.output_limit = Some(limit);
    }
    if overrides.pretty {
        config.pretty = true;
    }
}

fn run_pipeline(pipeline_path: &Path, input: &Path, overrides: &Overrides) -> CliResult<()> {
    let mut parsed = load_pipeline(pipeline_path)?;
    apply_overrides(&mut parsed.config, overrides);

    let registry = Registry::with_builtins();
    parsed.validate(&registry)?;

    let source = read_source(input, parsed.config.input_format)?;
    let query = parsed.build(source, &registry)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let emitted = write_results(&query, &parsed.config, &mut out)?;
    tracing::info!(emitted, "pipeline finished");
    Ok(())
}

/// Stream results to `out`, closing the chain early once the limit is hit.
fn write_results<W: Write>(query: &JsonSeq, config: &QueryConfig, out: &mut W) -> CliResult<usize> {
    let mut emitted = 0;
    if config.output_limit == Some(0) {
        return Ok(0);
    }
    for item in query.iter()? {
        let value = item?;
        if config.pretty {
            serde_json::to_writer_pretty(&mut *out, &value)?;
        } else {
            serde_json::to_writer(&mut *out, &value)?;
        }
        writeln!(out)?;
        emitted += 1;
        if config.output_limit.is_some_and(|limit| emitted >= limit) {
            break;
        }
    }
    out.flush()?;
    Ok(emitted)
}

fn read_source(input: &Path, format: InputFormat) -> CliResult<JsonSeq> {
    let reader: Box<dyn Read> = if input.as_os_str() == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(fs::File::open(input)?)
    };
    parse_input(BufReader::new(reader), format)
}

fn parse_input<R: BufRead>(mut reader: R, format: InputFormat) -> CliResult<JsonSeq> {
    match format {
        InputFormat::Jsonl => {
            let mut items = Vec::new();
            for (n, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let value: Value = serde_json::from_str(&line)
                    .map_err(|e| format!("line {}: {}", n + 1, e))?;
                items.push(value);
            }
            Ok(from_vec(items).boxed())
        }
        InputFormat::Json => {
            let mut text = String::new();
            reader.read_to_string(&mut text)?;
            let value: Value = serde_json::from_str(&text)?;
            Ok(classify(value)?.boxed())
        }
    }
}

fn validate_pipeline(pipeline_path: &Path) -> CliResult<()> {
    let parsed = load_pipeline(pipeline_path)?;
    parsed.validate(&Registry::with_builtins())?;
    Ok(())
}
