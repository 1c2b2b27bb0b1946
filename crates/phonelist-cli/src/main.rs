mod prompt;
mod registry;
mod workspace;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use phonelist_core::{
    AreaCode, CountryCode, DEFAULT_AREA_CODE_DIGITS, DEFAULT_SUBSCRIBER_DIGITS, DialingPlan,
};
use phonelist_generate::model::{DEFAULT_BATCH_SIZE, default_workers};
use phonelist_generate::{
    GenerateOptions, GenerationEngine, GenerationError, GenerationReport, GenerationRequest,
    ProgressStore,
};
use prompt::Prompter;
use registry::{RunContext, init_run_logging, start_run, write_report};
use thiserror::Error;
use uuid::Uuid;
use workspace::{AreaTable, DEFAULT_OUT_DIR, load_settings, output_file_name};

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("workspace error: {0}")]
    Workspace(#[from] workspace::WorkspaceError),
    #[error(transparent)]
    Core(#[from] phonelist_core::Error),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Core(_)
            | Self::InvalidConfig(_)
            | Self::Generation(GenerationError::Config(_)) => ExitCode::from(2),
            Self::Generation(GenerationError::Incomplete(_)) => ExitCode::from(3),
            _ => ExitCode::FAILURE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "phonelist",
    version,
    about = "Generate every phone number of a set of area codes"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write all numbers of the given area codes, resuming if asked.
    Generate(GenerateArgs),
    /// Show how far a previous run got.
    Status(StatusArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Country calling code, e.g. 1.
    #[arg(long, value_name = "CODE")]
    country: Option<String>,
    /// Area code to generate (repeatable).
    #[arg(long = "area-code", value_name = "CODE", conflicts_with = "state")]
    area_code: Vec<String>,
    /// Take the area codes of this state from the area table.
    #[arg(long, value_name = "STATE")]
    state: Option<String>,
    /// JSON file mapping states to area codes.
    #[arg(long, value_name = "FILE")]
    area_table: Option<PathBuf>,
    /// Output file. Defaults to a dated name under the output directory.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
    /// Worker threads (and ranges per area code).
    #[arg(long)]
    workers: Option<usize>,
    /// Numbers written between two durable progress updates.
    #[arg(long)]
    batch_size: Option<usize>,
    /// Progress file. Defaults to `<out>.progress.json`.
    #[arg(long, value_name = "FILE")]
    progress_file: Option<PathBuf>,
    /// Continue from the progress file.
    #[arg(long, conflicts_with = "fresh")]
    resume: bool,
    /// Ignore any progress file and start over.
    #[arg(long)]
    fresh: bool,
    /// Prefix every number with '+'.
    #[arg(long)]
    plus: bool,
    /// Expected area code length.
    #[arg(long)]
    area_code_digits: Option<usize>,
    /// Subscriber digits enumerated after the area code.
    #[arg(long)]
    subscriber_digits: Option<usize>,
    /// Settings file (TOML). `phonelist.toml` is used when present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Output directory for run records.
    #[arg(long)]
    run_dir: Option<PathBuf>,
    /// Never prompt; missing values are an error.
    #[arg(long, default_value_t = false)]
    no_input: bool,
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Progress file to inspect.
    #[arg(long, value_name = "FILE")]
    progress_file: PathBuf,
    /// Print the raw progress file as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Status(args) => run_status(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let settings = load_settings(args.config.as_deref())?;
    let interactive = !args.no_input && io::stdin().is_terminal();
    let mut prompt = Prompter::new(io::stdin().lock(), io::stdout());

    let plan = DialingPlan::new(
        args.area_code_digits
            .or(settings.area_code_digits)
            .unwrap_or(DEFAULT_AREA_CODE_DIGITS),
        args.subscriber_digits
            .or(settings.subscriber_digits)
            .unwrap_or(DEFAULT_SUBSCRIBER_DIGITS),
    )?;

    let country = match args.country.as_deref() {
        Some(value) => CountryCode::parse(value)?,
        None if interactive => prompt.country_code()?,
        None => return Err(CliError::InvalidConfig("--country is required".to_string())),
    };

    let table = args
        .area_table
        .as_ref()
        .or(settings.area_table.as_ref())
        .map(|path| AreaTable::load(path))
        .transpose()?;

    let (area_codes, state) = if !args.area_code.is_empty() {
        let codes = args
            .area_code
            .iter()
            .map(|code| AreaCode::parse(code, &plan))
            .collect::<Result<Vec<_>, _>>()?;
        (codes, None)
    } else if let Some(state) = args.state.as_deref() {
        let table = table.as_ref().ok_or_else(|| {
            CliError::InvalidConfig("--state requires --area-table".to_string())
        })?;
        let (key, codes) = table.lookup(state).ok_or_else(|| {
            CliError::InvalidConfig(format!("state {state:?} not found in area table"))
        })?;
        let codes = codes
            .iter()
            .map(|code| AreaCode::parse(code, &plan))
            .collect::<Result<Vec<_>, _>>()?;
        (codes, Some(key.to_string()))
    } else if interactive {
        prompt.area_codes(&plan, table.as_ref())?
    } else {
        return Err(CliError::InvalidConfig(
            "at least one --area-code or --state is required".to_string(),
        ));
    };
    if area_codes.is_empty() {
        return Err(CliError::InvalidConfig("no area codes selected".to_string()));
    }

    let out_dir = settings
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
    let default_out = output_file_name(
        &out_dir,
        country.as_str(),
        state.as_deref(),
        chrono::Local::now().date_naive(),
    );
    let output_path = match args.out {
        Some(path) => path,
        None if interactive => prompt.output_path(&default_out)?,
        None => default_out,
    };

    let fallback_workers = settings.workers.unwrap_or_else(default_workers);
    let workers = match args.workers {
        Some(workers) => workers,
        None if interactive => prompt.workers(fallback_workers)?,
        None => fallback_workers,
    };

    let progress_path = args
        .progress_file
        .unwrap_or_else(|| GenerationRequest::default_progress_path(&output_path));
    let resume = if args.resume {
        true
    } else if args.fresh || !progress_path.exists() {
        false
    } else if interactive {
        prompt.confirm(&format!(
            "Previous progress found in {}. Resume? (y/n): ",
            progress_path.display()
        ))?
    } else {
        true
    };

    let options = GenerateOptions {
        workers,
        batch_size: args
            .batch_size
            .or(settings.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE),
        plus_prefix: args.plus || settings.plus_prefix.unwrap_or(false),
    };
    options.validate()?;

    let request = GenerationRequest {
        country_code: country.to_string(),
        area_codes: area_codes.iter().map(ToString::to_string).collect(),
        plan,
        output_path,
        progress_path,
        resume,
    };

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        run_dir: args
            .run_dir
            .or(settings.run_dir)
            .unwrap_or_else(|| PathBuf::from("runs")),
        request: request.clone(),
        options: options.clone(),
    };
    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(event = "run_started", run_id = %run_id, run_dir = %run_paths.root.display());

    let total = area_codes.len() as u64 * plan.space_size();
    println!(
        "Generating {} area code(s) -> {} numbers total",
        area_codes.len(),
        group_thousands(total)
    );
    println!("Output -> {}", request.output_path.display());

    let engine = GenerationEngine::new(options).with_run_id(run_id.clone());
    match engine.run(&request) {
        Ok(result) => {
            write_report(&run_paths, &result.report)?;
            tracing::info!(event = "run_finished", status = "success", run_id = %run_id);
            print_summary(&request.output_path, &result.report, total)
        }
        Err(GenerationError::Incomplete(report)) => {
            write_report(&run_paths, &report)?;
            for issue in &report.failures {
                eprintln!(
                    "area code {} range {} failed: {}",
                    issue.area_code, issue.range, issue.message
                );
            }
            eprintln!(
                "Progress kept in {}; rerun with --resume to retry.",
                request.progress_path.display()
            );
            tracing::info!(event = "run_finished", status = "incomplete", run_id = %run_id);
            Err(GenerationError::Incomplete(report).into())
        }
        Err(err) => {
            tracing::error!(event = "run_finished", status = "failed", run_id = %run_id, error = %err);
            Err(err.into())
        }
    }
}

fn print_summary(output: &Path, report: &GenerationReport, total: u64) -> Result<(), CliError> {
    let size = std::fs::metadata(output)?.len();
    if size == 0 {
        std::fs::remove_file(output)?;
        println!("No numbers generated.");
        return Ok(());
    }

    println!("Done.");
    println!("File -> {}", output.display());
    println!("Size -> {:.2} GB", size as f64 / 1e9);
    println!("Total numbers -> {}", group_thousands(total));
    println!(
        "Written this run -> {} in {} ms",
        group_thousands(report.numbers_written),
        report.duration_ms
    );
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<(), CliError> {
    let store = ProgressStore::load(&args.progress_file)?.ok_or_else(|| {
        CliError::InvalidConfig(format!(
            "no progress file at {}",
            args.progress_file.display()
        ))
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&store)?);
        return Ok(());
    }

    let space = store.plan().space_size();
    println!("country code: {}", store.country_code);
    println!("output: {}", store.output_path.display());
    for (area, progress) in &store.areas {
        let done = space.saturating_sub(progress.remaining());
        println!(
            "area {area}: {} / {} ({:.1}%){}",
            group_thousands(done),
            group_thousands(space),
            done as f64 * 100.0 / space as f64,
            if progress.is_complete() { " complete" } else { "" }
        );
        for (index, range) in progress.ranges.iter().enumerate() {
            println!(
                "  range {index}: {}..{} next {}",
                range.start, range.end, range.next
            );
        }
    }
    Ok(())
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
