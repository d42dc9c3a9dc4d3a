use clap::{Args, Parser, Subcommand};
use imgconv::batch::{self, BatchError, BatchOptions};
use imgconv::config::{self, ConfigError, ToolConfig};
use imgconv::imaging::{Dimensions, Format};
use imgconv::output;
use imgconv::pipeline::{ConversionError, ErrorClass, Pipeline};
use imgconv::request::{ParamError, RequestParams};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use thiserror::Error;
use tracing::field::Empty;
use tracing::{Span, error, info, info_span, warn};

/// Path argument meaning stdin (input) or stdout (output).
const STDIO: &str = "-";

/// Shared flags describing the requested output.
#[derive(Args, Clone, Debug)]
struct TargetArgs {
    /// Output width in pixels (omit to derive from height or keep the source width)
    #[arg(long)]
    width: Option<u32>,
    /// Output height in pixels (omit to derive from width or keep the source height)
    #[arg(long)]
    height: Option<u32>,
    /// JPEG quality 1-100 (0 = format default, 100)
    #[arg(long)]
    quality: Option<u32>,
}

#[derive(Parser)]
#[command(name = "imgconv")]
#[command(version)]
#[command(about = "Convert and resize PNG, JPEG and GIF images")]
#[command(long_about = "\
Convert and resize PNG, JPEG and GIF images

Formats are named by MIME type: image/png, image/jpeg, image/gif.

Sizing:
  neither --width nor --height   keep the source size
  only one of them               derive the other from the source aspect ratio
  both                           use exactly that size (may distort)

Examples:
  imgconv convert photo.png thumb.jpg --width 100
  imgconv convert --from image/gif --to image/png - - < in.gif > out.png
  imgconv convert in.png out.jpg --query 'width=300&quality=80'
  imgconv batch --to image/jpeg --height 400 photos/ resized/

Exit status: 0 on success, 2 when the request itself is invalid, 1 when
processing fails.")]
struct Cli {
    /// Config file (default: ./imgconv.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of config
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a single image ('-' for stdin/stdout)
    Convert(ConvertArgs),
    /// Convert every image in a directory tree
    Batch(BatchArgs),
    /// Print a stock imgconv.toml with all options documented
    GenConfig,
}

#[derive(Args, Clone)]
struct ConvertArgs {
    /// Source MIME type (default: from the input extension)
    #[arg(long)]
    from: Option<String>,
    /// Destination MIME type (default: from the output extension, then config)
    #[arg(long)]
    to: Option<String>,
    #[command(flatten)]
    target: TargetArgs,
    /// Query string with width/height/quality, overriding the flags
    #[arg(long)]
    query: Option<String>,
    /// Input file, or '-' for stdin
    input: PathBuf,
    /// Output file, or '-' for stdout
    output: PathBuf,
}

#[derive(Args)]
struct BatchArgs {
    /// Destination MIME type (default: from config)
    #[arg(long)]
    to: Option<String>,
    #[command(flatten)]
    target: TargetArgs,
    /// Write a JSON report of the batch to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Directory to read images from
    input: PathBuf,
    /// Directory to write converted images to
    output: PathBuf,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported destination format: {0:?}")]
    UnsupportedDestination(String),
    #[error("{0} of {1} files failed")]
    BatchFailed(usize, usize),
}

impl CliError {
    fn class(&self) -> ErrorClass {
        match self {
            CliError::Param(e) => e.class(),
            CliError::Conversion(e) => e.class(),
            CliError::UnsupportedDestination(_) => ErrorClass::Client,
            _ => ErrorClass::Server,
        }
    }

    fn exit_code(&self) -> ExitCode {
        match self.class() {
            ErrorClass::Client => ExitCode::from(2),
            ErrorClass::Server => ExitCode::FAILURE,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match config::load_config(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(e) => {
            init_logging(tracing::Level::INFO);
            error!(error = %e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };
    init_logging(if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.logging.level()
    });

    let span = command_span(&cli.command);
    let _entered = span.enter();

    let result = match cli.command {
        Command::Convert(args) => run_convert(&config, args),
        Command::Batch(args) => run_batch(&config, args),
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, class = ?e.class(), "command failed");
            e.exit_code()
        }
    }
}

/// Span wrapping a whole command. Request fields of `convert` are recorded
/// once known, so both the success and the failure line carry them.
fn command_span(command: &Command) -> Span {
    match command {
        Command::Convert(_) => info_span!(
            "convert",
            content_type_src = Empty,
            content_type_dst = Empty,
            width = Empty,
            height = Empty,
            quality = Empty,
        ),
        Command::Batch(_) => info_span!("batch"),
        Command::GenConfig => Span::none(),
    }
}

fn record_request(params: &RequestParams) {
    let span = Span::current();
    span.record("content_type_src", params.content_type.as_str());
    span.record("content_type_dst", params.accept.as_str());
    span.record("width", params.width);
    span.record("height", params.height);
    span.record("quality", params.quality);
}

/// Logs go to stderr so converted images can go to stdout.
fn init_logging(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_convert(config: &ToolConfig, args: ConvertArgs) -> Result<(), CliError> {
    let started = Instant::now();

    let from = args
        .from
        .or_else(|| format_of(&args.input).map(|f| f.mime().to_string()))
        .unwrap_or_default();
    let to = args
        .to
        .or_else(|| format_of(&args.output).map(|f| f.mime().to_string()))
        .unwrap_or_else(|| config.output.format.clone());

    let mut params = RequestParams {
        content_type: from,
        accept: to,
        width: args.target.width.unwrap_or(0),
        height: args.target.height.unwrap_or(0),
        quality: args.target.quality.unwrap_or(config.output.quality),
    };
    if let Some(query) = &args.query {
        params.apply_query(query)?;
    }
    record_request(&params);

    let source: Box<dyn Read> = if is_stdio(&args.input) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(std::fs::File::open(&args.input)?))
    };

    let mut encoded = Vec::new();
    Pipeline::new().execute(params.clone().into_request(source, &mut encoded))?;
    write_output(&args.output, &encoded)?;

    info!(
        bytes = encoded.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "{}",
        describe(&args.input, &args.output, &params)
    );
    Ok(())
}

fn run_batch(config: &ToolConfig, args: BatchArgs) -> Result<(), CliError> {
    let started = Instant::now();

    let destination = match args.to.as_deref() {
        Some(mime) => Format::from_mime(mime)
            .ok_or_else(|| CliError::UnsupportedDestination(mime.to_string()))?,
        None => config
            .output
            .format()
            .ok_or_else(|| CliError::UnsupportedDestination(config.output.format.clone()))?,
    };
    let options = BatchOptions {
        destination,
        width: args.target.width.unwrap_or(0),
        height: args.target.height.unwrap_or(0),
        quality: args.target.quality.unwrap_or(config.output.quality),
    };

    init_thread_pool(&config.processing);
    let jobs = batch::plan_batch(&args.input, &args.output, destination)?;
    info!(
        files = jobs.len(),
        destination = %destination,
        "converting {}",
        args.input.display()
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_batch_event(&event) {
                println!("{}", line);
            }
        }
    });
    let report = batch::run_batch(&Pipeline::new(), &jobs, &options, Some(tx));
    if printer.join().is_err() {
        warn!("progress printer panicked");
    }
    println!();
    println!("{}", output::format_batch_summary(&report));

    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }

    info!(
        converted = report.converted.len(),
        failed = report.failed.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "batch finished"
    );
    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::BatchFailed(report.failed.len(), report.total()))
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == STDIO
}

fn format_of(path: &Path) -> Option<Format> {
    if is_stdio(path) {
        None
    } else {
        Format::from_path(path)
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if is_stdio(path) {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()
    } else {
        std::fs::write(path, bytes)
    }
}

/// Human-readable summary; only called after a successful conversion, so
/// both MIME tags are known.
fn describe(input: &Path, out: &Path, params: &RequestParams) -> String {
    match (
        Format::from_mime(&params.content_type),
        Format::from_mime(&params.accept),
    ) {
        (Some(from), Some(to)) => output::format_conversion(
            input,
            from,
            out,
            to,
            Dimensions::new(params.width, params.height),
        ),
        _ => format!("{} → {}", input.display(), out.display()),
    }
}
