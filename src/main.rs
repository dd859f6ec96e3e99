//! detmark-export - convert a detector response into the normalized
//! annotation text format.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;

use detmark::{
    AnnotationError, AnnotationSession, ConfigError, DetectorResponse, DirectorySink,
    EngineConfig, ImageSize, LogLevel,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Detector response JSON for one image.
    detections: PathBuf,
    /// Natural image width in pixels.
    #[arg(long)]
    width: f64,
    /// Natural image height in pixels.
    #[arg(long)]
    height: f64,
    /// Directory the `.txt` file is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    /// Engine configuration file. Defaults to `detmark-config.json` in the
    /// working directory when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Image name used for the output file name. Defaults to the image path
    /// in the response, then to the response file name.
    #[arg(long)]
    image_name: Option<String>,
    /// Log level override (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = find_config(args.config.as_deref(), Path::new("."));
    let config = match config_path.as_deref() {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    // Logging starts only once the config has picked the level.
    let level = args.log_level.unwrap_or(config.log_level);
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .parse_default_env()
        .init();
    match &config_path {
        Some(path) => log::info!("Using configuration {:?}, log level {}", path, level.name()),
        None => log::info!("Using default configuration, log level {}", level.name()),
    }

    match run(&args, config) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: EngineConfig) -> Result<PathBuf, CliError> {
    let response = DetectorResponse::load(&args.detections)?;
    let image_name = resolve_image_name(args, &response);

    let mut session = AnnotationSession::new(config);
    session.load_image(ImageSize::new(args.width, args.height));
    session.ingest_response(&response)?;

    let mut sink = DirectorySink::new(&args.out_dir);
    let payload = session.export_to(&mut sink, &image_name)?;
    Ok(sink.path_for(&payload))
}

/// Explicit config path, else the default config file in `dir` if present.
fn find_config(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = dir.join(EngineConfig::default_filename());
    local.is_file().then_some(local)
}

fn resolve_image_name(args: &Args, response: &DetectorResponse) -> String {
    if let Some(name) = &args.image_name {
        return name.clone();
    }
    if let Some(name) = response.image_name() {
        return name.to_string();
    }
    file_name(&args.detections)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
