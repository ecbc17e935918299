//! czi-skim - inspect Zeiss CZI files and wrap their planes as NRRD.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use czi_skim::{
    config::{Cli, Command, InfoConfig, InfoOutputFormat, NhdrCheckConfig, SkimConfig},
    detect_format, BlockCache, CziReader, FileInfo, FileRangeReader, NhdrCheck, Skim,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Skim(config) => run_skim(config).await,
        Command::Info(config) => run_info(config).await,
        Command::NhdrCheck(config) => run_nhdrcheck(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
///
/// `RUST_LOG` wins over the verbosity count.
fn init_logging(verbose: u8) {
    let env_filter = match verbose {
        0 => "czi_skim=warn",
        1 => "czi_skim=info",
        2 => "czi_skim=debug",
        _ => "czi_skim=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// =============================================================================
// Skim Command
// =============================================================================

async fn run_skim(config: SkimConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let skim = match Skim::new(config.to_options()) {
        Ok(skim) => skim,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match skim.run().await {
        Ok(report) => {
            info!(
                planes = report.planes,
                padded = report.padded,
                cache_hits = report.cache.hits,
                cache_misses = report.cache.misses,
                "Done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Skim failed for {}: {}", skim.paths().czi.display(), e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Info Command
// =============================================================================

async fn run_info(config: InfoConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let file = match FileRangeReader::open(&config.file).await {
        Ok(file) => file,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let reader = BlockCache::with_capacity(file, config.cache.block_size, config.cache.cache_blocks);

    if let Err(e) = detect_format(&reader).await {
        error!("{}: {}", config.file.display(), e);
        return ExitCode::FAILURE;
    }

    let czi = match CziReader::open(reader).await {
        Ok(czi) => czi,
        Err(e) => {
            error!("{}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut file_info = match FileInfo::collect(&czi).await {
        Ok(file_info) => file_info,
        Err(e) => {
            error!("{}: {}", config.file.display(), e);
            return ExitCode::FAILURE;
        }
    };
    file_info.cache = Some(czi.inner().stats());

    match config.format {
        InfoOutputFormat::Text => print!("{}", file_info.render_text()),
        InfoOutputFormat::Json => match serde_json::to_string_pretty(&file_info) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Could not serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

// =============================================================================
// NhdrCheck Command
// =============================================================================

async fn run_nhdrcheck(config: NhdrCheckConfig) -> ExitCode {
    init_logging(config.verbose);

    let check = match NhdrCheck::new(config.path) {
        Ok(check) => check,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match check.run().await {
        Ok(files) => {
            println!("Searching for line nrrd files in: {}", check.path().display());
            println!("Line files found: {}", files.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
