//! Command-line front end.
//!
//! Wires the real adapters together: reqwest for HTTP, the stderr status
//! line for controls, and either a file or an in-memory buffer as the
//! answer surface.
//!
//! ```ignore
//! use captioneer::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args())?;
//! let ok = run_cli_command(command).await?;
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, Action, ArgsError, CliCommand, CliOptions, USAGE};
pub use version::{version_line, VERSION};

use std::path::Path;
use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;

use crate::adapters::{LoggingPreviewHost, ReqwestHttpClient, TerminalControls};
use crate::api::ImageFile;
use crate::config::ClientConfig;
use crate::health::check_backend;
use crate::orchestrator::{Orchestrator, Outcome, ScaleTestConfig};
use crate::render::{render_html, FileSurface, MemorySurface};
use crate::session::Session;
use crate::traits::Surface;

/// Where rendered answers go.
enum Output {
    Memory(Arc<MemorySurface>),
    File(Arc<FileSurface>),
}

impl Output {
    fn new(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Output::File(Arc::new(FileSurface::new(path))),
            None => Output::Memory(Arc::new(MemorySurface::new())),
        }
    }

    fn surface(&self) -> Arc<dyn Surface> {
        match self {
            Output::Memory(surface) => surface.clone(),
            Output::File(surface) => surface.clone(),
        }
    }

    /// Print the final HTML unless it already went to a file.
    fn finish(&self) {
        match self {
            Output::Memory(surface) => {
                if let Some(html) = surface.latest() {
                    println!("{}", html.trim_end());
                }
            }
            Output::File(surface) => {
                eprintln!("Wrote {}", surface.path().display());
            }
        }
    }
}

/// Apply command-line overrides on top of the environment config.
fn effective_config(options: &CliOptions) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &options.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(tokens) = options.max_new_tokens {
        config = config.with_max_new_tokens(tokens);
    }
    if let Some(strategy) = options.strategy {
        config = config.with_batch_strategy(strategy);
    }
    config
}

async fn load_images(paths: &[std::path::PathBuf]) -> Result<Vec<ImageFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = ImageFile::from_path(path)
            .await
            .wrap_err_with(|| format!("Failed to load image {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

/// Execute a parsed command.
///
/// Returns whether the action succeeded. Backend failures have already
/// been painted to the output, so they are reported as `Ok(false)`.
pub async fn run_cli_command(command: CliCommand) -> Result<bool> {
    let (action, options) = match command {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(true);
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(true);
        }
        CliCommand::Run { action, options } => (action, options),
    };

    let config = effective_config(&options);
    let client = ReqwestHttpClient::from_config(&config)
        .wrap_err("Failed to build HTTP client")?;
    let output = Output::new(options.out.as_deref());

    if action == Action::Health {
        tracing::info!("Checking {}", config.base_url);
        let report = check_backend(&client, &config.base_url).await;
        output.surface().paint(&render_html(&report.to_markdown()));
        output.finish();
        return Ok(report.is_healthy());
    }

    let session = Session::new(
        Arc::new(TerminalControls::new()),
        Arc::new(LoggingPreviewHost::new()),
        &config,
    );
    session.set_prompt(options.prompt.clone().unwrap_or_default());
    session.select_files(load_images(&options.images).await?);

    let orchestrator = Orchestrator::new(Arc::new(client), config, session, output.surface());
    let result = match action {
        Action::Ask => orchestrator.run().await,
        Action::Stream => orchestrator.runstream().await,
        Action::Describe => orchestrator.describe_image().await,
        Action::DescribeBatch => orchestrator.describe_images_batch().await,
        Action::DescribeStreamBatch => orchestrator.describe_images_stream_batch().await,
        Action::DescribeBatchStream => orchestrator.describe_images_batch_stream().await,
        Action::ScaleTest => {
            let scale = ScaleTestConfig::new(options.endpoint, options.requests, options.concurrency);
            orchestrator
                .run_scale_test(scale)
                .await
                .map(|report| match report {
                    Some(report) if report.failures().is_empty() => Outcome::Completed,
                    _ => Outcome::Skipped,
                })
        }
        Action::Health => unreachable!("handled above"),
    };
    output.finish();

    match result {
        Ok(Outcome::Completed) => Ok(true),
        Ok(Outcome::Skipped) => Ok(false),
        Err(err) => {
            tracing::debug!("{} failed: {}", err.category(), err);
            Ok(false)
        }
    }
}
