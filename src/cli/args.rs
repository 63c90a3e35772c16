//! Command-line argument parsing.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::Endpoint;
use crate::config::{parse_base_url, parse_max_new_tokens, BatchStrategy, ConfigError};

/// Default number of scale-test requests.
pub const DEFAULT_REQUESTS: usize = 10;

/// Default scale-test concurrency.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Usage text for `--help` and argument errors.
pub const USAGE: &str = "\
Usage: captioneer <command> [options] [prompt...]

Commands:
  ask                    Stream an answer from /predict
  stream                 Stream from /predictstream, or describe images if any are given
  describe               Describe the first image (buffered)
  describe-batch         Describe all images in one buffered request
  describe-stream-batch  Stream a description per image, one request each
  describe-batch-stream  Stream all descriptions from one batch request
  scale-test             Load test an endpoint and report latency
  health                 Check /health and /buildinfo

Options:
  --url <url>                Backend base URL
  -p, --prompt <text>        Prompt text (default: remaining arguments)
  -i, --image <path>         Image file; repeat for several
  -o, --out <path>           Write rendered HTML to a file on every update
  -n, --requests <n>         Scale test: number of requests (1-500)
  -c, --concurrency <n>      Scale test: concurrent requests (1-100)
      --endpoint <path>      Scale test: endpoint, e.g. /predictstream
      --max-new-tokens <n>   Token limit for image requests (1-2048)
      --strategy <name>      Several images on `stream`: sequential or server
  -V, --version              Show version
  -h, --help                 Show this help";

/// Argument errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgsError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '{0}' needs a value")]
    MissingValue(String),

    #[error("invalid value '{value}' for '{option}': {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What to do against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Ask,
    Stream,
    Describe,
    DescribeBatch,
    DescribeStreamBatch,
    DescribeBatchStream,
    ScaleTest,
    Health,
}

impl Action {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "ask" | "run" => Action::Ask,
            "stream" | "runstream" => Action::Stream,
            "describe" => Action::Describe,
            "describe-batch" => Action::DescribeBatch,
            "describe-stream-batch" => Action::DescribeStreamBatch,
            "describe-batch-stream" => Action::DescribeBatchStream,
            "scale-test" | "scale" => Action::ScaleTest,
            "health" => Action::Health,
            _ => return None,
        })
    }
}

/// Options shared by every action.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub base_url: Option<String>,
    pub prompt: Option<String>,
    pub images: Vec<PathBuf>,
    pub out: Option<PathBuf>,
    pub requests: usize,
    pub concurrency: usize,
    pub endpoint: Endpoint,
    pub max_new_tokens: Option<u32>,
    pub strategy: Option<BatchStrategy>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            prompt: None,
            images: Vec::new(),
            out: None,
            requests: DEFAULT_REQUESTS,
            concurrency: DEFAULT_CONCURRENCY,
            endpoint: Endpoint::PredictStream,
            max_new_tokens: None,
            strategy: None,
        }
    }
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Run an action against the backend
    Run { action: Action, options: CliOptions },
}

fn parse_count(option: &str, value: &str) -> Result<usize, ArgsError> {
    value.trim().parse().map_err(|_| ArgsError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        reason: "expected a whole number".to_string(),
    })
}

fn parse_endpoint(option: &str, value: &str) -> Result<Endpoint, ArgsError> {
    let invalid = |reason: String| ArgsError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        reason,
    };
    let endpoint: Endpoint = value.parse().map_err(invalid)?;
    if !Endpoint::GENERATION.contains(&endpoint) {
        return Err(invalid("not a generation endpoint".to_string()));
    }
    Ok(endpoint)
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Arguments
///
/// * `args` - Iterator of command-line arguments (typically `std::env::args()`)
///
/// # Examples
///
/// ```
/// use captioneer::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["captioneer".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let mut args = args.skip(1).peekable();
    let mut action = None;
    let mut options = CliOptions::default();
    let mut words: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        let mut value = |option: &str| {
            args.next()
                .ok_or_else(|| ArgsError::MissingValue(option.to_string()))
        };

        match arg.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--url" => options.base_url = Some(parse_base_url(&value(&arg)?)?),
            "--prompt" | "-p" => options.prompt = Some(value(&arg)?),
            "--image" | "-i" => options.images.push(PathBuf::from(value(&arg)?)),
            "--out" | "-o" => options.out = Some(PathBuf::from(value(&arg)?)),
            "--requests" | "-n" => options.requests = parse_count(&arg, &value(&arg)?)?,
            "--concurrency" | "-c" => options.concurrency = parse_count(&arg, &value(&arg)?)?,
            "--endpoint" => options.endpoint = parse_endpoint(&arg, &value(&arg)?)?,
            "--max-new-tokens" => {
                options.max_new_tokens = Some(parse_max_new_tokens(&value(&arg)?)?)
            }
            "--strategy" => options.strategy = Some(value(&arg)?.parse::<BatchStrategy>()?),
            "--" => words.extend(args.by_ref()),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(ArgsError::UnknownOption(flag.to_string()))
            }
            word if action.is_none() => {
                action = Some(
                    Action::parse(word).ok_or_else(|| ArgsError::UnknownCommand(word.to_string()))?,
                );
            }
            word => words.push(word.to_string()),
        }
    }

    let Some(action) = action else {
        return Ok(CliCommand::Help);
    };
    if options.prompt.is_none() && !words.is_empty() {
        options.prompt = Some(words.join(" "));
    }
    Ok(CliCommand::Run { action, options })
}
