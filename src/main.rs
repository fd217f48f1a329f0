//! waiton
//!
//! Waits for a set of endpoints to become available before letting a
//! deployment step continue.
//!
//! # Architecture Overview
//!
//! ```text
//!   flags / env / TOML
//!          │
//!          ▼
//!   ┌─────────────┐      ┌──────────────────────────────────────────┐
//!   │   config    │─────▶│               coordinator                │
//!   │  (validate) │      │  ┌──────────┐ ┌──────────┐ ┌──────────┐  │
//!   └─────────────┘      │  │ engine 1 │ │ engine 2 │ │ engine N │  │
//!          │             │  │ retries  │ │ retries  │ │ retries  │  │
//!    exit 2 on error     │  │  + probe │ │  + probe │ │  + probe │  │
//!                        │  └────┬─────┘ └────┬─────┘ └────┬─────┘  │
//!                        │       └──── join all ──────────┘         │
//!                        └───────────────────┬──────────────────────┘
//!                                            ▼
//!                                 verdict → exit 0 / 1
//! ```

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser};

use waiton::config::{self, BackoffStrategy, ConfigOverrides, OutputFormat, PREFIX_VAR};
use waiton::observability::logging::init_logging;
use waiton::observability::{JsonReporter, Reporter, TracingReporter};
use waiton::probe::target::split_list;
use waiton::{Coordinator, GlobalDeadline};

const EXIT_NOT_READY: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "waiton", version)]
#[command(about = "Wait for HTTP(S) and TCP endpoints to become available", long_about = None)]
struct Cli {
    /// Comma separated urls to test, supported schemes are http:// https:// & tcp://
    #[arg(long)]
    urls: Option<String>,

    /// Additional urls to test
    #[arg(value_name = "URL")]
    targets: Vec<String>,

    /// Timeout to wait for all the hosts to be available before failure [default: 1m]
    #[arg(
        long = "global-timeout",
        alias = "globalTimeout",
        value_parser = humantime::parse_duration
    )]
    global_timeout: Option<Duration>,

    /// Timeout to wait for one host to be available before retry [default: 10s]
    #[arg(long = "url-timeout", alias = "urlTimeout", value_parser = humantime::parse_duration)]
    url_timeout: Option<Duration>,

    /// Max number of attempts per host before giving up [default: 100]
    #[arg(long = "max-retries", alias = "maxRetries")]
    max_retries: Option<u32>,

    /// Delay between attempts, or base delay for exponential backoff [default: 1s]
    #[arg(long = "retry-delay", alias = "retryDelay", value_parser = humantime::parse_duration)]
    retry_delay: Option<Duration>,

    /// Backoff strategy: fixed or exponential [default: fixed]
    #[arg(long)]
    backoff: Option<BackoffStrategy>,

    /// Upper bound for exponential backoff [default: 30s]
    #[arg(long = "max-delay", alias = "maxDelay", value_parser = humantime::parse_duration)]
    max_delay: Option<Duration>,

    /// Report format: text or json [default: text]
    #[arg(long)]
    output: Option<OutputFormat>,

    /// Log level (trace, debug, info, warn, error) [default: info]
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let mut targets = self.urls.as_deref().map(split_list).unwrap_or_default();
        targets.extend(self.targets.iter().flat_map(|t| split_list(t)));

        ConfigOverrides {
            targets: (!targets.is_empty()).then_some(targets),
            global_timeout: self.global_timeout,
            attempt_timeout: self.url_timeout,
            max_attempts: self.max_retries,
            retry_delay: self.retry_delay,
            backoff: self.backoff,
            max_delay: self.max_delay,
            log_level: self.log_level.clone(),
            output: self.output,
        }
    }
}

/// Rewrite Go-style `-name` / `-name=value` long flags to `--name`.
///
/// Only names clap knows as long flags or aliases are rewritten, so short
/// flags such as `-c` are left alone. Nothing after `--` is touched.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let command = Cli::command();
    let mut longs: Vec<String> = vec!["help".into(), "version".into()];
    for arg in command.get_arguments() {
        longs.extend(arg.get_long().map(String::from));
        longs.extend(arg.get_all_aliases().unwrap_or_default().into_iter().map(String::from));
    }

    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if longs.iter().any(|l| l == name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    let prefix = std::env::var(PREFIX_VAR).ok().filter(|p| !p.is_empty());

    let resolved = config::resolve(
        cli.config.as_deref(),
        prefix.as_deref(),
        |key| std::env::var(key).ok(),
        cli.overrides(),
    );

    let config = match resolved {
        Ok(config) => {
            init_logging(&config.observability.log_level);
            config
        }
        Err(e) => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            tracing::error!("Configuration error: {}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let plan = match config.plan() {
        Ok(plan) => plan,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    tracing::debug!(
        targets = plan.len(),
        global_timeout_ms = config.global_timeout_ms,
        attempt_timeout_ms = config.attempt_timeout_ms,
        max_attempts = config.max_attempts,
        "Configuration loaded"
    );

    let reporter: Arc<dyn Reporter> = match config.observability.output {
        OutputFormat::Text => Arc::new(TracingReporter),
        OutputFormat::Json => Arc::new(JsonReporter::stdout()),
    };

    let deadline = GlobalDeadline::after(config.global_timeout());
    let verdict = Coordinator::new(reporter).run(plan, deadline).await;

    if verdict.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_NOT_READY)
    }
}
