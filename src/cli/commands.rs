use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use crate::client::{FailureKind, HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::ids::RequestId;
use crate::middleware::TracingMiddleware;
use crate::mock::{load_fixtures, MockDriver};
use crate::pattern::{match_path, parse, tokens_to_regex, RegexOptions, RoutePattern};

/// Command-line interface for pathmock
#[derive(Parser)]
#[command(name = "pathmock")]
#[command(about = "Path template compiler and mock HTTP dispatcher", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile a path template and print its expression and keys as JSON
    Compile {
        template: String,

        /// Do not tolerate a trailing delimiter
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Case-sensitive matching
        #[arg(long, default_value_t = false)]
        sensitive: bool,

        /// Allow the template to match a prefix of the path
        #[arg(long, default_value_t = false)]
        no_end: bool,

        /// Extra terminators accepted in place of end-of-input (repeatable)
        #[arg(long)]
        ends_with: Vec<String>,
    },
    /// Match a path against a template and print the result as JSON
    Match {
        template: String,
        path: String,

        /// Require the whole path to be consumed
        #[arg(long, default_value_t = false)]
        exact: bool,

        #[arg(long, default_value_t = false)]
        strict: bool,

        #[arg(long, default_value_t = false)]
        sensitive: bool,
    },
    /// Send one request through a mock driver built from a fixture file
    Dispatch {
        /// YAML or JSON list of canned routes
        #[arg(short, long)]
        fixtures: PathBuf,

        /// Client configuration (YAML, JSON or TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Request body as JSON
        #[arg(long)]
        payload: Option<String>,

        /// Skip simulated latency
        #[arg(long, default_value_t = false)]
        no_latency: bool,

        method: HttpMethod,
        url: String,
    },
}

/// Compile `template` and render the result as pretty JSON.
pub fn compile_command(template: &str, options: &RegexOptions) -> Result<String> {
    let compiled = tokens_to_regex(&parse(template, &options.parse_options()), options)?;
    Ok(serde_json::to_string_pretty(&compiled.summary())?)
}

/// Match and render the result, `None` when the path does not match.
pub fn match_command(path: &str, pattern: &RoutePattern) -> Result<Option<String>> {
    match match_path(path, pattern)? {
        Some(found) => Ok(Some(serde_json::to_string_pretty(&found)?)),
        None => Ok(None),
    }
}

#[derive(Debug, Serialize)]
struct DispatchOutcome<'a> {
    request_id: RequestId,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<FailureKind>,
    response: &'a HttpResponse,
}

/// Options for [`dispatch_command`].
#[derive(Debug, Clone)]
pub struct DispatchArgs<'a> {
    pub fixtures: &'a Path,
    pub config: Option<&'a Path>,
    pub method: HttpMethod,
    pub url: &'a str,
    pub payload: Option<Value>,
    pub no_latency: bool,
}

/// Run one request against fixtures. Returns the rendered outcome and whether
/// it succeeded.
pub async fn dispatch_command(args: DispatchArgs<'_>) -> Result<(String, bool)> {
    let config = match args.config {
        Some(path) => {
            let mut config = HttpConfig::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok())?;
            config
        }
        None => HttpConfig::from_env()?,
    };

    let driver = MockDriver::new(&config);
    let fixtures = load_fixtures(args.fixtures)?;
    driver
        .register_fixtures(&fixtures)
        .with_context(|| format!("Invalid route in {}", args.fixtures.display()))?;
    if args.no_latency {
        driver.latency().disable();
    }

    let client = HttpClient::new(config);
    client.use_middleware(Arc::new(TracingMiddleware));
    client.set_driver(Arc::new(driver));

    let mut request = HttpRequest::new(args.url).method(args.method);
    if let Some(payload) = args.payload {
        request = request.payload(payload);
    }

    let request_id = request.request_id;
    let (ok, kind, response) = match client.request(request).await {
        Ok(response) => (true, None, response),
        Err(HttpError::Failure(failure)) => (false, Some(failure.kind), failure.response),
        Err(e) => return Err(e.into()),
    };
    let rendered = serde_json::to_string_pretty(&DispatchOutcome {
        request_id,
        ok,
        kind,
        response: &response,
    })?;
    Ok((rendered, ok))
}

/// Execute a parsed command line.
pub fn run_cli(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Compile {
            template,
            strict,
            sensitive,
            no_end,
            ends_with,
        } => {
            let options = RegexOptions {
                strict,
                sensitive,
                end: !no_end,
                ends_with,
                ..RegexOptions::default()
            };
            println!("{}", compile_command(&template, &options)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Match {
            template,
            path,
            exact,
            strict,
            sensitive,
        } => {
            let pattern = RoutePattern::new(template)
                .exact(exact)
                .strict(strict)
                .sensitive(sensitive);
            match match_command(&path, &pattern)? {
                Some(rendered) => {
                    println!("{rendered}");
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("no match");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Dispatch {
            fixtures,
            config,
            payload,
            no_latency,
            method,
            url,
        } => {
            let payload = payload
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()
                .context("--payload is not valid JSON")?;
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("Failed to start runtime")?;
            let (rendered, ok) = runtime.block_on(dispatch_command(DispatchArgs {
                fixtures: &fixtures,
                config: config.as_deref(),
                method,
                url: &url,
                payload,
                no_latency,
            }))?;
            println!("{rendered}");
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
