// src/main.rs

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod pdf;
pub mod publish;
pub mod report;
pub mod validate;

use std::io::Read;
use std::path::PathBuf;
use std::{env, fs};

use tracing::{error as log_error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::ReportError;
use crate::model::{RequestInput, Response};
use crate::publish::HttpArtifactStore;
use crate::report::Report;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::load()?;
    let args = Args::parse();
    let response = match read_input(args.request_path.as_deref()) {
        Ok(input) => handle(&cfg, input, args.out_dir).await,
        Err(err) => {
            log_error!(caller = err.caller(), "{}", err);
            Response::failure(&err, chrono::Utc::now().timestamp())
        }
    };

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

struct Args {
    request_path: Option<String>,
    /// With `--out DIR` the report is written locally instead of published.
    out_dir: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut request_path = None;
        let mut out_dir = None;
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            if arg == "--out" {
                out_dir = args.next().map(PathBuf::from);
            } else {
                request_path = Some(arg);
            }
        }
        Self { request_path, out_dir }
    }
}

/// Runs one report request end to end and wraps the outcome in the response
/// envelope. The internal error detail goes to the log, the client gets the
/// user-facing message.
async fn handle(cfg: &Config, input: RequestInput, out_dir: Option<PathBuf>) -> Response {
    let timestamp = chrono::Utc::now().timestamp();

    let result = run(cfg, input, out_dir).await;
    match result {
        Ok(url) => {
            info!(%url, "report created");
            Response::success(url, timestamp)
        }
        Err(err) => {
            log_error!(caller = err.caller(), "{}", err);
            Response::failure(&err, timestamp)
        }
    }
}

async fn run(
    cfg: &Config,
    input: RequestInput,
    out_dir: Option<PathBuf>,
) -> Result<String, ReportError> {
    let request = validate::set_request(&input)?;
    let report = Report::new(request, cfg).await?;
    match out_dir {
        Some(dir) => {
            let path = report.save_to_disk(&dir).await?;
            Ok(path.display().to_string())
        }
        None => {
            let store = HttpArtifactStore::new(cfg);
            report.create_signed_url(&store).await
        }
    }
}

/// Request JSON from a file path argument or stdin; the HTTP gateway in
/// front of this process owns framing and authentication.
fn read_input(request_path: Option<&str>) -> Result<RequestInput, ReportError> {
    let body = match request_path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            ReportError::validation(
                "main.read_input",
                format!("{}: {}", path, e),
                "Error reading request input",
            )
        })?,
        None => {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body).map_err(|e| {
                ReportError::validation("main.read_input", e.to_string(), "Error reading request input")
            })?;
            body
        }
    };

    serde_json::from_str(&body).map_err(|e| {
        ReportError::validation("main.read_input", e.to_string(), "Error parsing request input")
    })
}
