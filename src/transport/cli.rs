//! CLI transport
//!
//! Runs `abstract-cli` with an argument vector and reads one JSON payload
//! from standard output. Failures arrive on standard error as a single
//! `{code, message}` object.

use super::credential::ResolvedCredential;
use crate::error::{ErrorKind, TransportError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

pub const DEFAULT_CLI_PATH: &str = "abstract-cli";

/// CLI transport bound to one resolved credential
#[derive(Debug, Clone)]
pub struct CliTransport {
    cli_path: PathBuf,
    api_url: String,
    credential: Option<ResolvedCredential>,
}

impl CliTransport {
    pub fn new(cli_path: impl Into<PathBuf>, api_url: &str, credential: Option<ResolvedCredential>) -> Self {
        Self {
            cli_path: cli_path.into(),
            api_url: api_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    pub fn cli_path(&self) -> &Path {
        &self.cli_path
    }

    /// Full argument vector: auth flags, service address, then the operation
    pub fn argv(&self, args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 4);

        if let Some(token) = self.credential.as_ref().and_then(ResolvedCredential::token) {
            argv.push("--user-token".to_string());
            argv.push(token.to_string());
        }

        argv.push("--api-url".to_string());
        argv.push(self.api_url.clone());
        argv.extend(args.iter().cloned());
        argv
    }

    /// Run the CLI and decode its output
    ///
    /// Empty standard output on success decodes to `Value::Null`.
    pub async fn run(&self, args: &[String]) -> Result<Value, TransportError> {
        let argv = self.argv(args);
        tracing::debug!("Executing: {} {}", self.cli_path.display(), redact(&argv).join(" "));

        let output = Command::new(&self.cli_path)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TransportError::unavailable(format!(
                    "failed to execute {}: {}",
                    self.cli_path.display(),
                    e
                ))
            })?;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if stdout.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&stdout).map_err(TransportError::decode);
        }

        let exit_code = output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!("CLI exited with {}", exit_code);

        Err(cli_error(&stderr, &exit_code))
    }
}

/// Map the CLI's standard error onto the taxonomy
fn cli_error(stderr: &str, exit_code: &str) -> TransportError {
    let parsed: Option<Value> = serde_json::from_str(stderr.trim()).ok();

    let code = parsed
        .as_ref()
        .and_then(|v| v.get("code"))
        .and_then(|c| c.as_str())
        .map(str::to_string);

    match (parsed, code) {
        (Some(body), Some(code)) if ErrorKind::from_cli_code(&code) != ErrorKind::Other => {
            let kind = ErrorKind::from_cli_code(&code);
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| code.clone());
            TransportError::new(kind, message).with_code(code).with_body(body)
        },
        (_, code) => {
            let text = stderr.trim();
            let message = if text.is_empty() {
                format!("CLI exited with status {}", exit_code)
            } else {
                text.to_string()
            };
            TransportError::new(ErrorKind::Other, message)
                .with_code(code.unwrap_or_else(|| exit_code.to_string()))
        },
    }
}

/// Hide the value following `--user-token` in logged argument vectors
fn redact(argv: &[String]) -> Vec<String> {
    let mut hide_next = false;
    argv.iter()
        .map(|arg| {
            if hide_next {
                hide_next = false;
                return "<redacted>".to_string();
            }
            hide_next = arg == "--user-token";
            arg.clone()
        })
        .collect()
}
