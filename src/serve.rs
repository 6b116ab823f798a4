//! JSON-lines request loop used by `debug_modules serve`.
//!
//! Each input line is one request; each request yields exactly one output
//! line holding an [`Envelope`].
//!
//! ```text
//! {"module": "a", "action": "ping", "payload": {}}
//! {"command": "refresh"}
//! {"command": "list"}
//! ```
//!
//! Dispatches and refreshes run on tokio's blocking pool since handlers may
//! block on I/O. A refresh swaps the registry snapshot while other requests
//! keep using the one they started with.

use crate::modules::{Dispatcher, Envelope};
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Request {
    /// Registry maintenance
    Command {
        /// What to do
        command: Command,
    },
    /// Run an action
    Dispatch {
        /// Module id
        module: String,
        /// Action name
        action: String,
        /// Handler payload, `{}` when omitted
        #[serde(default = "empty_payload")]
        payload: Value,
    },
}

/// Registry maintenance commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Rescan the modules root
    Refresh,
    /// Summaries of loaded modules
    List,
    /// Diagnostics of the last scan
    Skipped,
}

fn empty_payload() -> Value {
    Value::Object(serde_json::Map::new())
}

fn plain_failure(error: &str, message: String) -> Envelope {
    Envelope {
        success: false,
        data: None,
        error: Some(error.to_string()),
        message: Some(message),
        reason: None,
    }
}

fn to_envelope<T: serde::Serialize>(value: &T) -> Envelope {
    match serde_json::to_value(value) {
        Ok(data) => Envelope::ok(data),
        Err(e) => plain_failure("serialization_error", e.to_string()),
    }
}

/// Handle one request synchronously.
pub fn handle_request(dispatcher: &Dispatcher, request: Request) -> Envelope {
    match request {
        Request::Dispatch {
            module,
            action,
            payload,
        } => dispatcher.dispatch(&module, &action, &payload),
        Request::Command {
            command: Command::Refresh,
        } => match dispatcher.registry().refresh() {
            Ok(report) => to_envelope(&report),
            Err(e) => plain_failure("refresh_failed", e.to_string()),
        },
        Request::Command {
            command: Command::List,
        } => to_envelope(&dispatcher.registry().list()),
        Request::Command {
            command: Command::Skipped,
        } => to_envelope(&dispatcher.registry().skipped()),
    }
}

/// Parse and handle one input line.
pub fn handle_line(dispatcher: &Dispatcher, line: &str) -> Envelope {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle_request(dispatcher, request),
        Err(e) => plain_failure("invalid_request", e.to_string()),
    }
}

/// Serve requests from `reader` until EOF, writing one response per line.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub async fn serve<R, W>(dispatcher: Dispatcher, reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Serving debug module requests");
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        debug!("Request: {}", line);

        let worker = dispatcher.clone();
        let envelope = tokio::task::spawn_blocking(move || handle_line(&worker, &line))
            .await
            .unwrap_or_else(|e| plain_failure("internal_error", format!("Task join error: {}", e)));

        let mut out = serde_json::to_vec(&envelope)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;
    }

    info!("Input closed, stopping");
    Ok(())
}
