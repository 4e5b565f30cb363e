//! Command bridge to the automation host.
//!
//! Every call is one full `osascript` round-trip; there is no batching and
//! no timeout at this layer. The host serializes its own script executions,
//! so concurrent calls are safe but their relative order of effect is not
//! guaranteed; callers that depend on ordering must sequence their awaits.

use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{instrument, trace};

use crate::host::error::HostError;
use crate::host::payload::{self, ERROR_SENTINEL};

/// Executes one Lua chunk on the automation host and returns its textual
/// reply. The seam between remote operations and the actual process spawn;
/// tests substitute a scripted implementation.
pub trait HostBridge {
    fn execute(&self, script: &str) -> impl Future<Output = Result<String, HostError>> + Send;
}

/// Bridge that reaches the host through `osascript -e`.
#[derive(Clone, Debug)]
pub struct OsascriptBridge {
    host_app: String,
}

impl OsascriptBridge {
    pub fn new(host_app: impl Into<String>) -> Self {
        Self { host_app: host_app.into() }
    }
}

impl HostBridge for OsascriptBridge {
    #[instrument(skip_all, fields(bytes = script.len()))]
    async fn execute(&self, script: &str) -> Result<String, HostError> {
        let source = payload::applescript_for(&self.host_app, script);
        trace!("dispatching lua chunk to {}", self.host_app);

        let output = Command::new("osascript")
            .arg("-e")
            .arg(&source)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(HostError::Spawn)?;

        if !output.status.success() {
            return Err(HostError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| HostError::InvalidUtf8)?;
        let reply = stdout.trim_end().to_string();
        match host_reported_error(&reply) {
            Some(message) => Err(HostError::Host(message)),
            None => Ok(reply),
        }
    }
}

/// Classify a reply per the sentinel convention: an error if and only if
/// the reply begins with [`ERROR_SENTINEL`]. Returns the host's message
/// with the sentinel stripped.
pub fn host_reported_error(reply: &str) -> Option<String> {
    reply.strip_prefix(ERROR_SENTINEL).map(|rest| rest.trim_start().to_string())
}
