//! Catalog of remote operations.
//!
//! Each operation builds a Lua payload, runs it through the command bridge
//! as one round-trip, and parses the reply. Multi-value results come back
//! as `hs.json.encode`d arrays of records; the field names in those records
//! are a hard contract with [`crate::model`].

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::common::config::Config;
use crate::host::{HostBridge, HostError};

pub mod spaces;
pub mod windows;

/// Remote operations over one bridge, parameterized by the few policy
/// knobs the payloads need.
pub struct Remote<B> {
    bridge: B,
    launcher_app: String,
    inline_snapshots: bool,
    settle_delay: Duration,
}

impl<B: HostBridge> Remote<B> {
    pub fn new(bridge: B, config: &Config) -> Self {
        Self {
            bridge,
            launcher_app: config.launcher_app.clone(),
            inline_snapshots: config.inline_snapshots,
            settle_delay: config.settle_delay(),
        }
    }

    /// Run a Lua chunk verbatim and return the raw reply. Backs the `exec`
    /// debug command; no parsing, no policy.
    pub async fn execute_raw(&self, script: &str) -> Result<String, HostError> {
        self.bridge.execute(script).await
    }
}

/// Parse a list-of-records reply. `hs.json.encode` serializes an empty Lua
/// table as `{}` rather than `[]`, so that shape is an empty list here.
fn parse_records<T: DeserializeOwned>(reply: &str) -> Result<Vec<T>, HostError> {
    let reply = reply.trim();
    if reply.is_empty() || reply == "{}" {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(reply)?)
}

/// Quote a string as a Lua literal for interpolation into a payload.
fn lua_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use crate::host::{HostBridge, HostError};

    /// Bridge fake that records every payload and pops queued replies.
    /// Yields once before answering so interleaving tests exercise the
    /// in-flight window.
    #[derive(Clone, Default)]
    pub struct ScriptedBridge {
        calls: Arc<Mutex<Vec<String>>>,
        replies: Arc<Mutex<VecDeque<Result<String, HostError>>>>,
    }

    impl ScriptedBridge {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_ok(&self, reply: impl Into<String>) {
            self.replies.lock().unwrap().push_back(Ok(reply.into()));
        }

        pub fn push_host_error(&self, message: impl Into<String>) {
            self.replies.lock().unwrap().push_back(Err(HostError::Host(message.into())));
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl HostBridge for ScriptedBridge {
        async fn execute(&self, script: &str) -> Result<String, HostError> {
            tokio::task::yield_now().await;
            self.calls.lock().unwrap().push(script.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("no scripted reply left for payload: {script}"))
        }
    }
}
