//! Execution limits and defaults.
//!
//! Callers embed an [`ExecConfig`] per connection; every field has a serde
//! default so partial configuration files deserialize cleanly.

use serde::{Deserialize, Serialize};

/// Limits applied to command executions on one connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecConfig {
    /// How long to wait for the transport to open a channel before failing.
    #[serde(default = "default_channel_open_timeout")]
    pub channel_open_timeout_seconds: u64,

    /// Overall deadline for a buffered execution. Streaming executions are
    /// consumer-paced and carry no deadline.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,

    /// Byte ceiling applied independently to each buffered stream.
    /// `None` means unbounded.
    #[serde(default)]
    pub max_response_bytes: Option<usize>,

    /// Fold stderr bytes into the stdout accumulator, in arrival order.
    #[serde(default)]
    pub merge_streams: bool,
}

const fn default_channel_open_timeout() -> u64 {
    15
}

const fn default_command_timeout() -> u64 {
    1800 // 30 minutes - supports long-running remote tasks
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            channel_open_timeout_seconds: default_channel_open_timeout(),
            command_timeout_seconds: default_command_timeout(),
            max_response_bytes: None,
            merge_streams: false,
        }
    }
}
