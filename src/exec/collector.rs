//! Buffered output collection.
//!
//! [`BufferedCollector`] is the sink behind the buffered API: it accumulates
//! stdout and stderr into growable buffers under an optional byte ceiling
//! and materializes one completed value or one failure per execution.

use serde::Serialize;
use tracing::warn;

use crate::config::ExecConfig;
use crate::error::{ExecError, Result};
use crate::exec::event::{OutputEvent, OutputSink};

/// Per-call options for the buffered API.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureOptions {
    /// Byte ceiling applied independently to each stream. `None` = unbounded.
    pub max_response_size: Option<usize>,
    /// Fold stderr bytes into the stdout buffer, in arrival order.
    pub merge_streams: bool,
}

impl From<&ExecConfig> for CaptureOptions {
    fn from(config: &ExecConfig) -> Self {
        Self {
            max_response_size: config.max_response_bytes,
            merge_streams: config.merge_streams,
        }
    }
}

/// The completed output of one buffered execution.
///
/// `stderr` is `None` when the streams were merged: every byte then lives in
/// `stdout`, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Option<Vec<u8>>,
}

impl CapturedOutput {
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        self.stderr
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }
}

/// Sink that materializes one execution's output as a single value.
pub struct BufferedCollector {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    limit: Option<usize>,
    merge: bool,
    /// Set once a size limit is exceeded; while set, further bytes are
    /// deliberately dropped rather than buffered.
    suppressed: bool,
    outcome: Option<Result<()>>,
}

impl BufferedCollector {
    #[must_use]
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            limit: options.max_response_size,
            merge: options.merge_streams,
            suppressed: false,
            outcome: None,
        }
    }

    fn append(&mut self, to_stderr: bool, bytes: &[u8]) -> bool {
        if self.suppressed {
            return false;
        }

        let buf = if to_stderr && !self.merge {
            &mut self.stderr
        } else {
            &mut self.stdout
        };

        if let Some(limit) = self.limit {
            if buf.len() + bytes.len() > limit {
                warn!(
                    limit_bytes = limit,
                    "Output limit exceeded, discarding remaining bytes"
                );
                self.suppressed = true;
                self.outcome = Some(Err(ExecError::OutputTooLarge { limit_bytes: limit }));
                return false;
            }
        }

        buf.extend_from_slice(bytes);
        true
    }

    /// Consume the collector once routing has finished.
    ///
    /// # Errors
    ///
    /// Returns the failure recorded by the terminal event or the overflow
    /// check; a missing terminal event is reported as a transport error.
    pub fn into_result(self) -> Result<CapturedOutput> {
        match self.outcome {
            Some(Ok(())) => Ok(CapturedOutput {
                stdout: self.stdout,
                stderr: if self.merge { None } else { Some(self.stderr) },
            }),
            Some(Err(err)) => Err(err),
            None => Err(ExecError::Transport {
                reason: "execution ended without a terminal event".to_string(),
            }),
        }
    }
}

impl OutputSink for BufferedCollector {
    fn deliver(&mut self, event: OutputEvent) -> bool {
        // Once resolved or failed, nothing can re-resolve or re-fail it.
        if self.outcome.is_some() {
            return false;
        }

        match event {
            OutputEvent::Stdout(bytes) => self.append(false, &bytes),
            OutputEvent::Stderr(bytes) => self.append(true, &bytes),
            OutputEvent::RequestAcknowledged => true,
            OutputEvent::End(None) => {
                self.outcome = Some(Ok(()));
                true
            }
            OutputEvent::End(Some(err)) => {
                self.outcome = Some(Err(err));
                true
            }
        }
    }
}
