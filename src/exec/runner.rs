//! Command execution lifecycle.
//!
//! [`CommandRunner`] drives one channel per execution from creation to
//! termination: open the channel under a timeout, dispatch the exec or
//! shell request, bind the router to the chosen sink, then pump transport
//! events until the terminal event lands. Four entry points share that one
//! pipeline: buffered capture, merged stream, shell-wrapped stream, and the
//! split stdout/stderr pair.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::ExecConfig;
use crate::error::{ExecError, Result};
use crate::exec::collector::{BufferedCollector, CaptureOptions, CapturedOutput};
use crate::exec::event::OutputSink;
use crate::exec::router::{ChannelOutputRouter, Routed};
use crate::exec::split::{split, ByteStream};
use crate::exec::stream::{OutputStream, StreamSink};
use crate::ports::{ChannelTransport, CommandChannel, ExecMode, ExecutionRequest};

/// Executes remote commands over channels opened on one transport.
///
/// Every execution gets its own channel, router, and sink; concurrent
/// executions on the same transport share no mutable state.
pub struct CommandRunner<T: ChannelTransport> {
    transport: T,
    config: ExecConfig,
}

impl<T: ChannelTransport> CommandRunner<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ExecConfig::default())
    }

    #[must_use]
    pub fn with_config(transport: T, config: ExecConfig) -> Self {
        Self { transport, config }
    }

    #[must_use]
    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Run a command and buffer its complete output.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened in time, the request
    /// is rejected, the output exceeds the configured ceiling, the command
    /// outlives the execution deadline, or the transport fails.
    pub async fn capture(
        &self,
        command: &str,
        options: CaptureOptions,
    ) -> Result<CapturedOutput> {
        let request = ExecutionRequest::exec(command);
        let mut channel = self.start(&request).await?;
        let mut router = ChannelOutputRouter::new(BufferedCollector::new(options));

        let seconds = self.config.command_timeout_seconds;
        let deadline = Duration::from_secs(seconds);
        if timeout(deadline, pump(&mut channel, &mut router, None))
            .await
            .is_err()
        {
            warn!(command = %command, seconds, "Command deadline exceeded, closing channel");
            let _ = channel.close().await;
            return Err(ExecError::CommandTimeout { seconds });
        }

        let result = router.into_sink().into_result();
        if let Ok(output) = &result {
            debug!(
                command = %command,
                stdout_bytes = output.stdout.len(),
                stderr_bytes = output.stderr.as_ref().map_or(0, Vec::len),
                "Command captured"
            );
        }
        result
    }

    /// Run a command and stream its output as a live sequence of tagged
    /// chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened in time or the
    /// request cannot be sent; later failures terminate the sequence.
    pub async fn stream(&self, command: &str) -> Result<OutputStream> {
        self.spawn_stream(ExecutionRequest::exec(command)).await
    }

    /// Start a remote shell and stream the output of a command typed into
    /// it. The command, followed by an exit directive, is written to the
    /// shell's input once the shell acknowledges readiness.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened in time or the
    /// request cannot be sent; later failures terminate the sequence.
    pub async fn shell_stream(&self, command: &str) -> Result<OutputStream> {
        self.spawn_stream(ExecutionRequest::shell(command)).await
    }

    /// Run a command and consume stdout and stderr as two independent live
    /// sequences.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be opened in time or the
    /// request cannot be sent; later failures terminate both sequences.
    pub async fn split_stream(
        &self,
        command: &str,
        mode: ExecMode,
    ) -> Result<(ByteStream, ByteStream)> {
        let merged = match mode {
            ExecMode::Exec => self.stream(command).await?,
            ExecMode::ShellWrapped => self.shell_stream(command).await?,
        };
        Ok(split(merged))
    }

    /// Open a channel and dispatch the request on it. The caller binds a
    /// sink to the router before any event is pumped, so no data frame can
    /// arrive without a sink to receive it.
    async fn start(&self, request: &ExecutionRequest) -> Result<T::Channel> {
        let seconds = self.config.channel_open_timeout_seconds;
        let mut channel = match timeout(
            Duration::from_secs(seconds),
            self.transport.open_channel(),
        )
        .await
        {
            Ok(Ok(channel)) => channel,
            Ok(Err(err)) => {
                warn!(error = %err, "Channel open failed");
                return Err(err);
            }
            Err(_) => {
                warn!(seconds, "Channel open timed out");
                return Err(ExecError::ChannelCreationTimeout { seconds });
            }
        };

        debug!(command = %request.command, mode = ?request.mode, "Dispatching execution request");
        if let Err(err) = channel.send_request(request).await {
            warn!(error = %err, "Failed to send execution request, closing channel");
            let _ = channel.close().await;
            return Err(err);
        }

        Ok(channel)
    }

    async fn spawn_stream(&self, request: ExecutionRequest) -> Result<OutputStream> {
        let mut channel = self.start(&request).await?;
        let (sink, stream) = StreamSink::channel();
        let mut router = ChannelOutputRouter::new(sink);

        let shell_command =
            (request.mode == ExecMode::ShellWrapped).then(|| request.command.clone());

        tokio::spawn(async move {
            pump(&mut channel, &mut router, shell_command.as_deref()).await;
        });

        Ok(stream)
    }
}

/// Pump transport events through the router until the channel terminates or
/// the sink stops accepting.
///
/// In shell mode, the first request acknowledgment triggers writing
/// `{command};exit\n` to the channel input, exactly once; redelivered
/// acknowledgments do not re-write the command. The channel is closed on a
/// failed termination and when the sink's consumer is gone.
async fn pump<C: CommandChannel, S: OutputSink>(
    channel: &mut C,
    router: &mut ChannelOutputRouter<S>,
    shell_command: Option<&str>,
) {
    let mut injected = false;

    loop {
        let Some(event) = channel.next_event().await else {
            // Event source drained without a close notification.
            router.finish(None);
            break;
        };

        match router.route(event) {
            Routed::Acknowledged => {
                if let Some(command) = shell_command {
                    if !injected {
                        injected = true;
                        debug!("Shell ready, injecting command");
                        let line = format!("{command};exit\n");
                        if let Err(err) = channel.write(line.as_bytes()).await {
                            warn!(error = %err, "Failed to write command to shell");
                            router.finish(Some(err));
                            break;
                        }
                    }
                }
            }
            Routed::Ended | Routed::SinkClosed => break,
            Routed::Delivered | Routed::Ignored => {}
        }
    }

    if router.ended_with_error() || router.sink_closed() {
        let _ = channel.close().await;
    }
}
