//! SSH Transport Adapter
//!
//! Concrete implementation of the transport port using the russh client.
//! Connection setup, key exchange, and authentication are the caller's
//! concern: the handle passed in must already be authenticated.

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::ChannelMsg;
use tracing::debug;

use crate::error::{ExecError, Result};
use crate::ports::{ChannelEvent, ChannelTransport, CommandChannel, ExecMode, ExecutionRequest};

/// Channel transport over an authenticated russh connection.
pub struct SshTransport<H: client::Handler> {
    handle: Handle<H>,
}

impl<H: client::Handler> SshTransport<H> {
    #[must_use]
    pub fn new(handle: Handle<H>) -> Self {
        Self { handle }
    }

    /// Access the underlying connection handle.
    #[must_use]
    pub fn handle(&self) -> &Handle<H> {
        &self.handle
    }
}

#[async_trait]
impl<H> ChannelTransport for SshTransport<H>
where
    H: client::Handler + Send + Sync + 'static,
{
    type Channel = SshCommandChannel;

    async fn open_channel(&self) -> Result<SshCommandChannel> {
        let channel = self.handle.channel_open_session().await.map_err(|e| {
            ExecError::ChannelCreationFailed {
                reason: e.to_string(),
            }
        })?;
        debug!(channel = ?channel.id(), "Session channel opened");
        Ok(SshCommandChannel { channel })
    }
}

/// One session channel used for a single command execution.
pub struct SshCommandChannel {
    channel: russh::Channel<Msg>,
}

/// Map one russh channel message onto the port vocabulary.
///
/// Returns `None` for status and flow-control frames that carry no command
/// output. Eof and ExitStatus may arrive in either order; only Close (or
/// the message source draining) finishes the channel.
fn classify(msg: ChannelMsg) -> Option<ChannelEvent> {
    match msg {
        ChannelMsg::Data { data } => Some(ChannelEvent::Data(data.to_vec())),
        ChannelMsg::ExtendedData { data, ext } if ext == 1 => {
            Some(ChannelEvent::ExtendedData(data.to_vec()))
        }
        // Extended streams other than stderr are not command output
        ChannelMsg::ExtendedData { .. } => None,
        ChannelMsg::Success => Some(ChannelEvent::RequestSuccess),
        ChannelMsg::Failure => Some(ChannelEvent::RequestFailure),
        ChannelMsg::Close => Some(ChannelEvent::Closed),
        ChannelMsg::Eof
        | ChannelMsg::ExitStatus { .. }
        | ChannelMsg::ExitSignal { .. }
        | ChannelMsg::WindowAdjusted { .. }
        | ChannelMsg::XonXoff { .. } => None,
        _ => Some(ChannelEvent::Unexpected("non-data control frame")),
    }
}

#[async_trait]
impl CommandChannel for SshCommandChannel {
    async fn send_request(&mut self, request: &ExecutionRequest) -> Result<()> {
        let sent = match request.mode {
            ExecMode::Exec => {
                self.channel
                    .exec(request.want_reply, request.command.as_str())
                    .await
            }
            ExecMode::ShellWrapped => self.channel.request_shell(request.want_reply).await,
        };
        sent.map_err(|e| ExecError::Transport {
            reason: e.to_string(),
        })
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.channel
            .data(data)
            .await
            .map_err(|e| ExecError::Transport {
                reason: e.to_string(),
            })
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            let msg = self.channel.wait().await?;
            if let Some(event) = classify(msg) {
                return Some(event);
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.channel
            .close()
            .await
            .map_err(|e| ExecError::Transport {
                reason: e.to_string(),
            })
    }
}
