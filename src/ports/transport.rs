//! Transport Port
//!
//! This module defines the boundary to the underlying transport/session:
//! opening channels on an authenticated connection, dispatching exec or
//! shell requests, and receiving channel notifications. It abstracts away
//! the concrete SSH implementation so the execution machinery can be tested
//! against a scripted transport.

use async_trait::async_trait;

use crate::error::Result;

/// How the remote command is started on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// An exec request carrying the command itself.
    Exec,
    /// A shell request; the command is written to the shell's input once the
    /// request is acknowledged.
    ShellWrapped,
}

/// One execution request, immutable once issued.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub command: String,
    pub mode: ExecMode,
    pub want_reply: bool,
}

impl ExecutionRequest {
    #[must_use]
    pub fn exec(command: &str) -> Self {
        Self {
            command: command.to_string(),
            mode: ExecMode::Exec,
            want_reply: true,
        }
    }

    #[must_use]
    pub fn shell(command: &str) -> Self {
        Self {
            command: command.to_string(),
            mode: ExecMode::ShellWrapped,
            want_reply: true,
        }
    }
}

/// Notifications delivered by the transport for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A data frame on the primary stream.
    Data(Vec<u8>),
    /// A data frame on the extended (error) stream.
    ExtendedData(Vec<u8>),
    /// The channel accepted the exec/shell request.
    RequestSuccess,
    /// The channel rejected the exec/shell request.
    RequestFailure,
    /// A transport-level error on this channel.
    TransportError(String),
    /// Normal channel teardown.
    Closed,
    /// A non-data control frame arrived where output was expected.
    Unexpected(&'static str),
}

/// An authenticated connection capable of opening logical channels.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    type Channel: CommandChannel;

    /// Open a new logical channel for one command execution.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExecError::ChannelCreationFailed`] if the transport
    /// rejects or fails the channel open.
    async fn open_channel(&self) -> Result<Self::Channel>;
}

/// One logical channel over the transport connection.
///
/// A channel is private to a single execution; handles are never shared
/// across concurrent executions.
#[async_trait]
pub trait CommandChannel: Send + 'static {
    /// Dispatch the exec or shell request. Request success or failure is
    /// reported afterwards as a [`ChannelEvent`], not as the return value;
    /// an `Err` here means the transport could not send the request at all.
    async fn send_request(&mut self, request: &ExecutionRequest) -> Result<()>;

    /// Write bytes to the channel's input stream. Used only for shell-mode
    /// command injection.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Receive the next notification for this channel, in arrival order.
    /// `None` means the transport has no further events for this channel.
    async fn next_event(&mut self) -> Option<ChannelEvent>;

    /// Explicit teardown, idempotent.
    async fn close(&mut self) -> Result<()>;
}
