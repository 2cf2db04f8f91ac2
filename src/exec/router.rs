//! Channel output routing.
//!
//! [`ChannelOutputRouter`] attaches to one open channel and classifies the
//! transport's notifications into [`OutputEvent`]s, forwarding each to the
//! single sink bound to that channel. It holds no buffers; its only state is
//! the terminal latch that guarantees exactly one `End` per channel lifetime.

use tracing::debug;

use crate::error::ExecError;
use crate::exec::event::{OutputEvent, OutputSink};
use crate::ports::ChannelEvent;

/// Compact summary of what a routed event caused, so the lifecycle driver
/// can react (shell injection, loop exit) without reaching into the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// A chunk was forwarded; keep pumping.
    Delivered,
    /// The request acknowledgment was forwarded.
    Acknowledged,
    /// The terminal event was emitted; nothing further will be forwarded.
    Ended,
    /// The sink will accept nothing further; stop pumping and tear down.
    SinkClosed,
    /// Event arrived after the terminal event and was dropped.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouterState {
    Forwarding,
    Ended { failed: bool },
    SinkClosed,
}

/// Classifies transport notifications for one channel and forwards them to
/// its sink.
pub struct ChannelOutputRouter<S> {
    sink: S,
    state: RouterState,
}

impl<S: OutputSink> ChannelOutputRouter<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: RouterState::Forwarding,
        }
    }

    /// Classify one transport notification and forward the result.
    ///
    /// Duplicate teardown notifications from the transport are absorbed
    /// here: once the terminal event has been emitted, every later event is
    /// a no-op.
    pub fn route(&mut self, event: ChannelEvent) -> Routed {
        if self.state != RouterState::Forwarding {
            return Routed::Ignored;
        }

        match event {
            ChannelEvent::Data(bytes) => self.forward(OutputEvent::Stdout(bytes)),
            ChannelEvent::ExtendedData(bytes) => self.forward(OutputEvent::Stderr(bytes)),
            ChannelEvent::RequestSuccess => {
                if self.sink.deliver(OutputEvent::RequestAcknowledged) {
                    Routed::Acknowledged
                } else {
                    self.state = RouterState::SinkClosed;
                    Routed::SinkClosed
                }
            }
            ChannelEvent::RequestFailure => self.end(Some(ExecError::ChannelRequestFailed)),
            ChannelEvent::TransportError(reason) => self.end(Some(ExecError::Transport { reason })),
            ChannelEvent::Closed => self.end(None),
            ChannelEvent::Unexpected(frame) => self.end(Some(ExecError::InvalidChannelData {
                frame: frame.to_string(),
            })),
        }
    }

    /// Emit the terminal event directly, for when the transport's event
    /// source drains without a close notification or the driver hits a
    /// write failure. No-op if the channel already ended.
    pub fn finish(&mut self, error: Option<ExecError>) -> Routed {
        if self.state != RouterState::Forwarding {
            return Routed::Ignored;
        }
        self.end(error)
    }

    fn forward(&mut self, event: OutputEvent) -> Routed {
        if self.sink.deliver(event) {
            Routed::Delivered
        } else {
            self.state = RouterState::SinkClosed;
            Routed::SinkClosed
        }
    }

    fn end(&mut self, error: Option<ExecError>) -> Routed {
        let failed = error.is_some();
        if let Some(err) = &error {
            debug!(error = %err, "Channel terminated with failure");
        }
        self.sink.deliver(OutputEvent::End(error));
        self.state = RouterState::Ended { failed };
        Routed::Ended
    }

    /// Whether the terminal event has been emitted, successfully or not.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        matches!(self.state, RouterState::Ended { .. })
    }

    /// Whether the channel terminated with a failure.
    #[must_use]
    pub fn ended_with_error(&self) -> bool {
        matches!(self.state, RouterState::Ended { failed: true })
    }

    /// Whether the sink stopped accepting events before the channel ended.
    #[must_use]
    pub fn sink_closed(&self) -> bool {
        self.state == RouterState::SinkClosed
    }

    /// Recover the sink once routing is finished.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
