//! Classified output events and the sink contract.
//!
//! Every component of the execution pipeline speaks this vocabulary: the
//! router produces [`OutputEvent`]s, and exactly one [`OutputSink`] per
//! channel consumes them.

use crate::error::ExecError;

/// One classified event on a channel's output.
///
/// For a given channel, at most one `End` is ever produced, and it is always
/// the last event delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Bytes from the primary stream.
    Stdout(Vec<u8>),
    /// Bytes from the extended (error) stream.
    Stderr(Vec<u8>),
    /// The channel accepted the exec/shell request.
    RequestAcknowledged,
    /// Terminal event: `None` for normal completion, `Some` for failure.
    End(Option<ExecError>),
}

/// Consumer of one execution's [`OutputEvent`]s.
///
/// `deliver` returns `false` once the sink will accept nothing further: the
/// buffered result has already been resolved or failed, or the stream
/// consumer is gone. The caller must stop delivering and tear the channel
/// down.
pub trait OutputSink: Send {
    fn deliver(&mut self, event: OutputEvent) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_equality() {
        assert_eq!(
            OutputEvent::Stdout(b"x".to_vec()),
            OutputEvent::Stdout(b"x".to_vec())
        );
        assert_ne!(
            OutputEvent::Stdout(b"x".to_vec()),
            OutputEvent::Stderr(b"x".to_vec())
        );
        assert_eq!(OutputEvent::End(None), OutputEvent::End(None));
        assert_ne!(
            OutputEvent::End(None),
            OutputEvent::End(Some(ExecError::ChannelRequestFailed))
        );
    }

    #[test]
    fn test_end_carries_error() {
        let event = OutputEvent::End(Some(ExecError::OutputTooLarge { limit_bytes: 10 }));
        match event {
            OutputEvent::End(Some(ExecError::OutputTooLarge { limit_bytes })) => {
                assert_eq!(limit_bytes, 10);
            }
            other => panic!("Expected End with OutputTooLarge, got: {other:?}"),
        }
    }
}
