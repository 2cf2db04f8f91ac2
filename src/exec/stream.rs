//! Live output streaming.
//!
//! [`StreamSink`] is the sink behind the streaming APIs: it pushes tagged
//! chunks onto an unbounded queue consumed as an [`OutputStream`] by a
//! single caller. The sequence finishes by dropping the sender (normal end)
//! or by sending the terminal error first.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;

use crate::error::Result;
use crate::exec::event::{OutputEvent, OutputSink};

/// One tagged chunk of command output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChunk {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
}

impl OutputChunk {
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Stdout(bytes) | Self::Stderr(bytes) => bytes,
        }
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Stdout(bytes) | Self::Stderr(bytes) => bytes,
        }
    }

    #[must_use]
    pub const fn is_stderr(&self) -> bool {
        matches!(self, Self::Stderr(_))
    }
}

/// Sink that forwards chunks onto a live, single-consumer sequence.
pub struct StreamSink {
    tx: Option<mpsc::UnboundedSender<Result<OutputChunk>>>,
}

impl StreamSink {
    /// Create a sink and the stream its consumer reads.
    #[must_use]
    pub fn channel() -> (Self, OutputStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, OutputStream { rx })
    }
}

impl OutputSink for StreamSink {
    fn deliver(&mut self, event: OutputEvent) -> bool {
        let Some(tx) = self.tx.take() else {
            return false;
        };

        match event {
            OutputEvent::Stdout(bytes) => {
                if tx.send(Ok(OutputChunk::Stdout(bytes))).is_ok() {
                    self.tx = Some(tx);
                    true
                } else {
                    false
                }
            }
            OutputEvent::Stderr(bytes) => {
                if tx.send(Ok(OutputChunk::Stderr(bytes))).is_ok() {
                    self.tx = Some(tx);
                    true
                } else {
                    false
                }
            }
            // Consumed by the lifecycle driver, never forwarded.
            OutputEvent::RequestAcknowledged => {
                if tx.is_closed() {
                    false
                } else {
                    self.tx = Some(tx);
                    true
                }
            }
            // Dropping the sender finishes the sequence.
            OutputEvent::End(None) => true,
            OutputEvent::End(Some(err)) => {
                let _ = tx.send(Err(err));
                true
            }
        }
    }
}

/// Live, ordered sequence of one execution's output chunks.
///
/// Single-pass, single-consumer. Terminates with `None` after a normal end,
/// or with one `Err` item (then `None`) after a failure.
pub struct OutputStream {
    rx: mpsc::UnboundedReceiver<Result<OutputChunk>>,
}

impl OutputStream {
    /// Receive the next chunk, or `None` once the sequence has finished.
    pub async fn recv(&mut self) -> Option<Result<OutputChunk>> {
        self.rx.recv().await
    }
}

impl futures_core::Stream for OutputStream {
    type Item = Result<OutputChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use futures_util::StreamExt;

    // ============== OutputChunk ==============

    #[test]
    fn test_chunk_accessors() {
        let out = OutputChunk::Stdout(b"a".to_vec());
        let err = OutputChunk::Stderr(b"b".to_vec());
        assert_eq!(out.bytes(), b"a");
        assert_eq!(err.bytes(), b"b");
        assert!(!out.is_stderr());
        assert!(err.is_stderr());
        assert_eq!(out.into_bytes(), b"a".to_vec());
    }

    // ============== Delivery order ==============

    #[tokio::test]
    async fn test_chunks_arrive_tagged_in_order() {
        let (mut sink, mut stream) = StreamSink::channel();
        assert!(sink.deliver(OutputEvent::Stdout(b"out1".to_vec())));
        assert!(sink.deliver(OutputEvent::Stderr(b"err1".to_vec())));
        assert!(sink.deliver(OutputEvent::Stdout(b"out2".to_vec())));
        assert!(sink.deliver(OutputEvent::End(None)));

        assert_eq!(
            stream.recv().await,
            Some(Ok(OutputChunk::Stdout(b"out1".to_vec())))
        );
        assert_eq!(
            stream.recv().await,
            Some(Ok(OutputChunk::Stderr(b"err1".to_vec())))
        );
        assert_eq!(
            stream.recv().await,
            Some(Ok(OutputChunk::Stdout(b"out2".to_vec())))
        );
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn test_normal_end_finishes_sequence() {
        let (mut sink, mut stream) = StreamSink::channel();
        sink.deliver(OutputEvent::End(None));
        assert_eq!(stream.recv().await, None);
        // Single-pass: stays finished
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn test_error_end_terminates_with_error() {
        let (mut sink, mut stream) = StreamSink::channel();
        sink.deliver(OutputEvent::Stdout(b"x".to_vec()));
        sink.deliver(OutputEvent::End(Some(ExecError::ChannelRequestFailed)));

        assert_eq!(
            stream.recv().await,
            Some(Ok(OutputChunk::Stdout(b"x".to_vec())))
        );
        assert_eq!(
            stream.recv().await,
            Some(Err(ExecError::ChannelRequestFailed))
        );
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn test_acknowledgment_not_forwarded() {
        let (mut sink, mut stream) = StreamSink::channel();
        assert!(sink.deliver(OutputEvent::RequestAcknowledged));
        sink.deliver(OutputEvent::Stdout(b"data".to_vec()));
        sink.deliver(OutputEvent::End(None));

        assert_eq!(
            stream.recv().await,
            Some(Ok(OutputChunk::Stdout(b"data".to_vec())))
        );
        assert_eq!(stream.recv().await, None);
    }

    // ============== Consumer abandonment ==============

    #[tokio::test]
    async fn test_dropped_consumer_refuses_delivery() {
        let (mut sink, stream) = StreamSink::channel();
        drop(stream);

        assert!(!sink.deliver(OutputEvent::Stdout(b"x".to_vec())));
        // Sink stays closed afterwards
        assert!(!sink.deliver(OutputEvent::Stdout(b"y".to_vec())));
    }

    #[tokio::test]
    async fn test_dropped_consumer_refuses_acknowledgment() {
        let (mut sink, stream) = StreamSink::channel();
        drop(stream);
        assert!(!sink.deliver(OutputEvent::RequestAcknowledged));
    }

    #[tokio::test]
    async fn test_no_delivery_after_end() {
        let (mut sink, _stream) = StreamSink::channel();
        assert!(sink.deliver(OutputEvent::End(None)));
        assert!(!sink.deliver(OutputEvent::Stdout(b"late".to_vec())));
    }

    // ============== Stream impl ==============

    #[tokio::test]
    async fn test_futures_stream_impl() {
        let (mut sink, stream) = StreamSink::channel();
        sink.deliver(OutputEvent::Stdout(b"a".to_vec()));
        sink.deliver(OutputEvent::Stderr(b"b".to_vec()));
        sink.deliver(OutputEvent::End(None));

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok(OutputChunk::Stdout(b"a".to_vec())));
        assert_eq!(items[1], Ok(OutputChunk::Stderr(b"b".to_vec())));
    }
}
