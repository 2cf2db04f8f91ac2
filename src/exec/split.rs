//! Splitting a merged output sequence.
//!
//! [`split`] fans one merged, tagged sequence into two independently
//! consumable sequences, one carrying only stdout chunks and one only
//! stderr chunks. A background task does the forwarding, so either half can
//! be consumed (or dropped) without blocking the other.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;

use crate::error::Result;
use crate::exec::stream::{OutputChunk, OutputStream};

/// Live sequence of raw byte chunks from one side of a split pair.
pub struct ByteStream {
    rx: mpsc::UnboundedReceiver<Result<Vec<u8>>>,
}

impl ByteStream {
    /// Receive the next chunk, or `None` once the sequence has finished.
    pub async fn recv(&mut self) -> Option<Result<Vec<u8>>> {
        self.rx.recv().await
    }
}

impl futures_core::Stream for ByteStream {
    type Item = Result<Vec<u8>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Fork a merged sequence into `(stdout_only, stderr_only)`.
///
/// Normal completion of the merged sequence finishes both halves; an error
/// terminates both halves with the same error. Within each half, chunk
/// order matches the chunk's relative order in the merged sequence.
#[must_use]
pub fn split(mut merged: OutputStream) -> (ByteStream, ByteStream) {
    let (stdout_tx, stdout_rx) = mpsc::unbounded_channel();
    let (stderr_tx, stderr_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(item) = merged.recv().await {
            match item {
                Ok(OutputChunk::Stdout(bytes)) => {
                    let _ = stdout_tx.send(Ok(bytes));
                }
                Ok(OutputChunk::Stderr(bytes)) => {
                    let _ = stderr_tx.send(Ok(bytes));
                }
                Err(err) => {
                    let _ = stdout_tx.send(Err(err.clone()));
                    let _ = stderr_tx.send(Err(err));
                    break;
                }
            }
        }
        // Senders drop here, finishing both halves.
    });

    (
        ByteStream { rx: stdout_rx },
        ByteStream { rx: stderr_rx },
    )
}
