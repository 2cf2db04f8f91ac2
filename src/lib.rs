//! Remote command execution over multiplexed SSH channels.
//!
//! Given an already-authenticated connection, this crate opens logical
//! channels, issues exec or shell requests, and exposes the resulting
//! stdout/stderr activity to callers as one buffered result or as live
//! asynchronous sequences.

pub mod config;
pub mod error;
pub mod exec;
pub mod ports;
pub mod ssh;

pub use config::ExecConfig;
pub use error::{ExecError, Result};
pub use exec::{
    split, BufferedCollector, ByteStream, CaptureOptions, CapturedOutput, ChannelOutputRouter,
    CommandRunner, OutputChunk, OutputEvent, OutputSink, OutputStream, Routed, StreamSink,
};
pub use ports::{ChannelEvent, ChannelTransport, CommandChannel, ExecMode, ExecutionRequest};
pub use ssh::{SshCommandChannel, SshTransport};
