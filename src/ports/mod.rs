mod transport;

pub use transport::{ChannelEvent, ChannelTransport, CommandChannel, ExecMode, ExecutionRequest};

#[cfg(test)]
pub use transport::mock;
