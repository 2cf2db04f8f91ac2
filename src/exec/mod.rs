mod collector;
mod event;
mod router;
mod runner;
mod split;
mod stream;

pub use collector::{BufferedCollector, CaptureOptions, CapturedOutput};
pub use event::{OutputEvent, OutputSink};
pub use router::{ChannelOutputRouter, Routed};
pub use runner::CommandRunner;
pub use split::{split, ByteStream};
pub use stream::{OutputChunk, OutputStream, StreamSink};
