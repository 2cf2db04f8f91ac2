mod transport;

pub use transport::{SshCommandChannel, SshTransport};
