use thiserror::Error;

/// Errors surfaced by command execution.
///
/// Every variant is terminal for the execution that produced it; nothing is
/// retried inside this crate. Variants carry plain `String` reasons so the
/// error stays `Clone` and can be delivered to every consumer registered for
/// one execution (both halves of a split pair, for instance).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("Channel creation timed out after {seconds}s")]
    ChannelCreationTimeout { seconds: u64 },

    #[error("Channel creation failed: {reason}")]
    ChannelCreationFailed { reason: String },

    #[error("Execution request rejected by the remote side")]
    ChannelRequestFailed,

    #[error("Command output too large (limit: {limit_bytes} bytes)")]
    OutputTooLarge { limit_bytes: usize },

    #[error("Invalid channel data: {frame}")]
    InvalidChannelData { frame: String },

    #[error("Command timed out after {seconds}s")]
    CommandTimeout { seconds: u64 },

    #[error("Transport error: {reason}")]
    Transport { reason: String },
}

pub type Result<T> = std::result::Result<T, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ============== Display ==============

    #[test]
    fn test_channel_creation_timeout_display() {
        let err = ExecError::ChannelCreationTimeout { seconds: 15 };
        let msg = format!("{err}");
        assert!(msg.contains("15"));
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn test_channel_creation_failed_display() {
        let err = ExecError::ChannelCreationFailed {
            reason: "connection reset".to_string(),
        };
        assert!(format!("{err}").contains("connection reset"));
    }

    #[test]
    fn test_channel_request_failed_display() {
        let err = ExecError::ChannelRequestFailed;
        assert!(format!("{err}").contains("rejected"));
    }

    #[test]
    fn test_output_too_large_display() {
        let err = ExecError::OutputTooLarge {
            limit_bytes: 10_485_760,
        };
        assert!(format!("{err}").contains("10485760"));
    }

    #[test]
    fn test_invalid_channel_data_display() {
        let err = ExecError::InvalidChannelData {
            frame: "non-data control frame".to_string(),
        };
        assert!(format!("{err}").contains("non-data control frame"));
    }

    #[test]
    fn test_command_timeout_display() {
        let err = ExecError::CommandTimeout { seconds: 1800 };
        assert!(format!("{err}").contains("1800"));
    }

    #[test]
    fn test_transport_display() {
        let err = ExecError::Transport {
            reason: "broken pipe".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Transport"));
        assert!(msg.contains("broken pipe"));
    }

    // ============== Clone / Eq ==============

    #[test]
    fn test_errors_clone_equal() {
        let variants = vec![
            ExecError::ChannelCreationTimeout { seconds: 15 },
            ExecError::ChannelCreationFailed {
                reason: "a".to_string(),
            },
            ExecError::ChannelRequestFailed,
            ExecError::OutputTooLarge { limit_bytes: 100 },
            ExecError::InvalidChannelData {
                frame: "b".to_string(),
            },
            ExecError::CommandTimeout { seconds: 30 },
            ExecError::Transport {
                reason: "c".to_string(),
            },
        ];

        for err in variants {
            assert_eq!(err.clone(), err);
            // Display and Debug must not panic for any variant
            let _ = format!("{err}");
            let _ = format!("{err:?}");
        }
    }

    // ============== Result alias ==============

    #[test]
    fn test_result_type_alias() {
        let ok: Result<u8> = Ok(1);
        let err: Result<u8> = Err(ExecError::ChannelRequestFailed);
        assert!(ok.is_ok());
        assert!(err.is_err());
    }
}
