//! CLI error types.

use hashpay_channel::ChannelError;
use hashpay_crypto::CryptoError;
use hashpay_types::ErrorCode;
use hashpay_wire::CodecError;
use thiserror::Error;

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error enum wrapping all crate errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Channel error.
    #[error("{0}")]
    Channel(#[from] ChannelError),

    /// Codec error.
    #[error("{0}")]
    Codec(#[from] CodecError),

    /// Key or address error.
    #[error("{0}")]
    Crypto(#[from] CryptoError),

    /// IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Input that is not valid hex.
    #[error("Invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// User-facing error with actionable message.
    #[error("{0}")]
    User(String),
}

impl CliError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a user-facing error.
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors: 1
            Self::User(_) => 1,
            // Config errors: 3
            Self::Config(_) | Self::Toml(_) => 3,
            // Channel errors: 4
            Self::Channel(_) => 4,
            // Malformed input: 5
            Self::Codec(_) | Self::InvalidHex(_) => 5,
            // Key errors: 6
            Self::Crypto(_) => 6,
            // IO errors: 9
            Self::Io(_) => 9,
            // JSON errors: 10
            Self::Json(_) => 10,
        }
    }

    /// Get the protocol error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Channel(e) => e.error_code(),
            Self::Codec(e) => e.error_code(),
            Self::InvalidHex(_) => ErrorCode::MalformedMessage,
            Self::Crypto(_) => ErrorCode::SigningFailed,
            Self::Config(_) | Self::Toml(_) | Self::Json(_) | Self::Io(_) | Self::User(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Recovery hint shown under the error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Channel(e) => Some(e.suggestion()),
            Self::Config(_) | Self::Toml(_) => {
                Some("Fix the configuration file or pass the value as a flag.")
            }
            Self::InvalidHex(_) => Some("Pass the message bytes as hex, optionally prefixed with 0x."),
            other => other.error_code().suggestion(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashpay_types::ChannelState;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::user("x").exit_code(), 1);
        assert_eq!(CliError::config("x").exit_code(), 3);
        assert_eq!(
            CliError::from(ChannelError::ChannelClosed(ChannelState::Settled)).exit_code(),
            4
        );
        assert_eq!(CliError::from(CodecError::Empty).exit_code(), 5);
    }

    #[test]
    fn test_channel_error_code_passes_through() {
        let err = CliError::from(ChannelError::ChannelClosed(ChannelState::Closing));
        assert_eq!(err.error_code(), ErrorCode::ChannelClosed);
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_codec_error_is_malformed() {
        let err = CliError::from(CodecError::UnknownMessageType(99));
        assert_eq!(err.error_code(), ErrorCode::MalformedMessage);
    }
}
