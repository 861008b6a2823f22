//! Codec errors.

use thiserror::Error;

/// Result of encoding, decoding or pointer parsing.
pub type CodecResult<T> = Result<T, CodecError>;

/// Failures turning documents into bytes and back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A document could not be written as CBOR.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// What the encoder reported.
        message: String,
    },

    /// Bytes are not a CBOR document.
    #[error("decoding failed: {message}")]
    DecodingFailed {
        /// What the decoder reported.
        message: String,
    },

    /// A value that should be a `{"$ref", "$id"}` pointer is not one.
    #[error("invalid DBRef: {message}")]
    InvalidDbRef {
        /// What was wrong with the value.
        message: String,
    },
}

impl CodecError {
    /// Builds [`CodecError::EncodingFailed`].
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Builds [`CodecError::DecodingFailed`].
    pub fn decoding_failed(message: impl Into<String>) -> Self {
        Self::DecodingFailed {
            message: message.into(),
        }
    }

    /// Builds [`CodecError::InvalidDbRef`].
    pub fn invalid_dbref(message: impl Into<String>) -> Self {
        Self::InvalidDbRef {
            message: message.into(),
        }
    }
}
