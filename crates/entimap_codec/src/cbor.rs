//! CBOR byte form of documents.

use crate::document::Document;
use crate::error::{CodecError, CodecResult};

/// Encode a document to CBOR bytes.
///
/// Identical documents (same keys in the same order) produce identical bytes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_cbor(document: &Document) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::into_writer(document, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

/// Decode a document from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid encoded document.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Document> {
    ciborium::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}
