//! Byte payloads handed to the native module

use std::ffi::CString;

use crate::error::ValidationError;

/// Encode a display name the way the native side expects it: UTF-8 bytes
/// followed by a single NUL terminator.
pub fn encode_name(name: &str) -> Result<Vec<u8>, ValidationError> {
    CString::new(name)
        .map(CString::into_bytes_with_nul)
        .map_err(|_| ValidationError::InvalidName(name.to_string()))
}

/// A file's contents plus its encoded name.
///
/// Built once per read and consumed by a single transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryPayload {
    name: String,
    name_bytes: Vec<u8>,
    data: Vec<u8>,
}

impl BinaryPayload {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Result<Self, ValidationError> {
        let name = name.into();
        let name_bytes = encode_name(&name)?;
        Ok(Self {
            name,
            name_bytes,
            data,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// NUL-terminated name
    pub fn name_bytes(&self) -> &[u8] {
        &self.name_bytes
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
