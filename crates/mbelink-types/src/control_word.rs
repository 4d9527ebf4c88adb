//! The fixed-size binary control word consumed by MBE codec backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of an encoded control word payload in bytes.
pub const CONTROL_WORD_BYTES: usize = 12;

/// Number of 16-bit words in a control word.
pub const CONTROL_WORD_LEN: usize = 6;

/// A codec configuration control word: six native-endian signed 16-bit
/// integers, in order.
///
/// Construction from a byte payload copies the words out; the control word
/// never aliases the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlWord([i16; CONTROL_WORD_LEN]);

#[derive(Debug, Error)]
pub enum ControlWordError {
    /// The byte payload was not exactly [`CONTROL_WORD_BYTES`] long.
    #[error("control word size mismatch: expected {expected} bytes, got {got}")]
    SizeMismatch { expected: usize, got: usize },
}

impl ControlWord {
    pub fn new(words: [i16; CONTROL_WORD_LEN]) -> Self {
        Self(words)
    }

    /// Decodes a control word from its 12-byte wire form.
    pub fn from_bytes(payload: &[u8]) -> Result<Self, ControlWordError> {
        if payload.len() != CONTROL_WORD_BYTES {
            return Err(ControlWordError::SizeMismatch {
                expected: CONTROL_WORD_BYTES,
                got: payload.len(),
            });
        }

        let mut words = [0i16; CONTROL_WORD_LEN];
        for (word, chunk) in words.iter_mut().zip(payload.chunks_exact(2)) {
            *word = i16::from_ne_bytes([chunk[0], chunk[1]]);
        }
        Ok(Self(words))
    }

    pub fn words(&self) -> &[i16; CONTROL_WORD_LEN] {
        &self.0
    }

    /// Encodes the control word back into its 12-byte wire form.
    pub fn to_bytes(&self) -> [u8; CONTROL_WORD_BYTES] {
        let mut bytes = [0u8; CONTROL_WORD_BYTES];
        for (chunk, word) in bytes.chunks_exact_mut(2).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_ne_bytes());
        }
        bytes
    }
}
