//! Private rollback archive for node-evaluator state.
//!
//! Bytes produced here are only ever read back by the same process within the same
//! frame; the encoding is not a stable on-disk format.
use bincode::Options;
use bincode::config::DefaultOptions;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::foundation::error::{CamRigError, CamRigResult};

/// Appends serde values to a byte buffer.
#[derive(Debug, Default)]
pub struct StateWriter {
    buf: Vec<u8>,
}

impl StateWriter {
    /// Empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value`.
    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> CamRigResult<()> {
        DefaultOptions::new().serialize_into(&mut self.buf, value)?;
        Ok(())
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Return `true` when nothing was written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish and take the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads serde values back in the order they were written.
#[derive(Debug)]
pub struct StateReader<'a> {
    buf: &'a [u8],
}

impl<'a> StateReader<'a> {
    /// Reader over `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { buf: bytes }
    }

    /// Read the next value.
    pub fn read<T: DeserializeOwned>(&mut self) -> CamRigResult<T> {
        Ok(DefaultOptions::new().deserialize_from(&mut self.buf)?)
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Ensure every byte was consumed.
    pub fn finish(self) -> CamRigResult<()> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(CamRigError::serde(format!(
                "{} trailing bytes after restoring state",
                self.buf.len()
            )))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/rig/archive.rs"]
mod tests;
