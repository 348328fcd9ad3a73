//! Destinations for enumeration snapshots.
//!
//! A sink may live in memory owned by another context and can fail on its own.
//! The registry only writes to a sink after releasing its lock.

use thiserror::Error;

/// The destination could not accept the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("destination rejected the transfer")]
pub struct TransferFault;

/// Receiver of a serialized address snapshot.
pub trait AddressSink {
    /// Bytes the destination can hold.
    fn capacity(&self) -> usize;

    /// Writes `bytes` to the start of the destination.
    ///
    /// `bytes` is never longer than [`AddressSink::capacity`].
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransferFault>;
}

/// A sink over a caller-provided byte buffer.
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    written: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// The bytes written by the last transfer.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.written]
    }
}

impl AddressSink for SliceSink<'_> {
    fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransferFault> {
        let dest = self.buf.get_mut(..bytes.len()).ok_or(TransferFault)?;
        dest.copy_from_slice(bytes);
        self.written = bytes.len();
        Ok(())
    }
}

/// An unbounded sink whose contents become exactly the written bytes.
impl AddressSink for Vec<u8> {
    fn capacity(&self) -> usize {
        usize::MAX
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransferFault> {
        self.clear();
        self.try_reserve(bytes.len()).map_err(|_| TransferFault)?;
        self.extend_from_slice(bytes);
        Ok(())
    }
}
