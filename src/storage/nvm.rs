//! Byte-addressed non-volatile memory.

use crate::error::{Result, StorageError};

/// Byte-addressed non-volatile memory.
///
/// Writes may be buffered until [`commit`](Nvm::commit), as with the emulated
/// EEPROM found on flash-only microcontrollers.
pub trait Nvm {
    /// Total addressable size in bytes.
    fn capacity(&self) -> usize;

    /// Read `buf.len()` bytes starting at `offset`.
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<()>;

    /// Write `data` starting at `offset`.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()>;

    /// Flush buffered writes to the medium.
    fn commit(&mut self) -> Result<()>;
}

/// RAM-backed [`Nvm`], erased to `0xFF` like fresh flash.
///
/// Useful on hosts and in tests; tracks how many commits were made.
#[derive(Debug, Clone)]
pub struct MemoryNvm<const N: usize> {
    bytes: [u8; N],
    commits: usize,
}

impl<const N: usize> Default for MemoryNvm<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryNvm<N> {
    /// Create an erased memory.
    pub const fn new() -> Self {
        Self {
            bytes: [0xFF; N],
            commits: 0,
        }
    }

    /// Create a memory with initial contents.
    pub const fn with_contents(bytes: [u8; N]) -> Self {
        Self { bytes, commits: 0 }
    }

    /// Raw contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of commits performed.
    pub fn commits(&self) -> usize {
        self.commits
    }

    fn range(offset: usize, len: usize) -> Result<core::ops::Range<usize>> {
        match offset.checked_add(len) {
            Some(end) if end <= N => Ok(offset..end),
            _ => Err(StorageError::OutOfBounds { offset, len }.into()),
        }
    }
}

impl<const N: usize> Nvm for MemoryNvm<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let range = Self::range(offset, buf.len())?;
        buf.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let range = Self::range(offset, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_fresh_memory_is_erased() {
        let mut nvm = MemoryNvm::<16>::new();
        let mut buf = [0u8; 4];
        nvm.read(12, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn test_write_then_read() {
        let mut nvm = MemoryNvm::<16>::new();
        nvm.write(3, b"abc").unwrap();
        nvm.commit().unwrap();

        let mut buf = [0u8; 3];
        nvm.read(3, &mut buf).unwrap();
        assert_eq!(&buf, b"abc");
        assert_eq!(nvm.commits(), 1);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut nvm = MemoryNvm::<16>::new();
        let result = nvm.write(14, b"abc");
        assert_eq!(
            result,
            Err(Error::Storage(StorageError::OutOfBounds { offset: 14, len: 3 }))
        );
    }
}
