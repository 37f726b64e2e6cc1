use anyhow::{Context as _, Result};
use wasmtime::{AsContext, AsContextMut, Memory};

/// An offset into guest linear memory.
pub type GuestPtr = u32;

/// A (pointer, length) run of bytes in guest memory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GuestSlice {
    pub ptr: GuestPtr,
    pub len: u32,
}

impl GuestSlice {
    pub fn new(ptr: GuestPtr, len: u32) -> Self {
        Self { ptr, len }
    }

    pub fn end(&self) -> Option<usize> {
        (self.ptr as usize).checked_add(self.len as usize)
    }

    /// The pair as the guest's `i32` parameters.
    pub fn params(&self) -> (i32, i32) {
        (self.ptr as i32, self.len as i32)
    }
}

/// The exported linear memory of a guest.
///
/// Only a handle is kept, never the base address: every access goes back
/// through the store, so a `memory.grow` inside a guest call cannot leave the
/// host reading a stale mapping.
#[derive(Debug, Clone, Copy)]
pub struct GuestMemory {
    memory: Memory,
}

impl GuestMemory {
    pub fn new(memory: Memory) -> Self {
        Self { memory }
    }

    pub fn size(&self, store: impl AsContext) -> usize {
        self.memory.data_size(&store)
    }

    pub fn read_bytes(&self, store: impl AsContext, slice: GuestSlice) -> Result<Vec<u8>> {
        let end = slice
            .end()
            .with_context(|| format!("guest range overflows: {slice:?}"))?;
        let size = self.size(&store);
        if end > size {
            anyhow::bail!(
                "guest range {:#x}..{:#x} is out of bounds, memory size is {:#x}",
                slice.ptr,
                end,
                size
            );
        }

        let mut buf = vec![0u8; slice.len as usize];
        self.memory
            .read(&store, slice.ptr as usize, &mut buf)
            .with_context(|| format!("cannot read guest memory at {:#x}", slice.ptr))?;
        Ok(buf)
    }

    pub fn write_bytes(&self, mut store: impl AsContextMut, ptr: GuestPtr, data: &[u8]) -> Result<()> {
        self.memory
            .write(&mut store, ptr as usize, data)
            .with_context(|| {
                format!(
                    "cannot write {} bytes to guest memory at {:#x}",
                    data.len(),
                    ptr
                )
            })
    }

    /// Reads a little-endian `u32`, the layout the guest uses for pointers
    /// and lengths.
    pub fn load_u32(&self, store: impl AsContext, addr: GuestPtr) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.memory
            .read(&store, addr as usize, &mut buf)
            .with_context(|| format!("cannot load u32 from guest memory at {addr:#x}"))?;
        Ok(u32::from_le_bytes(buf))
    }

    pub fn store_u32(&self, store: impl AsContextMut, addr: GuestPtr, value: u32) -> Result<()> {
        self.write_bytes(store, addr, &value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fixture;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn write_then_read() -> Result<()> {
        let mut host = fixture()?;
        let (store, exports) = host.split_mut();
        let memory = exports.memory;

        memory.write_bytes(&mut *store, 0x2000, b"hello")?;
        let got = memory.read_bytes(&*store, GuestSlice::new(0x2000, 5))?;
        assert_eq!(got, b"hello");
        Ok(())
    }

    #[test]
    fn u32_is_little_endian() -> Result<()> {
        let mut host = fixture()?;
        let (store, exports) = host.split_mut();
        let memory = exports.memory;

        memory.store_u32(&mut *store, 0x2000, 0x0011_2233)?;
        let raw = memory.read_bytes(&*store, GuestSlice::new(0x2000, 4))?;
        assert_eq!(raw, vec![0x33, 0x22, 0x11, 0x00]);
        assert_eq!(memory.load_u32(&*store, 0x2000)?, 0x0011_2233);
        Ok(())
    }

    #[test]
    fn out_of_bounds_access_is_rejected() -> Result<()> {
        let mut host = fixture()?;
        let (store, exports) = host.split_mut();
        let memory = exports.memory;
        let size = memory.size(&*store) as u32;

        let tests = [
            GuestSlice::new(size - 2, 4),
            GuestSlice::new(size, 1),
            GuestSlice::new(u32::MAX, u32::MAX),
        ];
        for slice in tests {
            assert!(
                memory.read_bytes(&*store, slice).is_err(),
                "read of {slice:?} must fail"
            );
        }

        assert!(memory.write_bytes(&mut *store, size - 1, b"ab").is_err());
        assert!(memory.load_u32(&*store, size - 3).is_err());

        // an empty read at the very end is still in bounds
        assert_eq!(memory.read_bytes(&*store, GuestSlice::new(size, 0))?, Vec::<u8>::new());
        Ok(())
    }
}
