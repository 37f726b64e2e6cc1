use super::memory::{GuestMemory, GuestPtr, GuestSlice};
use anyhow::{bail, Context as _, Result};
use log::trace;
use wasmtime::{AsContext, AsContextMut, Func, TypedFunc};

/// Alignment passed for byte buffers.
const BYTE_ALIGN: i32 = 1;

/// `__wbindgen_malloc`. Newer wasm-bindgen releases take an alignment.
#[derive(Clone)]
pub enum Malloc {
    Size(TypedFunc<i32, i32>),
    SizeAlign(TypedFunc<(i32, i32), i32>),
}

impl Malloc {
    pub fn from_func(store: impl AsContext, func: Func) -> Result<Self> {
        let malloc = match func.ty(&store).params().len() {
            1 => Malloc::Size(func.typed(&store)?),
            2 => Malloc::SizeAlign(func.typed(&store)?),
            n => bail!("allocator takes {n} parameters, expected (size) or (size, align)"),
        };
        Ok(malloc)
    }

    fn call(&self, store: impl AsContextMut, size: i32) -> Result<i32> {
        match self {
            Malloc::Size(f) => f.call(store, size),
            Malloc::SizeAlign(f) => f.call(store, (size, BYTE_ALIGN)),
        }
    }
}

/// `__wbindgen_realloc`.
#[derive(Clone)]
pub enum Realloc {
    Sizes(TypedFunc<(i32, i32, i32), i32>),
    SizesAlign(TypedFunc<(i32, i32, i32, i32), i32>),
}

impl Realloc {
    pub fn from_func(store: impl AsContext, func: Func) -> Result<Self> {
        let realloc = match func.ty(&store).params().len() {
            3 => Realloc::Sizes(func.typed(&store)?),
            4 => Realloc::SizesAlign(func.typed(&store)?),
            n => bail!(
                "reallocator takes {n} parameters, expected (ptr, old_size, new_size) or (ptr, old_size, new_size, align)"
            ),
        };
        Ok(realloc)
    }

    fn call(&self, store: impl AsContextMut, ptr: i32, old: i32, new: i32) -> Result<i32> {
        match self {
            Realloc::Sizes(f) => f.call(store, (ptr, old, new)),
            Realloc::SizesAlign(f) => f.call(store, (ptr, old, new, BYTE_ALIGN)),
        }
    }
}

/// `__wbindgen_free`. The size is in bytes: the element count times the
/// element size, which for `u8` buffers is the length itself.
#[derive(Clone)]
pub enum Free {
    Size(TypedFunc<(i32, i32), ()>),
    SizeAlign(TypedFunc<(i32, i32, i32), ()>),
}

impl Free {
    pub fn from_func(store: impl AsContext, func: Func) -> Result<Self> {
        let free = match func.ty(&store).params().len() {
            2 => Free::Size(func.typed(&store)?),
            3 => Free::SizeAlign(func.typed(&store)?),
            n => bail!("deallocator takes {n} parameters, expected (ptr, size) or (ptr, size, align)"),
        };
        Ok(free)
    }

    fn call(&self, store: impl AsContextMut, ptr: i32, size: i32) -> Result<()> {
        match self {
            Free::Size(f) => f.call(store, (ptr, size)),
            Free::SizeAlign(f) => f.call(store, (ptr, size, BYTE_ALIGN)),
        }
    }
}

/// The guest's heap allocator together with the memory it hands out.
#[derive(Clone)]
pub struct Allocator {
    memory: GuestMemory,
    malloc: Malloc,
    realloc: Realloc,
    free: Free,
}

impl Allocator {
    pub fn new(memory: GuestMemory, malloc: Malloc, realloc: Realloc, free: Free) -> Self {
        Self {
            memory,
            malloc,
            realloc,
            free,
        }
    }

    pub fn memory(&self) -> GuestMemory {
        self.memory
    }

    pub fn allocate(&self, mut store: impl AsContextMut, len: u32) -> Result<GuestSlice> {
        let ptr = self
            .malloc
            .call(&mut store, len as i32)
            .with_context(|| format!("guest allocator trapped allocating {len} bytes"))?
            as GuestPtr;
        trace!("allocated {len} bytes at {ptr:#x}");
        let slice = GuestSlice::new(ptr, len);
        self.check(&store, slice)?;
        Ok(slice)
    }

    pub fn reallocate(
        &self,
        mut store: impl AsContextMut,
        slice: GuestSlice,
        new_len: u32,
    ) -> Result<GuestSlice> {
        let (ptr, old_len) = slice.params();
        let ptr = self
            .realloc
            .call(&mut store, ptr, old_len, new_len as i32)
            .with_context(|| {
                format!("guest allocator trapped resizing {slice:?} to {new_len} bytes")
            })? as GuestPtr;
        trace!("reallocated {slice:?} to {new_len} bytes at {ptr:#x}");
        let slice = GuestSlice::new(ptr, new_len);
        self.check(&store, slice)?;
        Ok(slice)
    }

    pub fn free(&self, store: impl AsContextMut, slice: GuestSlice) -> Result<()> {
        let size = slice.len * std::mem::size_of::<u8>() as u32;
        trace!("free {size} bytes at {:#x}", slice.ptr);
        self.free
            .call(store, slice.ptr as i32, size as i32)
            .with_context(|| format!("guest deallocator trapped freeing {slice:?}"))
    }

    fn check(&self, store: impl AsContext, slice: GuestSlice) -> Result<()> {
        if slice.ptr == 0 && slice.len != 0 {
            bail!("guest allocator returned a null pointer for {} bytes", slice.len);
        }
        let size = self.memory.size(&store);
        match slice.end() {
            Some(end) if end <= size => Ok(()),
            _ => bail!(
                "guest allocator returned {slice:?}, outside of memory size {size:#x}"
            ),
        }
    }
}
