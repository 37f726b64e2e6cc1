use super::alloc::Allocator;
use super::memory::GuestSlice;
use crate::error::{Result, Stage, StageContext as _};
use log::trace;
use wasmtime::AsContextMut;

/// Copies a string into freshly allocated guest memory.
///
/// The region belongs to whoever receives the returned slice; the host does
/// not free it.
pub fn pass_str(store: impl AsContextMut, alloc: &Allocator, s: &str) -> Result<GuestSlice> {
    pass_bytes(store, alloc, s.as_bytes())
}

pub fn pass_bytes(mut store: impl AsContextMut, alloc: &Allocator, bytes: &[u8]) -> Result<GuestSlice> {
    let len = u32::try_from(bytes.len())
        .stage_with(Stage::Allocate, || {
            format!("{} bytes do not fit in guest memory", bytes.len())
        })?;
    let slice = alloc.allocate(&mut store, len).stage(Stage::Allocate)?;
    alloc
        .memory()
        .write_bytes(&mut store, slice.ptr, bytes)
        .stage(Stage::Allocate)?;
    trace!("passed {len} bytes to guest at {:#x}", slice.ptr);
    Ok(slice)
}
