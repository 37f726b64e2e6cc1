use super::alloc::Allocator;
use super::memory::GuestSlice;
use super::stack::ReturnSlot;
use crate::error::{Result, Stage, StageContext as _};
use log::trace;
use wasmtime::AsContextMut;

/// Takes ownership of a `Vec<u8>` the callee left in `slot`.
///
/// The bytes are copied out before the guest buffer is freed, so the returned
/// vector never aliases guest memory. A descriptor pointing outside guest
/// memory is rejected and nothing is freed.
pub fn take_vec_u8(mut store: impl AsContextMut, alloc: &Allocator, slot: ReturnSlot) -> Result<Vec<u8>> {
    let memory = alloc.memory();
    let ptr = memory.load_u32(&store, slot.word(0)).stage(Stage::Decode)?;
    let len = memory.load_u32(&store, slot.word(1)).stage(Stage::Decode)?;
    let slice = GuestSlice::new(ptr, len);
    trace!("return slot {:#x} holds {slice:?}", slot.base());

    let data = memory
        .read_bytes(&store, slice)
        .stage_with(Stage::Decode, || "returned vector is not in guest memory")?;
    alloc.free(&mut store, slice).stage(Stage::Decode)?;
    Ok(data)
}
