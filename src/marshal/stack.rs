use super::memory::GuestPtr;
use crate::error::{Error, Result, Stage, StageContext as _};
use anyhow::Context as _;
use log::{error, trace, warn};
use wasmtime::{AsContextMut, TypedFunc};

/// Bytes reserved on the shadow stack for a returned `(ptr, len)` pair.
pub const RETURN_SLOT_SIZE: u32 = 16;

/// Scratch space on the guest shadow stack that a callee writes its results to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnSlot {
    base: GuestPtr,
    size: u32,
}

impl ReturnSlot {
    pub fn base(&self) -> GuestPtr {
        self.base
    }

    /// Address of the `n`th 32-bit result word.
    pub fn word(&self, n: u32) -> GuestPtr {
        self.base.wrapping_add(n * 4)
    }
}

/// `__wbindgen_add_to_stack_pointer`. The guest stack grows downward.
#[derive(Clone)]
pub struct StackPointer {
    add: TypedFunc<i32, i32>,
}

impl StackPointer {
    pub fn new(add: TypedFunc<i32, i32>) -> Self {
        Self { add }
    }

    pub fn add(&self, store: impl AsContextMut, delta: i32) -> anyhow::Result<GuestPtr> {
        let sp = self
            .add
            .call(store, delta)
            .with_context(|| format!("cannot move guest stack pointer by {delta}"))?;
        Ok(sp as GuestPtr)
    }

    pub fn current(&self, store: impl AsContextMut) -> anyhow::Result<GuestPtr> {
        self.add(store, 0)
    }

    /// Runs `f` with `size` bytes reserved on the guest stack. The space is
    /// handed back when `f` returns, whether it succeeded or not.
    pub fn with_return_slot<S, R, F>(&self, mut store: S, size: u32, f: F) -> Result<R>
    where
        S: AsContextMut,
        F: FnOnce(&mut S, ReturnSlot) -> Result<R>,
    {
        let delta = i32::try_from(size).stage(Stage::Reserve)?;
        let base = self.add(&mut store, -delta).stage(Stage::Reserve)?;
        let slot = ReturnSlot { base, size };
        trace!("reserved return slot {slot:?}");

        let result = f(&mut store, slot);

        match (result, self.add(&mut store, delta)) {
            (Ok(value), Ok(sp)) => {
                if sp != base.wrapping_add(size) {
                    warn!(
                        "guest stack pointer is {sp:#x} after releasing {slot:?}, expected {:#x}",
                        base.wrapping_add(size)
                    );
                }
                Ok(value)
            }
            (Ok(_), Err(e)) => Err(Error::new(
                Stage::Reserve,
                e.context(format!("cannot release return slot {slot:?}")),
            )),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(release)) => {
                error!("cannot release return slot {slot:?}: {release:#}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fixture;
    use crate::marshal::GuestSlice;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn release_restores_stack_pointer() -> Result<()> {
        let mut host = fixture()?;
        let (store, exports) = host.split_mut();
        let stack = &exports.stack;

        let before = stack.current(&mut *store)?;
        let base = stack.with_return_slot(&mut *store, RETURN_SLOT_SIZE, |store, slot| {
            assert_eq!(stack.current(&mut **store).stage(Stage::Reserve)?, slot.base());
            Ok(slot.base())
        })?;

        assert_eq!(base, before - RETURN_SLOT_SIZE);
        assert_eq!(stack.current(&mut *store)?, before);
        Ok(())
    }

    #[test]
    fn release_runs_when_body_fails() -> Result<()> {
        let mut host = fixture()?;
        let (store, exports) = host.split_mut();
        let stack = &exports.stack;

        let before = stack.current(&mut *store)?;
        let err = stack
            .with_return_slot(&mut *store, RETURN_SLOT_SIZE, |_, _| -> crate::error::Result<()> {
                Err(Error::msg(Stage::Invoke, "callee trapped"))
            })
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Invoke);
        assert_eq!(stack.current(&mut *store)?, before);
        Ok(())
    }

    #[test]
    fn reservation_leaves_other_memory_alone() -> Result<()> {
        let mut host = fixture()?;
        let (store, exports) = host.split_mut();
        let memory = exports.memory;

        let sp = exports.stack.current(&mut *store)?;
        let below = GuestSlice::new(sp - 2 * RETURN_SLOT_SIZE, RETURN_SLOT_SIZE);
        let above = GuestSlice::new(sp, RETURN_SLOT_SIZE);
        memory.write_bytes(&mut *store, below.ptr, &[0xaa; RETURN_SLOT_SIZE as usize])?;
        memory.write_bytes(&mut *store, above.ptr, &[0xbb; RETURN_SLOT_SIZE as usize])?;

        exports
            .stack
            .with_return_slot(&mut *store, RETURN_SLOT_SIZE, |store, slot| {
                memory
                    .write_bytes(&mut **store, slot.base(), &[0; RETURN_SLOT_SIZE as usize])
                    .stage(Stage::Decode)
            })?;

        assert_eq!(memory.read_bytes(&*store, below)?, vec![0xaa; 16]);
        assert_eq!(memory.read_bytes(&*store, above)?, vec![0xbb; 16]);
        Ok(())
    }

    #[test]
    fn words_are_four_bytes_apart() {
        let slot = ReturnSlot {
            base: 0x1000,
            size: RETURN_SLOT_SIZE,
        };
        assert_eq!(slot.word(0), 0x1000);
        assert_eq!(slot.word(1), 0x1004);
    }
}
