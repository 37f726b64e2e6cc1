use crate::error::{Result, Stage, StageContext as _};
use crate::marshal::{Allocator, Free, GuestMemory, Malloc, Realloc, StackPointer};
use anyhow::Context as _;
use log::debug;
use wasmtime::{AsContextMut, Func, Instance, TypedFunc};

pub const MEMORY: &str = "memory";
pub const MALLOC: &str = "__wbindgen_malloc";
pub const REALLOC: &str = "__wbindgen_realloc";
pub const ADD_TO_STACK_POINTER: &str = "__wbindgen_add_to_stack_pointer";
pub const FREE: &str = "__wbindgen_free";
pub const INVOKE_CONTRACT: &str = "invoke_contract";

/// `invoke_contract(retptr, contract_id, wasm, function, args)`, each string
/// passed as `(ptr, len)`.
pub type InvokeContract = TypedFunc<(i32, i32, i32, i32, i32, i32, i32, i32, i32), ()>;

/// Handles to everything the host calls in the runtime module.
#[derive(Clone)]
pub struct Exports {
    pub memory: GuestMemory,
    pub allocator: Allocator,
    pub stack: StackPointer,
    pub invoke_contract: InvokeContract,
}

impl Exports {
    pub fn resolve(mut store: impl AsContextMut, instance: &Instance) -> Result<Self> {
        let memory = instance
            .get_memory(&mut store, MEMORY)
            .with_context(|| format!("not found exported memory: {MEMORY}"))
            .stage(Stage::Resolve)?;
        let memory = GuestMemory::new(memory);

        let malloc = func(&mut store, instance, MALLOC)?;
        let malloc = Malloc::from_func(&store, malloc)
            .with_context(|| format!("unexpected signature of {MALLOC}"))
            .stage(Stage::Resolve)?;

        let realloc = func(&mut store, instance, REALLOC)?;
        let realloc = Realloc::from_func(&store, realloc)
            .with_context(|| format!("unexpected signature of {REALLOC}"))
            .stage(Stage::Resolve)?;

        let free = func(&mut store, instance, FREE)?;
        let free = Free::from_func(&store, free)
            .with_context(|| format!("unexpected signature of {FREE}"))
            .stage(Stage::Resolve)?;

        let add_to_stack_pointer = func(&mut store, instance, ADD_TO_STACK_POINTER)?
            .typed::<i32, i32>(&store)
            .with_context(|| format!("unexpected signature of {ADD_TO_STACK_POINTER}"))
            .stage(Stage::Resolve)?;

        let invoke_contract = func(&mut store, instance, INVOKE_CONTRACT)?
            .typed(&store)
            .with_context(|| format!("unexpected signature of {INVOKE_CONTRACT}"))
            .stage(Stage::Resolve)?;

        debug!("resolved runtime exports");
        Ok(Self {
            memory,
            allocator: Allocator::new(memory, malloc, realloc, free),
            stack: StackPointer::new(add_to_stack_pointer),
            invoke_contract,
        })
    }
}

fn func(store: impl AsContextMut, instance: &Instance, name: &str) -> Result<Func> {
    instance
        .get_func(store, name)
        .with_context(|| format!("not found exported function: {name}"))
        .stage(Stage::Resolve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::{HostConfig, Stage};
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_export_is_a_resolve_error() -> Result<()> {
        let code = r#"
(module
  (memory (export "memory") 1)
  (func (export "__wbindgen_malloc") (param i32) (result i32) (i32.const 8))
)
"#;
        let wasm = wat::parse_str(code)?;
        let err = match Host::from_bytes(wasm, &HostConfig::default()) {
            Ok(_) => panic!("instantiation must fail without exports"),
            Err(err) => err,
        };

        assert_eq!(err.stage(), Stage::Resolve);
        assert_eq!(
            err.cause().to_string(),
            format!("not found exported function: {REALLOC}")
        );
        Ok(())
    }

    #[test]
    fn wrong_signature_is_a_resolve_error() -> Result<()> {
        let code = r#"
(module
  (memory (export "memory") 1)
  (func (export "__wbindgen_malloc") (param i32) (result i32) (i32.const 8))
  (func (export "__wbindgen_realloc") (param i32 i32 i32) (result i32) (i32.const 8))
  (func (export "__wbindgen_free") (param i32 i32))
  (func (export "__wbindgen_add_to_stack_pointer") (param i32) (result i32) (i32.const 0))
  (func (export "invoke_contract") (param i32 i32 i32))
)
"#;
        let wasm = wat::parse_str(code)?;
        let err = match Host::from_bytes(wasm, &HostConfig::default()) {
            Ok(_) => panic!("instantiation must fail with a bad invoke_contract"),
            Err(err) => err,
        };

        assert_eq!(err.stage(), Stage::Resolve);
        assert_eq!(
            err.cause().to_string(),
            format!("unexpected signature of {INVOKE_CONTRACT}")
        );
        Ok(())
    }
}
