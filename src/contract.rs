use crate::config::Invocation;
use crate::error::{Result, Stage, StageContext as _};
use crate::host::Exports;
use crate::marshal::{pass_str, take_vec_u8, RETURN_SLOT_SIZE};
use log::debug;
use wasmtime::AsContextMut;

/// Runs `invocation` through the runtime's `invoke_contract` export and
/// returns the result bytes (XDR) it produced.
///
/// The four string arguments are handed over to the runtime, which frees
/// them. Only the returned vector is freed by the host.
pub fn invoke_contract(
    store: impl AsContextMut,
    exports: &Exports,
    invocation: &Invocation,
) -> Result<Vec<u8>> {
    let alloc = &exports.allocator;
    exports
        .stack
        .with_return_slot(store, RETURN_SLOT_SIZE, |store, retptr| {
            let contract_id = pass_str(&mut *store, alloc, &invocation.contract_id)?;
            let module = pass_str(&mut *store, alloc, &invocation.module)?;
            let function = pass_str(&mut *store, alloc, &invocation.function)?;
            let args = pass_str(&mut *store, alloc, &invocation.args)?;

            debug!(
                "invoke_contract: function={} retptr={:#x} contract_id={:?} module={:?} function={:?} args={:?}",
                invocation.function,
                retptr.base(),
                contract_id,
                module,
                function,
                args
            );

            let (contract_id_ptr, contract_id_len) = contract_id.params();
            let (module_ptr, module_len) = module.params();
            let (function_ptr, function_len) = function.params();
            let (args_ptr, args_len) = args.params();
            exports
                .invoke_contract
                .call(
                    &mut *store,
                    (
                        retptr.base() as i32,
                        contract_id_ptr,
                        contract_id_len,
                        module_ptr,
                        module_len,
                        function_ptr,
                        function_len,
                        args_ptr,
                        args_len,
                    ),
                )
                .stage_with(Stage::Invoke, || {
                    format!("invoke_contract failed calling {}", invocation.function)
                })?;

            let result = take_vec_u8(&mut *store, alloc, retptr)?;
            debug!("invoke_contract returned {} bytes", result.len());
            Ok(result)
        })
}
