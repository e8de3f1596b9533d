//! Host-implemented import shims.
//!
//! These are the functions the capability environment offers during import
//! resolution. They follow the guest calling convention: `vmctx` first, then
//! one 64-bit slot per declared parameter, returning a 64-bit slot. All of
//! them return a POSIX-style errno in the low 32 bits of the result.

use crate::externs::FunctionHandle;
use crate::trap::TrapReason;
use crate::vmctx::{VmContext, Vmctx};
use std::convert::TryFrom;
use vessel_module::{signature, FunctionPointer};

pub const ERRNO_SUCCESS: u64 = 0;
pub const ERRNO_FAULT: u64 = 21;

/// The import bindings a [`CapabilityEnv`](crate::env::CapabilityEnv)
/// synthesizes, keyed by `(module, field)`, in a stable order.
pub(crate) fn synthesized_imports() -> Vec<(&'static str, &'static str, FunctionHandle)> {
    vec![
        (
            "env",
            "args_sizes_get",
            FunctionHandle {
                ptr: FunctionPointer::from_usize(vessel_hostcall_args_sizes_get as usize),
                sig: signature!((I32, I32) -> I32),
            },
        ),
        (
            "env",
            "args_get",
            FunctionHandle {
                ptr: FunctionPointer::from_usize(vessel_hostcall_args_get as usize),
                sig: signature!((I32, I32) -> I32),
            },
        ),
    ]
}

/// Write the argument count and the total byte length of the encoded
/// argument block to the two guest addresses given.
///
/// The byte length counts each argument's NUL terminator, so a subsequent
/// `args_get` call with a buffer of exactly that size succeeds.
#[no_mangle]
pub unsafe extern "C" fn vessel_hostcall_args_sizes_get(
    vmctx: *mut VmContext,
    argc_ptr: u64,
    argv_buf_size_ptr: u64,
) -> u64 {
    let vmctx = Vmctx::from_raw(vmctx);
    let args = vmctx.args();
    let argc = args.len() as u32;
    let argv_buf_size: u32 = args
        .iter()
        .map(|arg| arg.as_bytes_with_nul().len() as u32)
        .sum();
    if write_u32(&vmctx, argc_ptr, argc).is_err()
        || write_u32(&vmctx, argv_buf_size_ptr, argv_buf_size).is_err()
    {
        vmctx.raise_trap(TrapReason::HeapOutOfBounds);
        return ERRNO_FAULT;
    }
    ERRNO_SUCCESS
}

/// Write the argument vector into guest memory.
///
/// `argv_ptr` receives one 32-bit guest pointer per argument; `argv_buf_ptr`
/// receives the arguments themselves, NUL-terminated and back to back, with
/// each vector entry pointing at the corresponding string.
#[no_mangle]
pub unsafe extern "C" fn vessel_hostcall_args_get(
    vmctx: *mut VmContext,
    argv_ptr: u64,
    argv_buf_ptr: u64,
) -> u64 {
    let vmctx = Vmctx::from_raw(vmctx);
    let args = vmctx.args();
    let mut buf_offset = argv_buf_ptr;
    for (idx, arg) in args.iter().enumerate() {
        let bytes = arg.as_bytes_with_nul();
        let entry_ptr = argv_ptr + 4 * idx as u64;
        if buf_offset > u64::from(u32::max_value())
            || write_u32(&vmctx, entry_ptr, buf_offset as u32).is_err()
            || write_bytes(&vmctx, buf_offset, bytes).is_err()
        {
            vmctx.raise_trap(TrapReason::HeapOutOfBounds);
            return ERRNO_FAULT;
        }
        buf_offset += bytes.len() as u64;
    }
    ERRNO_SUCCESS
}

fn write_u32(vmctx: &Vmctx, addr: u64, value: u32) -> Result<(), ()> {
    write_bytes(vmctx, addr, &value.to_le_bytes())
}

/// Bounds-checked store into the guest heap. Addresses are guest offsets,
/// not host pointers.
fn write_bytes(vmctx: &Vmctx, addr: u64, bytes: &[u8]) -> Result<(), ()> {
    let heap = vmctx.heap_mut();
    let start = usize::try_from(addr).map_err(|_| ())?;
    let end = start.checked_add(bytes.len()).ok_or(())?;
    if end > heap.len() {
        return Err(());
    }
    heap[start..end].copy_from_slice(bytes);
    Ok(())
}
