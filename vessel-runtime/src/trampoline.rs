//! The host-to-guest call trampoline.
//!
//! Guest functions all share one machine-level shape: `extern "C"
//! fn(*mut VmContext, u64, ...) -> u64`, with one 64-bit slot per declared
//! parameter. Floats travel as their bit patterns. The trampoline checks the
//! caller's arguments against the image's declared signature, packs them
//! into slots, and transmutes the entry address to the concrete arity.

use crate::error::{Error, InvocationError};
use crate::val::{UntypedRetVal, Val};
use crate::vmctx::VmContext;
use anyhow::format_err;
use std::mem;
use vessel_module::{FunctionPointer, Signature, ValueType};

/// The most parameters a guest function may declare. Images are produced
/// under the same limit, so exceeding it indicates a host-side signature
/// confusion rather than a legitimate call.
pub const MAX_GUEST_ARITY: usize = 8;

/// Check a prospective argument list against a declared signature.
///
/// Errors here leave the instance untouched; nothing has run yet.
pub fn check_signature(sig: &Signature, args: &[Val]) -> Result<(), Error> {
    if sig.params.len() != args.len() {
        return Err(InvocationError::SignatureMismatch(format!(
            "expected {} arguments, got {}",
            sig.params.len(),
            args.len()
        ))
        .into());
    }
    for (idx, (param, arg)) in sig.params.iter().zip(args.iter()).enumerate() {
        if *param != arg.value_type() {
            return Err(InvocationError::SignatureMismatch(format!(
                "argument {} has type {}, expected {}",
                idx,
                arg.value_type(),
                param
            ))
            .into());
        }
    }
    if sig.params.len() > MAX_GUEST_ARITY {
        return Err(InvocationError::SignatureMismatch(format!(
            "{} parameters exceeds the calling convention limit of {}",
            sig.params.len(),
            MAX_GUEST_ARITY
        ))
        .into());
    }
    Ok(())
}

/// Call `func` with `args` according to the guest calling convention.
///
/// # Safety
///
/// `func` must be the address of a function following the guest calling
/// convention whose true signature is `sig`, and `vmctx` must point to the
/// live context of the instance being run. The caller must have validated
/// `args` with [`check_signature`] first.
pub(crate) unsafe fn invoke(
    vmctx: *mut VmContext,
    func: FunctionPointer,
    sig: &Signature,
    args: &[Val],
) -> Result<UntypedRetVal, Error> {
    let slots: Vec<u64> = args.iter().map(|arg| arg.to_slot()).collect();
    let addr = func.as_usize();
    let raw = match slots.len() {
        0 => mem::transmute::<usize, extern "C" fn(*mut VmContext) -> u64>(addr)(vmctx),
        1 => mem::transmute::<usize, extern "C" fn(*mut VmContext, u64) -> u64>(addr)(
            vmctx, slots[0],
        ),
        2 => mem::transmute::<usize, extern "C" fn(*mut VmContext, u64, u64) -> u64>(addr)(
            vmctx, slots[0], slots[1],
        ),
        3 => mem::transmute::<usize, extern "C" fn(*mut VmContext, u64, u64, u64) -> u64>(addr)(
            vmctx, slots[0], slots[1], slots[2],
        ),
        4 => mem::transmute::<usize, extern "C" fn(*mut VmContext, u64, u64, u64, u64) -> u64>(
            addr,
        )(vmctx, slots[0], slots[1], slots[2], slots[3]),
        5 => mem::transmute::<
            usize,
            extern "C" fn(*mut VmContext, u64, u64, u64, u64, u64) -> u64,
        >(addr)(vmctx, slots[0], slots[1], slots[2], slots[3], slots[4]),
        6 => mem::transmute::<
            usize,
            extern "C" fn(*mut VmContext, u64, u64, u64, u64, u64, u64) -> u64,
        >(addr)(
            vmctx, slots[0], slots[1], slots[2], slots[3], slots[4], slots[5],
        ),
        7 => mem::transmute::<
            usize,
            extern "C" fn(*mut VmContext, u64, u64, u64, u64, u64, u64, u64) -> u64,
        >(addr)(
            vmctx, slots[0], slots[1], slots[2], slots[3], slots[4], slots[5], slots[6],
        ),
        8 => mem::transmute::<
            usize,
            extern "C" fn(*mut VmContext, u64, u64, u64, u64, u64, u64, u64, u64) -> u64,
        >(addr)(
            vmctx, slots[0], slots[1], slots[2], slots[3], slots[4], slots[5], slots[6], slots[7],
        ),
        n => {
            // check_signature rejects these before we get here; reaching
            // this arm means a caller bypassed it
            return Err(Error::InternalError(format_err!(
                "no trampoline for arity {}",
                n
            )));
        }
    };
    Ok(match sig.ret_ty {
        None => UntypedRetVal::default(),
        Some(ValueType::F32) | Some(ValueType::F64) => UntypedRetVal::from_fp(raw),
        Some(_) => UntypedRetVal::from_gp(raw),
    })
}
