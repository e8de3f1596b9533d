//! The C-compatible embedding surface.
//!
//! Every fallible entry point returns a [`vessel_error`] tag and, on
//! failure, records a human-readable message in the process-wide diagnostics
//! channel. C callers retrieve it with the two-call protocol:
//! [`vessel_last_error_length`] to size a buffer, then
//! [`vessel_last_error_message`] to copy the message out.

#![allow(non_camel_case_types)]

use crate::diagnostics;
use crate::env::{CapabilityEnv, CapabilityEnvBuilder};
use crate::error::{Error, InvocationError};
use crate::instance::{instance_handle_from_raw, instance_handle_to_raw, Instance};
use crate::module::{DlModule, ModuleImage};
use crate::resolver::resolve_imports;
use crate::val::{UntypedRetVal, Val};
use libc::{c_char, c_int};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use std::ffi::CStr;
use std::slice;
use std::sync::Arc;

#[macro_export]
macro_rules! assert_nonnull {
    ( $name:ident ) => {
        if $name.is_null() {
            return vessel_error::InvalidArgument;
        }
    };
}

/// Wrap up the management of `Arc`s that go across the FFI boundary.
#[macro_export]
macro_rules! with_ffi_arcs {
    ( [ $name:ident : $ty:ty ], $body:block ) => {{
        assert_nonnull!($name);
        let $name = Arc::from_raw($name as *const $ty);
        let res = $body;
        Arc::into_raw($name);
        res
    }};
    ( [ $name:ident : $ty:ty, $($tail:tt)* ], $body:block ) => {{
        assert_nonnull!($name);
        let $name = Arc::from_raw($name as *const $ty);
        let rec = with_ffi_arcs!([$($tail)*], $body);
        Arc::into_raw($name);
        rec
    }};
}

macro_rules! with_instance_ptr {
    ( $name:ident, $body:block ) => {{
        assert_nonnull!($name);
        let $name: &mut Instance = &mut *($name as *mut Instance);
        $body
    }};
}

/// Record a failure in the diagnostics channel and produce its C tag.
fn failure(e: &Error) -> vessel_error {
    diagnostics::record_failure(e);
    e.into()
}

#[repr(C)]
pub struct vessel_dl_module {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct vessel_env {
    _unused: [u8; 0],
}

#[repr(C)]
pub struct vessel_instance {
    _unused: [u8; 0],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, FromPrimitive)]
pub enum vessel_error {
    Ok,
    InvalidArgument,
    Load,
    Resolution,
    Instantiation,
    SymbolNotFound,
    SignatureMismatch,
    RuntimeFault,
    Poisoned,
    Env,
    Internal,
}

impl From<&Error> for vessel_error {
    fn from(e: &Error) -> vessel_error {
        match e {
            Error::InvalidArgument(_) => vessel_error::InvalidArgument,
            Error::Load(_) => vessel_error::Load,
            Error::Resolution(_) => vessel_error::Resolution,
            Error::Instantiation(_) => vessel_error::Instantiation,
            Error::Invocation(InvocationError::NoSuchExport(_)) => vessel_error::SymbolNotFound,
            Error::Invocation(InvocationError::SignatureMismatch(_)) => {
                vessel_error::SignatureMismatch
            }
            Error::Invocation(InvocationError::Trap(_)) => vessel_error::RuntimeFault,
            Error::Invocation(InvocationError::PoisonedInstance) => vessel_error::Poisoned,
            Error::Invocation(InvocationError::AlreadyRunning) => vessel_error::InvalidArgument,
            Error::Env(_) => vessel_error::Env,
            Error::InternalError(_) => vessel_error::Internal,
        }
    }
}

#[no_mangle]
pub extern "C" fn vessel_error_name(e: c_int) -> *const c_char {
    if let Some(e) = vessel_error::from_i32(e) {
        use self::vessel_error::*;
        match e {
            Ok => "vessel_error_ok\0".as_ptr() as _,
            InvalidArgument => "vessel_error_invalid_argument\0".as_ptr() as _,
            Load => "vessel_error_load\0".as_ptr() as _,
            Resolution => "vessel_error_resolution\0".as_ptr() as _,
            Instantiation => "vessel_error_instantiation\0".as_ptr() as _,
            SymbolNotFound => "vessel_error_symbol_not_found\0".as_ptr() as _,
            SignatureMismatch => "vessel_error_signature_mismatch\0".as_ptr() as _,
            RuntimeFault => "vessel_error_runtime_fault\0".as_ptr() as _,
            Poisoned => "vessel_error_poisoned\0".as_ptr() as _,
            Env => "vessel_error_env\0".as_ptr() as _,
            Internal => "vessel_error_internal\0".as_ptr() as _,
        }
    } else {
        "!!! error: unknown vessel_error variant\0".as_ptr() as _
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub enum vessel_val_type {
    I32,
    I64,
    F32,
    F64,
}

/// A typed argument value. `bits` holds the value in slot representation:
/// integers zero- or sign-extended to 64 bits, floats as their bit patterns.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct vessel_val {
    pub ty: vessel_val_type,
    pub bits: u64,
}

impl From<&vessel_val> for Val {
    fn from(val: &vessel_val) -> Val {
        match val.ty {
            vessel_val_type::I32 => Val::I32(val.bits as u32 as i32),
            vessel_val_type::I64 => Val::I64(val.bits as i64),
            vessel_val_type::F32 => Val::F32(f32::from_bits(val.bits as u32)),
            vessel_val_type::F64 => Val::F64(f64::from_bits(val.bits)),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct vessel_untyped_retval {
    pub gp: u64,
    pub fp: u64,
}

impl From<UntypedRetVal> for vessel_untyped_retval {
    fn from(retval: UntypedRetVal) -> vessel_untyped_retval {
        vessel_untyped_retval {
            gp: retval.gp(),
            fp: retval.fp(),
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn vessel_dl_module_load(
    path: *const c_char,
    mod_out: *mut *mut vessel_dl_module,
) -> vessel_error {
    assert_nonnull!(path);
    assert_nonnull!(mod_out);
    let path = match CStr::from_ptr(path).to_str() {
        Ok(path) => path,
        Err(_) => {
            diagnostics::record_message("module path is not valid UTF-8");
            return vessel_error::InvalidArgument;
        }
    };
    match DlModule::load(path) {
        Ok(module) => {
            mod_out.write(Arc::into_raw(module) as _);
            vessel_error::Ok
        }
        Err(e) => failure(&e),
    }
}

#[no_mangle]
pub unsafe extern "C" fn vessel_dl_module_release(module: *const vessel_dl_module) {
    if !module.is_null() {
        Arc::from_raw(module as *const DlModule);
    }
}

#[no_mangle]
pub unsafe extern "C" fn vessel_env_new(env_out: *mut *mut vessel_env) -> vessel_error {
    assert_nonnull!(env_out);
    let env = CapabilityEnvBuilder::new().build();
    env_out.write(Arc::into_raw(env) as _);
    vessel_error::Ok
}

#[no_mangle]
pub unsafe extern "C" fn vessel_env_arg(
    env: *const vessel_env,
    arg: *const c_char,
) -> vessel_error {
    assert_nonnull!(arg);
    let arg = match CStr::from_ptr(arg).to_str() {
        Ok(arg) => arg,
        Err(_) => {
            diagnostics::record_message("argument is not valid UTF-8");
            return vessel_error::InvalidArgument;
        }
    };
    with_ffi_arcs!([env: CapabilityEnv], {
        match env.push_arg(arg) {
            Ok(()) => vessel_error::Ok,
            Err(e) => failure(&e),
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn vessel_env_release(env: *const vessel_env) {
    if !env.is_null() {
        Arc::from_raw(env as *const CapabilityEnv);
    }
}

/// Resolve the module's imports against `env` and build an instance,
/// running the image's start routine if it has one.
#[no_mangle]
pub unsafe extern "C" fn vessel_instance_new(
    module: *const vessel_dl_module,
    env: *const vessel_env,
    inst_out: *mut *mut vessel_instance,
) -> vessel_error {
    assert_nonnull!(inst_out);
    with_ffi_arcs!([module: DlModule, env: CapabilityEnv], {
        resolve_imports(module.as_ref(), env.as_ref())
            .and_then(|imports| {
                crate::instance::new_instance_handle(
                    module.clone() as Arc<dyn ModuleImage>,
                    imports,
                    env.clone(),
                )
            })
            .map(|inst| {
                inst_out.write(instance_handle_to_raw(inst) as _);
                vessel_error::Ok
            })
            .unwrap_or_else(|e| failure(&e))
    })
}

/// Invoke an exported function by name.
///
/// `argv` supplies `argc` typed argument values; it may be null when `argc`
/// is 0. On success the return value, if the export has one, is written to
/// `retval_out` unless that is null.
#[no_mangle]
pub unsafe extern "C" fn vessel_instance_run(
    inst: *mut vessel_instance,
    entrypoint: *const c_char,
    argc: usize,
    argv: *const vessel_val,
    retval_out: *mut vessel_untyped_retval,
) -> vessel_error {
    assert_nonnull!(entrypoint);
    let entrypoint = match CStr::from_ptr(entrypoint).to_str() {
        Ok(name) => name,
        Err(_) => {
            diagnostics::record_message("entrypoint name is not valid UTF-8");
            return vessel_error::InvalidArgument;
        }
    };
    let args: Vec<Val> = if argc == 0 {
        vec![]
    } else {
        assert_nonnull!(argv);
        slice::from_raw_parts(argv, argc).iter().map(Val::from).collect()
    };
    with_instance_ptr!(inst, {
        match inst.run(entrypoint, &args) {
            Ok(retval) => {
                if !retval_out.is_null() {
                    retval_out.write(retval.into());
                }
                vessel_error::Ok
            }
            Err(e) => failure(&e),
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn vessel_instance_release(inst: *mut vessel_instance) {
    if !inst.is_null() {
        instance_handle_from_raw(inst as *mut Instance);
    }
}

/// Byte length of the most recently recorded failure message, including its
/// NUL terminator. Returns 0 when no failure has been recorded.
#[no_mangle]
pub extern "C" fn vessel_last_error_length() -> c_int {
    diagnostics::last_error_length() as c_int
}

/// Copy the most recently recorded failure message, NUL included, into
/// `buf`.
///
/// Returns the number of bytes copied, 0 when no failure has been recorded,
/// or -1 when `buf` is null or `len` is smaller than the length reported by
/// [`vessel_last_error_length`]. The message is not consumed; it stays
/// readable until the next failure overwrites it.
#[no_mangle]
pub unsafe extern "C" fn vessel_last_error_message(buf: *mut c_char, len: c_int) -> c_int {
    if buf.is_null() || len < 0 {
        return -1;
    }
    let buf = slice::from_raw_parts_mut(buf as *mut u8, len as usize);
    match diagnostics::copy_last_error(buf) {
        Ok(copied) => copied as c_int,
        Err(()) => -1,
    }
}
