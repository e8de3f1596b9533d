//! Interfaces for accessing instance internals from hostcalls and guest
//! shims.
//!
//! A `vessel_vmctx *` is the first parameter of every guest function. From
//! within a hostcall, use [`Vmctx::from_raw`] to wrap it and get access to
//! the calling instance's heap, globals, import table and argument list.

use crate::error::Error;
use crate::instance::Instance;
use crate::trap::TrapReason;
use std::ffi::CString;
use vessel_module::FunctionPointer;

pub(crate) const VMCTX_MAGIC: u64 = 835_467_113;

/// The guest-visible context record, passed by pointer as the implicit first
/// argument of every guest function.
///
/// Layout is part of the calling convention and must not change without a
/// version bump in the module data header.
#[repr(C)]
pub struct VmContext {
    pub(crate) magic: u64,
    pub(crate) heap_ptr: *mut u8,
    pub(crate) heap_len: u64,
    pub(crate) globals_ptr: *mut i64,
    pub(crate) globals_len: u64,
    /// Resolved import bindings, in the image's declaration order. Position,
    /// not name, is the key: entry `i` is the function address bound for the
    /// `i`th entry of the import manifest.
    pub(crate) imports_ptr: *const usize,
    pub(crate) imports_len: u64,
    pub(crate) instance: *mut Instance,
}

impl VmContext {
    pub(crate) fn unlinked() -> VmContext {
        VmContext {
            magic: VMCTX_MAGIC,
            heap_ptr: std::ptr::null_mut(),
            heap_len: 0,
            globals_ptr: std::ptr::null_mut(),
            globals_len: 0,
            imports_ptr: std::ptr::null(),
            imports_len: 0,
            instance: std::ptr::null_mut(),
        }
    }
}

/// A handle to the instance on whose behalf the current hostcall is running.
pub struct Vmctx {
    vmctx: *mut VmContext,
}

impl Vmctx {
    /// Create a `Vmctx` from the raw pointer passed into a guest function.
    ///
    /// # Safety
    ///
    /// This is only safe to call from within a hostcall or guest shim
    /// invoked through the trampoline: the pointer must be the one the
    /// trampoline passed, and the wrapper must not outlive the call.
    pub unsafe fn from_raw(vmctx: *mut VmContext) -> Vmctx {
        assert!(!vmctx.is_null(), "vmctx is not null");
        assert_eq!((*vmctx).magic, VMCTX_MAGIC, "vmctx magic is valid");
        Vmctx { vmctx }
    }

    fn instance(&self) -> &Instance {
        unsafe { &*(*self.vmctx).instance }
    }

    /// While an instance is running, its `Instance` is reachable only
    /// through the vmctx; the host-side borrow that started the call does
    /// not touch the instance until control returns, so this aliasing is
    /// sound in the same way as any FFI callback into owner state.
    #[allow(clippy::mut_from_ref)]
    fn instance_mut(&self) -> &mut Instance {
        unsafe { &mut *(*self.vmctx).instance }
    }

    /// The guest's linear memory.
    pub fn heap(&self) -> &[u8] {
        self.instance().heap()
    }

    #[allow(clippy::mut_from_ref)]
    pub fn heap_mut(&self) -> &mut [u8] {
        self.instance_mut().heap_mut()
    }

    /// The argument list configured in the bound capability environment.
    pub fn args(&self) -> Vec<CString> {
        self.instance().env().args()
    }

    /// The resolved function bound at position `idx` of the import manifest.
    pub fn import_func(&self, idx: usize) -> Option<FunctionPointer> {
        self.instance().import_func(idx)
    }

    pub fn global(&self, idx: usize) -> Option<i64> {
        self.instance().global(idx)
    }

    pub fn set_global(&self, idx: usize, value: i64) -> bool {
        self.instance_mut().set_global(idx, value)
    }

    /// Grow the guest's linear memory, returning the previous size in pages.
    pub fn grow_memory(&self, additional_pages: u32) -> Result<u32, Error> {
        self.instance_mut().grow_memory(additional_pages)
    }

    /// Raise a trap against the current call.
    ///
    /// The trap does not transfer control; the guest must still return
    /// through the trampoline, which will surface the pending trap as an
    /// invocation failure and mark the instance faulted. Hostcall shims
    /// typically raise and then return an error code the guest propagates
    /// out.
    pub fn raise_trap(&self, reason: TrapReason) {
        tracing::warn!(%reason, "guest raised trap");
        self.instance_mut().record_trap(reason);
    }
}
