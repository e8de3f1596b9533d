//! `vessel-runtime` is the execution engine for ahead-of-time compiled
//! sandboxed module images.
//!
//! The pipeline is synchronous and single-threaded by design: the loader
//! produces a [`ModuleImage`](module/trait.ModuleImage.html), the resolver
//! matches its declared imports against a
//! [`CapabilityEnv`](env/struct.CapabilityEnv.html), the instance builder
//! turns the image and the resolved imports into an isolated
//! [`Instance`](instance/struct.Instance.html), and the invocation
//! trampoline crosses the sandbox boundary exactly once per call.
//!
//! Failures propagate as [`Error`](error/enum.Error.html) values; the C API
//! additionally deposits each failure into a process-wide last-error slot
//! readable through the two-call `vessel_last_error_length` /
//! `vessel_last_error_message` protocol.

#![deny(bare_trait_objects)]

pub mod alloc;
pub mod c_api;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod externs;
pub mod hostcalls;
pub mod instance;
pub mod module;
pub mod resolver;
pub mod trampoline;
pub mod trap;
pub mod val;
pub mod vmctx;

pub use crate::alloc::Heap;
pub use crate::env::{CapabilityEnv, CapabilityEnvBuilder};
pub use crate::error::{
    EnvError, Error, InstantiationError, InvocationError, LoadError, ResolutionError,
};
pub use crate::externs::{ExternValue, FunctionHandle, GlobalValue, MemoryHandle, TableHandle};
pub use crate::instance::{new_instance_handle, Instance, InstanceHandle, InstanceToken, State};
pub use crate::module::{DlModule, MockModuleBuilder, ModuleImage};
pub use crate::resolver::resolve_imports;
pub use crate::trap::TrapReason;
pub use crate::val::{UntypedRetVal, Val};
pub use crate::vmctx::Vmctx;

/// Guest page granularity for linear memory sizing and growth.
pub const WASM_PAGE_SIZE: u32 = 64 * 1024;
