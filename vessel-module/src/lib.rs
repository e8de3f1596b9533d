//! Common types for representing Vessel module images.
//!
//! These types are shared between the ahead-of-time compiler that produces
//! object images and `vessel-runtime`, with metadata serialized in
//! [`bincode`](https://github.com/TyOverby/bincode) format into the compiled
//! image.

#![deny(bare_trait_objects)]

pub mod error;
mod externs;
mod globals;
mod linear_memory;
mod module_data;
mod types;
mod version_info;

pub use crate::error::Error;
pub use crate::externs::{
    ExportSpec, ExternKind, ExternType, FunctionPointer, ImportSpec, MemorySpec, TableSpec,
};
pub use crate::globals::GlobalSpec;
pub use crate::linear_memory::HeapSpec;
pub use crate::module_data::{ModuleData, MODULE_DATA_LEN_SYM, MODULE_DATA_SYM};
pub use crate::types::{Signature, ValueType};
pub use crate::version_info::VersionInfo;

/// Prefix for the symbol under which an exported guest function is defined in
/// a compiled object image. The full symbol for an export named `run` is
/// `guest_func_run`.
pub const GUEST_FUNC_PREFIX: &str = "guest_func_";

/// Symbol for the module's designated start routine, if it declares one.
pub const GUEST_START_SYM: &str = "guest_start";
