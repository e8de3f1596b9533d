//! Concrete capabilities bound to a module's externs.

use vessel_module::{ExternKind, FunctionPointer, Signature};

/// A callable guest or host function together with the signature needed to
/// build a typed trampoline for it.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionHandle {
    pub ptr: FunctionPointer,
    pub sig: Signature,
}

/// A linear memory region descriptor, in guest pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryHandle {
    pub initial_pages: u32,
    pub max_pages: Option<u32>,
}

/// A typed global value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalValue {
    pub value: i64,
}

/// A table of function references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableHandle {
    pub elements: u32,
}

/// A resolved external binding: the concrete capability supplied for an
/// import, or exposed by an export.
///
/// The discriminant mirrors [`ExternKind`]; kind checks during resolution
/// and invocation are a single `match` over it.
#[derive(Clone, Debug, PartialEq)]
pub enum ExternValue {
    Func(FunctionHandle),
    Memory(MemoryHandle),
    Global(GlobalValue),
    Table(TableHandle),
}

impl ExternValue {
    pub fn kind(&self) -> ExternKind {
        match self {
            ExternValue::Func(_) => ExternKind::Func,
            ExternValue::Memory(_) => ExternKind::Memory,
            ExternValue::Global(_) => ExternKind::Global,
            ExternValue::Table(_) => ExternKind::Table,
        }
    }

    pub fn as_func(&self) -> Option<&FunctionHandle> {
        match self {
            ExternValue::Func(f) => Some(f),
            _ => None,
        }
    }
}
