use crate::types::Signature;
use crate::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The address of a guest function within a loaded image.
///
/// This is typed solely to distinguish function addresses from other kinds of
/// pointer; the signature needed to actually call through it travels
/// separately, alongside the pointer, in the runtime's function handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionPointer(usize);

impl FunctionPointer {
    pub fn from_usize(ptr: usize) -> FunctionPointer {
        FunctionPointer(ptr)
    }
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// Discriminant for the closed set of extern kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExternKind {
    Func,
    Memory,
    Global,
    Table,
}

impl fmt::Display for ExternKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExternKind::Func => write!(f, "function"),
            ExternKind::Memory => write!(f, "memory"),
            ExternKind::Global => write!(f, "global"),
            ExternKind::Table => write!(f, "table"),
        }
    }
}

/// Linear memory limits, in units of 64 KiB guest pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySpec {
    pub initial_pages: u32,
    pub max_pages: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub initial_elements: u32,
    pub max_elements: Option<u32>,
}

/// The type of an import or export: a tagged union over the four extern
/// kinds, each carrying the metadata needed to check a concrete capability
/// against it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExternType {
    Func(Signature),
    Memory(MemorySpec),
    Global(ValueType),
    Table(TableSpec),
}

impl ExternType {
    pub fn kind(&self) -> ExternKind {
        match self {
            ExternType::Func(_) => ExternKind::Func,
            ExternType::Memory(_) => ExternKind::Memory,
            ExternType::Global(_) => ExternKind::Global,
            ExternType::Table(_) => ExternKind::Table,
        }
    }
}

/// An external dependency a module declares but does not define.
///
/// The import manifest in a module image is ordered; position in that order,
/// not the `module.field` name, is the binding key at the ABI boundary. Name
/// matching happens only while resolving.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportSpec {
    module: String,
    field: String,
    ty: ExternType,
}

impl ImportSpec {
    pub fn new(module: &str, field: &str, ty: ExternType) -> Self {
        Self {
            module: module.to_owned(),
            field: field.to_owned(),
            ty,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn ty(&self) -> &ExternType {
        &self.ty
    }

    /// The `module.field` rendering used in undefined-symbol conventions and
    /// diagnostics.
    pub fn symbol(&self) -> String {
        format!("{}.{}", self.module, self.field)
    }
}

/// A named, typed entry point a module exposes to hosts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportSpec {
    name: String,
    ty: ExternType,
}

impl ExportSpec {
    pub fn new(name: &str, ty: ExternType) -> Self {
        Self {
            name: name.to_owned(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ExternType {
        &self.ty
    }
}
