mod dl;
mod mock;

pub use crate::module::dl::DlModule;
pub use crate::module::mock::{MockModule, MockModuleBuilder};
pub use vessel_module::{
    ExportSpec, ExternKind, ExternType, FunctionPointer, GlobalSpec, HeapSpec, ImportSpec,
    MemorySpec, Signature, TableSpec, ValueType,
};

use crate::error::Error;
use crate::externs::FunctionHandle;

/// The read-only parts of a loaded object image: its code and metadata
/// manifests.
///
/// A `ModuleImage` is produced by a loader without running any guest code,
/// and is immutable once produced. Types that implement this trait are
/// suitable for use with
/// [`new_instance_handle()`](../instance/fn.new_instance_handle.html).
pub trait ModuleImage: ModuleImageInternal {}

pub trait ModuleImageInternal: Send + Sync {
    fn heap_spec(&self) -> &HeapSpec;

    fn globals(&self) -> &[GlobalSpec];

    /// The image's declared external dependencies, in declaration order.
    ///
    /// Position in this manifest, not name, is the binding key at the ABI
    /// boundary; the resolved import vector must match it index for index.
    fn imports(&self) -> &[ImportSpec];

    /// The image's entry point table.
    fn exports(&self) -> &[ExportSpec];

    /// Function references for the image's table segment.
    fn table_elements(&self) -> &[FunctionPointer];

    fn get_export_func(&self, name: &str) -> Result<FunctionHandle, Error>;

    fn get_start_func(&self) -> Result<Option<FunctionHandle>, Error>;

    fn get_export(&self, name: &str) -> Option<&ExportSpec> {
        self.exports().iter().find(|e| e.name() == name)
    }
}

/// Signature of a start routine: no parameters, no result.
pub(crate) fn start_signature() -> Signature {
    Signature {
        params: vec![],
        ret_ty: None,
    }
}
