use crate::error::{Error, LoadError};
use crate::externs::FunctionHandle;
use crate::module::{start_signature, ModuleImage, ModuleImageInternal};
use libloading::Library;
use std::path::Path;
use std::slice;
use std::sync::Arc;
use vessel_module::{
    ExportSpec, ExternType, FunctionPointer, GlobalSpec, HeapSpec, ImportSpec, ModuleData,
    GUEST_FUNC_PREFIX, GUEST_START_SYM, MODULE_DATA_LEN_SYM, MODULE_DATA_SYM,
};

/// A module image backed by a dynamically-loaded shared object.
pub struct DlModule {
    lib: Library,

    /// Metadata decoded from inside the image.
    module_data: ModuleData,

    table_elements: Vec<FunctionPointer>,
}

impl DlModule {
    /// Create a module image, loading code from a shared object on the
    /// filesystem.
    ///
    /// The image's metadata is validated (container magic, version header,
    /// target architecture) before this returns; no guest code runs.
    pub fn load<P: AsRef<Path>>(so_path: P) -> Result<Arc<Self>, Error> {
        let abs_so_path = so_path.as_ref().canonicalize().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Load(LoadError::NotFound(so_path.as_ref().display().to_string()))
            } else {
                Error::Load(LoadError::MalformedImage(format!(
                    "{}: {}",
                    so_path.as_ref().display(),
                    e
                )))
            }
        })?;
        // Load the shared object. Any undefined symbols it carries are
        // provided by the current executable; imports declared in the
        // metadata manifest are delivered positionally through the vmctx
        // instead, so the dynamic linker never resolves guest imports.
        let lib = Library::new(abs_so_path.as_os_str()).map_err(|e| {
            Error::Load(LoadError::MalformedImage(format!(
                "{}: {}",
                abs_so_path.display(),
                e
            )))
        })?;

        let module_data_ptr = unsafe {
            lib.get::<*const u8>(MODULE_DATA_SYM.as_bytes()).map_err(|e| {
                LoadError::MalformedImage(format!(
                    "error loading required symbol `{}`: {}",
                    MODULE_DATA_SYM, e
                ))
            })?
        };

        let module_data_len = unsafe {
            lib.get::<usize>(MODULE_DATA_LEN_SYM.as_bytes()).map_err(|e| {
                LoadError::MalformedImage(format!(
                    "error loading required symbol `{}`: {}",
                    MODULE_DATA_LEN_SYM, e
                ))
            })?
        };

        // The slice only needs to live for the deserialization; `ModuleData`
        // owns its contents, so nothing below borrows from the shared
        // object's data section.
        let module_data_slice: &[u8] =
            unsafe { slice::from_raw_parts(*module_data_ptr, *module_data_len) };
        let module_data = ModuleData::deserialize(module_data_slice)
            .map_err(|e| LoadError::MalformedImage(e.to_string()))?;

        check_arch(&module_data, std::env::consts::ARCH)?;

        let table_elements = unsafe { read_table_segment(&lib)? };

        tracing::debug!(
            path = %abs_so_path.display(),
            imports = module_data.imports().len(),
            exports = module_data.exports().len(),
            "loaded object image"
        );

        Ok(Arc::new(DlModule {
            lib,
            module_data,
            table_elements,
        }))
    }
}

impl ModuleImage for DlModule {}

impl ModuleImageInternal for DlModule {
    fn heap_spec(&self) -> &HeapSpec {
        self.module_data.heap_spec()
    }

    fn globals(&self) -> &[GlobalSpec] {
        self.module_data.globals_spec()
    }

    fn imports(&self) -> &[ImportSpec] {
        self.module_data.imports()
    }

    fn exports(&self) -> &[ExportSpec] {
        self.module_data.exports()
    }

    fn table_elements(&self) -> &[FunctionPointer] {
        &self.table_elements
    }

    fn get_export_func(&self, name: &str) -> Result<FunctionHandle, Error> {
        let spec = self
            .module_data
            .get_export(name)
            .ok_or_else(|| LoadError::MalformedImage(format!("no export named `{}`", name)))?;
        let sig = match spec.ty() {
            ExternType::Func(sig) => sig.clone(),
            other => {
                return Err(LoadError::MalformedImage(format!(
                    "export `{}` is a {}, not a function",
                    name,
                    other.kind()
                ))
                .into());
            }
        };
        let symbol = format!("{}{}", GUEST_FUNC_PREFIX, name);
        let func = unsafe {
            self.lib
                .get::<extern "C" fn()>(symbol.as_bytes())
                .map_err(|e| {
                    LoadError::MalformedImage(format!(
                        "export `{}` has no function symbol `{}`: {}",
                        name, symbol, e
                    ))
                })?
        };
        Ok(FunctionHandle {
            ptr: FunctionPointer::from_usize(*func as usize),
            sig,
        })
    }

    fn get_start_func(&self) -> Result<Option<FunctionHandle>, Error> {
        // `guest_start` holds a pointer to the function the image designates
        // as the start routine, since we can't have multiple symbols pointing
        // to the same function and guest code might call it in the normal
        // course of execution
        if let Ok(start_func) = unsafe {
            self.lib
                .get::<*const extern "C" fn()>(GUEST_START_SYM.as_bytes())
        } {
            if start_func.is_null() {
                return Err(LoadError::MalformedImage(format!(
                    "`{}` is defined but null",
                    GUEST_START_SYM
                ))
                .into());
            }
            Ok(Some(FunctionHandle {
                ptr: FunctionPointer::from_usize(unsafe { **start_func } as usize),
                sig: start_signature(),
            }))
        } else {
            Ok(None)
        }
    }
}

/// An image's code sections only run on the architecture they were compiled
/// for; the manifest carries the target tag so this is caught at load time
/// rather than at the first call.
fn check_arch(module_data: &ModuleData, host: &str) -> Result<(), Error> {
    if module_data.arch() != host {
        return Err(LoadError::ArchitectureMismatch {
            image: module_data.arch().to_owned(),
            host: host.to_owned(),
        }
        .into());
    }
    Ok(())
}

/// Read the image's table segment from the `guest_table_0` and
/// `guest_table_0_len` symbols, if it has one.
unsafe fn read_table_segment(lib: &Library) -> Result<Vec<FunctionPointer>, Error> {
    let p_table = match lib.get::<*const usize>(b"guest_table_0") {
        Ok(sym) => sym,
        Err(_) => return Ok(vec![]),
    };
    let p_table_len = lib.get::<usize>(b"guest_table_0_len").map_err(|e| {
        LoadError::MalformedImage(format!(
            "`guest_table_0` is defined but `guest_table_0_len` is not: {}",
            e
        ))
    })?;
    let len = *p_table_len;
    if len > u32::max_value() as usize {
        return Err(LoadError::MalformedImage(format!("table segment too long: {}", len)).into());
    }
    Ok(slice::from_raw_parts(*p_table, len)
        .iter()
        .map(|addr| FunctionPointer::from_usize(*addr))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vessel_module::HeapSpec;

    fn module_data_for(arch: &str) -> ModuleData {
        ModuleData::new(arch.to_owned(), HeapSpec::empty(), vec![], vec![], vec![])
    }

    #[test]
    fn matching_arch_accepted() {
        assert!(check_arch(&module_data_for("x86_64"), "x86_64").is_ok());
    }

    #[test]
    fn foreign_arch_rejected() {
        match check_arch(&module_data_for("aarch64"), "x86_64") {
            Err(Error::Load(LoadError::ArchitectureMismatch { image, host })) => {
                assert_eq!(image, "aarch64");
                assert_eq!(host, "x86_64");
            }
            other => panic!("expected architecture mismatch, got {:?}", other),
        }
    }
}
