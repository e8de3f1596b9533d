use crate::error::{Error, LoadError};
use crate::externs::FunctionHandle;
use crate::module::{start_signature, ModuleImage, ModuleImageInternal};
use std::collections::HashMap;
use std::sync::Arc;
use vessel_module::{
    ExportSpec, ExternType, FunctionPointer, GlobalSpec, HeapSpec, ImportSpec, MemorySpec,
    Signature,
};

/// A mock module image built from host function pointers.
///
/// This lets the full load-resolve-instantiate-invoke pipeline run without a
/// compiled object on disk: "guest" functions are ordinary `extern "C"`
/// functions in the embedding program that follow the guest calling
/// convention (vmctx first, then 64-bit value slots).
pub struct MockModuleBuilder {
    heap_spec: HeapSpec,
    globals: Vec<GlobalSpec>,
    imports: Vec<ImportSpec>,
    exports: Vec<ExportSpec>,
    export_funcs: HashMap<String, FunctionPointer>,
    table_elements: Vec<FunctionPointer>,
    start_func: Option<FunctionPointer>,
}

impl MockModuleBuilder {
    pub fn new() -> Self {
        MockModuleBuilder {
            heap_spec: HeapSpec::empty(),
            globals: vec![],
            imports: vec![],
            exports: vec![],
            export_funcs: HashMap::new(),
            table_elements: vec![],
            start_func: None,
        }
    }

    pub fn with_heap_spec(mut self, heap_spec: HeapSpec) -> Self {
        self.heap_spec = heap_spec;
        self
    }

    pub fn with_global(mut self, global: GlobalSpec) -> Self {
        if let Some(name) = global.export() {
            self.exports
                .push(ExportSpec::new(name, ExternType::Global(
                    vessel_module::ValueType::I64,
                )));
        }
        self.globals.push(global);
        self
    }

    pub fn with_import(mut self, import: ImportSpec) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_export_func(mut self, name: &str, sig: Signature, func: FunctionPointer) -> Self {
        self.exports
            .push(ExportSpec::new(name, ExternType::Func(sig)));
        self.export_funcs.insert(name.to_owned(), func);
        self
    }

    /// Expose the instance's linear memory under `name`. Call after
    /// `with_heap_spec`; the exported limits are computed from the current
    /// heap spec.
    pub fn with_exported_memory(mut self, name: &str) -> Self {
        let page = u64::from(crate::WASM_PAGE_SIZE);
        self.exports.push(ExportSpec::new(
            name,
            ExternType::Memory(MemorySpec {
                initial_pages: (self.heap_spec.initial_size / page) as u32,
                max_pages: self.heap_spec.max_size.map(|m| (m / page) as u32),
            }),
        ));
        self
    }

    pub fn with_table_func(mut self, func: FunctionPointer) -> Self {
        self.table_elements.push(func);
        self
    }

    pub fn with_start_func(mut self, func: FunctionPointer) -> Self {
        self.start_func = Some(func);
        self
    }

    pub fn build(self) -> Arc<dyn ModuleImage> {
        Arc::new(MockModule {
            heap_spec: self.heap_spec,
            globals: self.globals,
            imports: self.imports,
            exports: self.exports,
            export_funcs: self.export_funcs,
            table_elements: self.table_elements,
            start_func: self.start_func,
        })
    }
}

impl Default for MockModuleBuilder {
    fn default() -> Self {
        MockModuleBuilder::new()
    }
}

pub struct MockModule {
    heap_spec: HeapSpec,
    globals: Vec<GlobalSpec>,
    imports: Vec<ImportSpec>,
    exports: Vec<ExportSpec>,
    export_funcs: HashMap<String, FunctionPointer>,
    table_elements: Vec<FunctionPointer>,
    start_func: Option<FunctionPointer>,
}

impl ModuleImage for MockModule {}

impl ModuleImageInternal for MockModule {
    fn heap_spec(&self) -> &HeapSpec {
        &self.heap_spec
    }

    fn globals(&self) -> &[GlobalSpec] {
        &self.globals
    }

    fn imports(&self) -> &[ImportSpec] {
        &self.imports
    }

    fn exports(&self) -> &[ExportSpec] {
        &self.exports
    }

    fn table_elements(&self) -> &[FunctionPointer] {
        &self.table_elements
    }

    fn get_export_func(&self, name: &str) -> Result<FunctionHandle, Error> {
        let sig = match self.get_export(name).map(|e| e.ty()) {
            Some(ExternType::Func(sig)) => sig.clone(),
            Some(other) => {
                return Err(LoadError::MalformedImage(format!(
                    "export `{}` is a {}, not a function",
                    name,
                    other.kind()
                ))
                .into());
            }
            None => {
                return Err(
                    LoadError::MalformedImage(format!("no export named `{}`", name)).into(),
                );
            }
        };
        let ptr = self.export_funcs.get(name).cloned().ok_or_else(|| {
            LoadError::MalformedImage(format!("export `{}` has no function pointer", name))
        })?;
        Ok(FunctionHandle { ptr, sig })
    }

    fn get_start_func(&self) -> Result<Option<FunctionHandle>, Error> {
        Ok(self.start_func.map(|ptr| FunctionHandle {
            ptr,
            sig: start_signature(),
        }))
    }
}
