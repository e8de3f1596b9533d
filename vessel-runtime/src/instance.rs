//! Instances: live execution states built from a module image and a
//! capability environment.

use crate::alloc::Heap;
use crate::env::CapabilityEnv;
use crate::error::{Error, InstantiationError, InvocationError};
use crate::externs::{ExternValue, FunctionHandle, GlobalValue, MemoryHandle, TableHandle};
use crate::module::ModuleImage;
use crate::trampoline;
use crate::trap::TrapReason;
use crate::val::{UntypedRetVal, Val};
use crate::vmctx::VmContext;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use vessel_module::{ExternType, FunctionPointer};

static NEXT_INSTANCE_TOKEN: AtomicU64 = AtomicU64::new(1);

/// A non-owning identifier for an instance.
///
/// Tokens are unique for the life of the process and are never reused, so a
/// token held after its instance is dropped simply dangles; it cannot be
/// used to reach the instance's memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceToken(u64);

impl InstanceToken {
    fn next() -> InstanceToken {
        InstanceToken(NEXT_INSTANCE_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// The run state of an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Ready to begin or resume making calls.
    Ready,

    /// A call is in progress.
    Running,

    /// A guest call trapped. The instance stays faulted; further invocations
    /// are rejected rather than run against state of unknown integrity.
    Faulted { reason: TrapReason },
}

impl State {
    pub fn is_ready(&self) -> bool {
        *self == State::Ready
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, State::Faulted { .. })
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            State::Ready => write!(f, "ready"),
            State::Running => write!(f, "running"),
            State::Faulted { reason } => write!(f, "faulted ({})", reason),
        }
    }
}

/// An owning handle to an instance.
///
/// The instance lives in a stable heap allocation so that the vmctx
/// back-pointer guest code sees stays valid as the handle moves around.
pub struct InstanceHandle {
    inst: Box<Instance>,
}

impl Deref for InstanceHandle {
    type Target = Instance;
    fn deref(&self) -> &Instance {
        &self.inst
    }
}

impl DerefMut for InstanceHandle {
    fn deref_mut(&mut self) -> &mut Instance {
        &mut self.inst
    }
}

/// Release ownership of an instance across the FFI boundary.
///
/// The pointer must eventually be returned to
/// [`instance_handle_from_raw`] or the instance leaks.
pub fn instance_handle_to_raw(handle: InstanceHandle) -> *mut Instance {
    Box::into_raw(handle.inst)
}

/// Reconstitute an owning handle from a raw instance pointer.
///
/// # Safety
///
/// `ptr` must have come from [`instance_handle_to_raw`] and must not be used
/// again afterwards.
pub unsafe fn instance_handle_from_raw(ptr: *mut Instance) -> InstanceHandle {
    InstanceHandle {
        inst: Box::from_raw(ptr),
    }
}

/// Build a live instance from an image, a resolved import vector, and a
/// capability environment.
///
/// The import vector must correspond index for index to the image's import
/// manifest; [`resolve_imports()`](crate::resolver::resolve_imports)
/// produces exactly that shape, and the correspondence is rechecked here.
///
/// If the image designates a start routine it runs before this returns. A
/// trap during start means no instance: the error carries the trap reason
/// and no handle is produced. Only after start succeeds is the instance
/// bound to the environment.
pub fn new_instance_handle(
    module: Arc<dyn ModuleImage>,
    resolved_imports: Vec<ExternValue>,
    env: Arc<CapabilityEnv>,
) -> Result<InstanceHandle, Error> {
    validate_import_vector(&*module, &resolved_imports)?;

    let heap = Heap::new(module.heap_spec())?;
    let globals: Vec<i64> = module.globals().iter().map(|g| g.init_val()).collect();
    let table: Vec<FunctionPointer> = module.table_elements().to_vec();
    let import_funcs: Vec<usize> = resolved_imports
        .iter()
        .map(|value| match value {
            ExternValue::Func(f) => f.ptr.as_usize(),
            _ => 0,
        })
        .collect();

    let mut exports = HashMap::new();
    for spec in module.exports() {
        let value = match spec.ty() {
            ExternType::Func(_) => ExternValue::Func(module.get_export_func(spec.name())?),
            ExternType::Memory(mem) => ExternValue::Memory(MemoryHandle {
                initial_pages: mem.initial_pages,
                max_pages: mem.max_pages,
            }),
            ExternType::Global(_) => {
                let init_val = module
                    .globals()
                    .iter()
                    .find(|g| g.export() == Some(spec.name()))
                    .map(|g| g.init_val())
                    .unwrap_or(0);
                ExternValue::Global(GlobalValue { value: init_val })
            }
            ExternType::Table(_) => ExternValue::Table(TableHandle {
                elements: table.len() as u32,
            }),
        };
        exports.insert(spec.name().to_owned(), value);
    }

    let token = InstanceToken::next();
    let inst = Box::new(Instance {
        token,
        module,
        env: env.clone(),
        heap,
        globals,
        table,
        import_funcs,
        exports,
        state: State::Ready,
        trap: None,
        vmctx: Box::new(VmContext::unlinked()),
    });

    let mut handle = InstanceHandle { inst };
    handle.refresh_vmctx();

    if let Some(start) = handle.module.get_start_func()? {
        tracing::debug!(token = token.as_u64(), "running start routine");
        match handle.run_func(start, &[]) {
            Ok(_) => {}
            Err(Error::Invocation(InvocationError::Trap(reason))) => {
                return Err(InstantiationError::StartTrap(reason).into());
            }
            Err(e) => return Err(e),
        }
    }

    env.bind_instance(token);
    tracing::debug!(token = token.as_u64(), "instantiated module image");
    Ok(handle)
}

fn validate_import_vector(module: &dyn ModuleImage, imports: &[ExternValue]) -> Result<(), Error> {
    let specs = module.imports();
    if specs.len() != imports.len() {
        return Err(InstantiationError::ImportMismatch(format!(
            "manifest declares {} imports, vector supplies {}",
            specs.len(),
            imports.len()
        ))
        .into());
    }
    for (spec, value) in specs.iter().zip(imports.iter()) {
        if spec.ty().kind() != value.kind() {
            return Err(InstantiationError::ImportMismatch(format!(
                "import `{}` requires a {}, vector supplies a {}",
                spec.symbol(),
                spec.ty().kind(),
                value.kind()
            ))
            .into());
        }
        if let (ExternType::Func(required), ExternValue::Func(supplied)) = (spec.ty(), value) {
            if *required != supplied.sig {
                return Err(InstantiationError::ImportMismatch(format!(
                    "import `{}` requires signature {}, vector supplies {}",
                    spec.symbol(),
                    required,
                    supplied.sig
                ))
                .into());
            }
        }
    }
    Ok(())
}

/// A single instantiation of a module image.
pub struct Instance {
    token: InstanceToken,
    module: Arc<dyn ModuleImage>,
    env: Arc<CapabilityEnv>,
    heap: Heap,
    globals: Vec<i64>,
    table: Vec<FunctionPointer>,
    import_funcs: Vec<usize>,
    exports: HashMap<String, ExternValue>,
    state: State,

    /// Trap pending against the current call, if any. Set by guest code via
    /// the vmctx, consumed by `run_func` when control returns.
    trap: Option<TrapReason>,

    /// Boxed separately so its address is stable under moves of the
    /// `Instance` fields around it.
    vmctx: Box<VmContext>,
}

impl Instance {
    /// Invoke an exported function by name.
    ///
    /// Arguments are checked against the export's declared signature before
    /// any guest code runs; a mismatch leaves the instance `Ready`. A trap
    /// during the call faults the instance permanently.
    pub fn run(&mut self, entrypoint: &str, args: &[Val]) -> Result<UntypedRetVal, Error> {
        match self.state {
            State::Running => return Err(InvocationError::AlreadyRunning.into()),
            State::Faulted { .. } => return Err(InvocationError::PoisonedInstance.into()),
            State::Ready => {}
        }
        let func = match self.exports.get(entrypoint) {
            Some(ExternValue::Func(f)) => f.clone(),
            Some(other) => {
                return Err(InvocationError::SignatureMismatch(format!(
                    "export `{}` is a {}, not a function",
                    entrypoint,
                    other.kind()
                ))
                .into());
            }
            None => return Err(InvocationError::NoSuchExport(entrypoint.to_owned()).into()),
        };
        tracing::debug!(%entrypoint, "invoking export");
        self.run_func(func, args)
    }

    pub(crate) fn run_func(
        &mut self,
        func: FunctionHandle,
        args: &[Val],
    ) -> Result<UntypedRetVal, Error> {
        trampoline::check_signature(&func.sig, args)?;
        self.refresh_vmctx();
        self.state = State::Running;
        self.trap = None;
        let vmctx_ptr: *mut VmContext = &mut *self.vmctx;
        let retval = match unsafe { trampoline::invoke(vmctx_ptr, func.ptr, &func.sig, args) } {
            Ok(retval) => retval,
            Err(e) => {
                // nothing crossed the boundary; the instance is intact
                self.state = State::Ready;
                return Err(e);
            }
        };
        if let Some(reason) = self.trap.take() {
            self.state = State::Faulted { reason };
            tracing::warn!(%reason, "guest call trapped");
            return Err(InvocationError::Trap(reason).into());
        }
        self.state = State::Ready;
        Ok(retval)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn token(&self) -> InstanceToken {
        self.token
    }

    pub fn heap(&self) -> &[u8] {
        self.heap.as_slice()
    }

    pub fn heap_mut(&mut self) -> &mut [u8] {
        self.heap.as_mut_slice()
    }

    pub fn heap_size_pages(&self) -> u32 {
        self.heap.size_pages()
    }

    /// Grow the linear memory, returning the previous size in pages.
    pub fn grow_memory(&mut self, additional_pages: u32) -> Result<u32, Error> {
        let old_pages = self.heap.grow(additional_pages)?;
        self.refresh_vmctx();
        Ok(old_pages)
    }

    pub fn global(&self, idx: usize) -> Option<i64> {
        self.globals.get(idx).copied()
    }

    pub fn set_global(&mut self, idx: usize, value: i64) -> bool {
        match self.globals.get_mut(idx) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn get_export(&self, name: &str) -> Option<&ExternValue> {
        self.exports.get(name)
    }

    /// Function references in the instance's table segment.
    pub fn table_elements(&self) -> &[FunctionPointer] {
        &self.table
    }

    pub(crate) fn env(&self) -> &Arc<CapabilityEnv> {
        &self.env
    }

    pub(crate) fn import_func(&self, idx: usize) -> Option<FunctionPointer> {
        self.import_funcs
            .get(idx)
            .map(|addr| FunctionPointer::from_usize(*addr))
    }

    /// Keep the first trap of a call; later raises during unwinding of the
    /// same call do not overwrite the root cause.
    pub(crate) fn record_trap(&mut self, reason: TrapReason) {
        if self.trap.is_none() {
            self.trap = Some(reason);
        }
    }

    /// Re-derive the guest-visible context from current field addresses.
    /// Must run before every entry into guest code; the heap vector may have
    /// reallocated since the last call.
    fn refresh_vmctx(&mut self) {
        let inst_ptr: *mut Instance = self;
        self.vmctx.heap_ptr = self.heap.base_ptr();
        self.vmctx.heap_len = self.heap.size() as u64;
        self.vmctx.globals_ptr = self.globals.as_mut_ptr();
        self.vmctx.globals_len = self.globals.len() as u64;
        self.vmctx.imports_ptr = self.import_funcs.as_ptr();
        self.vmctx.imports_len = self.import_funcs.len() as u64;
        self.vmctx.instance = inst_ptr;
    }
}
