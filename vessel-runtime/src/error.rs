use crate::trap::TrapReason;
use anyhow::Error as AnyError;
use thiserror::Error;
use vessel_module::{ExternKind, Signature};

/// Vessel runtime errors.
///
/// Every operation that can fail returns one of these; no operation signals
/// failure out of band. A failed resolve or instantiate leaves all prior
/// state untouched: the module image and capability environment remain valid
/// and reusable for a retry with corrected inputs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {}", _0)]
    InvalidArgument(&'static str),

    /// An object image could not be loaded.
    #[error("Load error: {}", _0)]
    Load(#[from] LoadError),

    /// An import declared by a module image could not be resolved.
    #[error("Resolution error: {}", _0)]
    Resolution(#[from] ResolutionError),

    /// An instance could not be built from a module image and its resolved
    /// imports.
    #[error("Instantiation error: {}", _0)]
    Instantiation(#[from] InstantiationError),

    /// An entry point could not be invoked, or faulted while running.
    #[error("Invocation error: {}", _0)]
    Invocation(#[from] InvocationError),

    /// A capability environment was misused.
    #[error("Environment error: {}", _0)]
    Env(#[from] EnvError),

    /// A catch-all for internal errors that are likely unrecoverable by the
    /// runtime user.
    #[error("Internal error: {}", _0)]
    InternalError(#[source] AnyError),
}

impl From<vessel_module::Error> for Error {
    fn from(e: vessel_module::Error) -> Error {
        Error::Load(LoadError::MalformedImage(e.to_string()))
    }
}

/// Errors found while loading and validating an object image. No guest code
/// has run when one of these is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("image not found: {}", _0)]
    NotFound(String),

    #[error("malformed image: {}", _0)]
    MalformedImage(String),

    #[error("architecture mismatch: image is for `{}`, host is `{}`", image, host)]
    ArchitectureMismatch { image: String, host: String },
}

/// Errors found while matching a module's import manifest against a
/// capability environment. The resolver never partially succeeds; when one
/// of these is returned, no import vector exists and no instance may be
/// built.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("unknown import: `{}`", _0)]
    UnknownImport(String),

    #[error(
        "kind mismatch for `{}`: module requires a {}, capability is a {}",
        import,
        required,
        offered
    )]
    KindMismatch {
        import: String,
        required: ExternKind,
        offered: ExternKind,
    },

    #[error(
        "signature mismatch for `{}`: module requires {}, capability is {}",
        import,
        required,
        offered
    )]
    SignatureMismatch {
        import: String,
        required: Signature,
        offered: Signature,
    },
}

/// Errors found while building an instance.
#[derive(Debug, Error)]
pub enum InstantiationError {
    /// The resolved import vector does not line up with the image's import
    /// manifest, in arity or per-slot type.
    #[error("import vector mismatch: {}", _0)]
    ImportMismatch(String),

    #[error("memory limit exceeded: {}", _0)]
    MemoryLimitExceeded(String),

    /// The start routine faulted; the instantiation attempt is discarded and
    /// no instance handle is exposed.
    #[error("start routine trapped: {}", _0)]
    StartTrap(TrapReason),
}

/// Errors surfacing from an attempted entry point invocation.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("no such export: `{}`", _0)]
    NoSuchExport(String),

    #[error("signature mismatch: {}", _0)]
    SignatureMismatch(String),

    /// The guest faulted while running. The instance transitions to the
    /// faulted state and subsequent invocations fail with
    /// `PoisonedInstance`.
    #[error("guest trapped: {}", _0)]
    Trap(TrapReason),

    #[error("instance poisoned by an earlier fault")]
    PoisonedInstance,

    #[error("instance is already running")]
    AlreadyRunning,
}

/// Capability environment misuse.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("environment is already bound to an instance")]
    AlreadyBound,
}
