//! Host-supplied capability environments.

use crate::error::{EnvError, Error};
use crate::externs::FunctionHandle;
use crate::hostcalls;
use crate::instance::InstanceToken;
use std::ffi::CString;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Builder for a new [`CapabilityEnv`].
pub struct CapabilityEnvBuilder {
    args: Vec<CString>,
}

impl CapabilityEnvBuilder {
    pub fn new() -> Self {
        CapabilityEnvBuilder { args: vec![] }
    }

    /// Append an argument to the list exposed to the guest as if it were a
    /// process invocation argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args
            .push(CString::new(arg).expect("argument can be converted to a CString"));
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    pub fn build(self) -> Arc<CapabilityEnv> {
        Arc::new(CapabilityEnv {
            state: Mutex::new(EnvState {
                args: self.args,
                bound: None,
            }),
        })
    }
}

impl Default for CapabilityEnvBuilder {
    fn default() -> Self {
        CapabilityEnvBuilder::new()
    }
}

struct EnvState {
    args: Vec<CString>,
    bound: Option<InstanceToken>,
}

/// Process-scoped host configuration backing a module's imports.
///
/// Holds the argument list visible to the synthesized argv capability, and a
/// non-owning token for the instance most recently built against this
/// environment. The environment's lifetime is independent of any instance's;
/// the token never keeps an instance alive.
///
/// There is no internal serialization beyond what keeps the state
/// structurally sound: callers that share an environment across threads must
/// serialize builds and invocations against it (see the crate docs).
pub struct CapabilityEnv {
    state: Mutex<EnvState>,
}

impl CapabilityEnv {
    pub fn builder() -> CapabilityEnvBuilder {
        CapabilityEnvBuilder::new()
    }

    /// Append an argument after construction.
    ///
    /// Fails with [`EnvError::AlreadyBound`] once an instance has been bound;
    /// the bound guest may have observed the argument list already, so late
    /// mutation is rejected rather than silently ignored.
    pub fn push_arg(&self, arg: &str) -> Result<(), Error> {
        let arg = CString::new(arg)
            .map_err(|_| Error::InvalidArgument("argument contains an interior NUL byte"))?;
        let mut state = self.state();
        if state.bound.is_some() {
            return Err(EnvError::AlreadyBound.into());
        }
        state.args.push(arg);
        Ok(())
    }

    /// The environment binds to at most one instance at a time; rebinding
    /// replaces the previous token, never merges.
    pub(crate) fn bind_instance(&self, token: InstanceToken) {
        let prev = self.state().bound.replace(token);
        tracing::debug!(
            token = token.as_u64(),
            replaced = prev.is_some(),
            "bound instance to environment"
        );
    }

    pub fn bound_instance(&self) -> Option<InstanceToken> {
        self.state().bound
    }

    pub fn args(&self) -> Vec<CString> {
        self.state().args.clone()
    }

    /// The capabilities this environment synthesizes for import resolution:
    /// the minimal argv surface, keyed by `(module, field)`.
    pub fn import_table(&self) -> Vec<(&'static str, &'static str, FunctionHandle)> {
        hostcalls::synthesized_imports()
    }

    fn state(&self) -> MutexGuard<EnvState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
