use std::fmt;

/// The reason a guest execution aborted.
///
/// Traps at this layer are cooperative: guest code and hostcall shims raise
/// them through [`Vmctx::raise_trap`](../vmctx/struct.Vmctx.html), and the
/// trampoline surfaces any pending trap once control returns to the host.
/// Hardware fault translation (signal handling) belongs to a layer above
/// this one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrapReason {
    /// A guest memory access fell outside the instance's linear memory.
    HeapOutOfBounds,
    /// An integer division faulted (division by zero or overflow).
    IntegerDivByZero,
    /// The guest executed an unreachable instruction.
    Unreachable,
    /// The guest aborted explicitly with the given code.
    Abort(u32),
    /// A fault with no more specific classification.
    Unknown,
}

impl fmt::Display for TrapReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrapReason::HeapOutOfBounds => write!(f, "heap out of bounds"),
            TrapReason::IntegerDivByZero => write!(f, "integer division by zero"),
            TrapReason::Unreachable => write!(f, "unreachable instruction executed"),
            TrapReason::Abort(code) => write!(f, "guest abort with code {}", code),
            TrapReason::Unknown => write!(f, "unknown fault"),
        }
    }
}
