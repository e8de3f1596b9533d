use serde::{Deserialize, Serialize};

/// Linear memory configuration for a module image.
///
/// Sizes are in bytes and must be multiples of the guest page size. The
/// initial size is accessible as soon as an instance is built; the region may
/// grow up to `max_size` if one is declared, and without bound otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapSpec {
    /// Total bytes of memory for the guest program's linear memory, on
    /// initialization.
    pub initial_size: u64,
    /// Total bytes of memory the linear memory may ever occupy. The program
    /// may optionally declare this value; if it does, `initial_size` must not
    /// exceed it.
    pub max_size: Option<u64>,
}

impl HeapSpec {
    pub fn new(initial_size: u64, max_size: Option<u64>) -> Self {
        Self {
            initial_size,
            max_size,
        }
    }

    /// Some very small test programs dont specify a memory definition.
    pub fn empty() -> Self {
        Self {
            initial_size: 0,
            max_size: None,
        }
    }
}
