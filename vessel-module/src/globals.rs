use serde::{Deserialize, Serialize};

/// A global variable definition, with its initial value and the export name
/// under which it is visible to hosts, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSpec {
    init_val: i64,
    export: Option<String>,
}

impl GlobalSpec {
    pub fn new(init_val: i64, export: Option<String>) -> Self {
        Self { init_val, export }
    }

    pub fn init_val(&self) -> i64 {
        self.init_val
    }

    pub fn export(&self) -> Option<&str> {
        self.export.as_deref()
    }
}
