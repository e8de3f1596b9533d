use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValueType::I32 => write!(f, "i32"),
            ValueType::I64 => write!(f, "i64"),
            ValueType::F32 => write!(f, "f32"),
            ValueType::F64 => write!(f, "f64"),
        }
    }
}

/// A signature for a guest function.
///
/// Note that this does not explicitly name the vmctx pointer as a parameter!
/// It is assumed that all guest functions take vmctx as their first parameter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ValueType>,
    // In the future, guest functions may be permitted multiple return values
    pub ret_ty: Option<ValueType>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ")")?;
        match self.ret_ty {
            Some(ty) => write!(f, " -> {}", ty),
            None => Ok(()),
        }
    }
}

#[macro_export]
macro_rules! signature {
    (() -> ()) => {
        $crate::Signature { params: vec![], ret_ty: None }
    };
    (($($param:ident),*) -> ()) => {
        $crate::Signature {
            params: vec![$($crate::ValueType::$param),*],
            ret_ty: None,
        }
    };
    (($($param:ident),*) -> $ret:ident) => {
        $crate::Signature {
            params: vec![$($crate::ValueType::$param),*],
            ret_ty: Some($crate::ValueType::$ret),
        }
    };
}
