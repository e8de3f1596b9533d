//! Typed values for passing into and returning from sandboxed programs.

use std::fmt;
use vessel_module::ValueType;

/// Typed values used for passing arguments into guest entry points, and for
/// reading return values from completed calls.
#[derive(Clone, Copy, Debug)]
pub enum Val {
    /// A guest linear memory address.
    GuestPtr(u32),
    U32(u32),
    U64(u64),
    I32(i32),
    I64(i64),
    Bool(bool),
    F32(f32),
    F64(f64),
}

macro_rules! impl_from_scalars {
    ( { $( $ctor:ident : $ty:ty ),* } ) => {
        $(
            impl From<$ty> for Val {
                fn from(x: $ty) -> Val {
                    Val::$ctor(x)
                }
            }
        )*
    };
}

impl_from_scalars!({
    U32: u32,
    U64: u64,
    I32: i32,
    I64: i64,
    Bool: bool,
    F32: f32,
    F64: f64
});

impl Val {
    /// The declared-signature type this value checks against.
    ///
    /// Guest pointers and booleans travel as `i32` at the boundary.
    pub fn value_type(&self) -> ValueType {
        match self {
            Val::GuestPtr(_) | Val::U32(_) | Val::I32(_) | Val::Bool(_) => ValueType::I32,
            Val::U64(_) | Val::I64(_) => ValueType::I64,
            Val::F32(_) => ValueType::F32,
            Val::F64(_) => ValueType::F64,
        }
    }

    /// Convert a `Val` to its representation in an argument slot.
    ///
    /// Every value crosses the sandbox boundary as a 64-bit slot; floats
    /// travel by bit pattern.
    pub fn to_slot(&self) -> u64 {
        match *self {
            Val::GuestPtr(v) => v as u64,
            Val::U32(v) => v as u64,
            Val::U64(v) => v,
            Val::I32(v) => v as u32 as u64,
            Val::I64(v) => v as u64,
            Val::Bool(false) => 0u64,
            Val::Bool(true) => 1u64,
            Val::F32(v) => v.to_bits() as u64,
            Val::F64(v) => v.to_bits(),
        }
    }
}

/// An untyped value returned by guest function calls.
///
/// Integer-class results live in `gp`, floating point results in `fp`; which
/// one is populated follows the entry point's declared return type. Convert
/// with the `From` impls for the concrete type the signature declares.
#[derive(Clone, Copy, Debug, Default)]
pub struct UntypedRetVal {
    fp: u64,
    gp: u64,
}

impl fmt::Display for UntypedRetVal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<untyped return value>")
    }
}

impl UntypedRetVal {
    pub(crate) fn from_gp(gp: u64) -> UntypedRetVal {
        UntypedRetVal { fp: 0, gp }
    }

    pub(crate) fn from_fp(fp: u64) -> UntypedRetVal {
        UntypedRetVal { fp, gp: 0 }
    }

    pub fn gp(&self) -> u64 {
        self.gp
    }

    pub fn fp(&self) -> u64 {
        self.fp
    }
}

macro_rules! impl_from_gp {
    ( $ty:ty ) => {
        impl From<UntypedRetVal> for $ty {
            fn from(retval: UntypedRetVal) -> $ty {
                retval.gp as $ty
            }
        }

        impl From<&UntypedRetVal> for $ty {
            fn from(retval: &UntypedRetVal) -> $ty {
                retval.gp as $ty
            }
        }
    };
}

impl_from_gp!(u8);
impl_from_gp!(u16);
impl_from_gp!(u32);
impl_from_gp!(u64);

impl_from_gp!(i8);
impl_from_gp!(i16);
impl_from_gp!(i32);
impl_from_gp!(i64);

impl From<UntypedRetVal> for bool {
    fn from(retval: UntypedRetVal) -> bool {
        retval.gp != 0
    }
}

impl From<&UntypedRetVal> for bool {
    fn from(retval: &UntypedRetVal) -> bool {
        retval.gp != 0
    }
}

impl From<UntypedRetVal> for f32 {
    fn from(retval: UntypedRetVal) -> f32 {
        f32::from_bits(retval.fp as u32)
    }
}

impl From<&UntypedRetVal> for f32 {
    fn from(retval: &UntypedRetVal) -> f32 {
        f32::from_bits(retval.fp as u32)
    }
}

impl From<UntypedRetVal> for f64 {
    fn from(retval: UntypedRetVal) -> f64 {
        f64::from_bits(retval.fp)
    }
}

impl From<&UntypedRetVal> for f64 {
    fn from(retval: &UntypedRetVal) -> f64 {
        f64::from_bits(retval.fp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_round_trips_preserve_bits() {
        assert_eq!(Val::I32(-1).to_slot(), 0xffff_ffff);
        assert_eq!(Val::I64(-1).to_slot(), u64::max_value());
        assert_eq!(Val::F64(1.5).to_slot(), 1.5f64.to_bits());
        assert_eq!(Val::Bool(true).to_slot(), 1);
        assert_eq!(Val::GuestPtr(0xdead).to_slot(), 0xdead);
    }

    #[test]
    fn value_types() {
        assert_eq!(Val::GuestPtr(0).value_type(), ValueType::I32);
        assert_eq!(Val::U64(0).value_type(), ValueType::I64);
        assert_eq!(Val::F32(0.0).value_type(), ValueType::F32);
    }

    #[test]
    fn retval_conversions() {
        assert_eq!(i64::from(UntypedRetVal::from_gp(u64::max_value())), -1i64);
        assert_eq!(f64::from(UntypedRetVal::from_fp(2.5f64.to_bits())), 2.5);
        assert!(bool::from(UntypedRetVal::from_gp(1)));
    }
}
