use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io;

/// VersionInfo is information about a module image that lets the runtime
/// determine if or how the image can be loaded. The information here
/// describes implementation details in runtime support for compiled modules,
/// and nothing higher level.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    major: u16,
    minor: u16,
    patch: u16,
    // `reserved` doubles as a validity tag: a serialized header produced by a
    // conforming compiler always carries 0x8000 here, so headers from other
    // producers fail the `valid` check instead of being misread.
    reserved: u16,
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl VersionInfo {
    pub fn new(major: u16, minor: u16, patch: u16) -> VersionInfo {
        VersionInfo {
            major,
            minor,
            patch,
            reserved: 0x8000,
        }
    }

    /// A more permissive version check than for version equality. This check
    /// will allow an `other` version that differs in patch level, but not in
    /// major or minor version.
    pub fn compatible_with(&self, other: &VersionInfo) -> bool {
        if !(self.valid() && other.valid()) {
            return false;
        }

        self.major == other.major && self.minor == other.minor
    }

    pub fn write_to<W: WriteBytesExt>(&self, w: &mut W) -> io::Result<()> {
        w.write_u16::<LittleEndian>(self.major)?;
        w.write_u16::<LittleEndian>(self.minor)?;
        w.write_u16::<LittleEndian>(self.patch)?;
        w.write_u16::<LittleEndian>(self.reserved)
    }

    pub fn read_from<R: ReadBytesExt>(r: &mut R) -> io::Result<Self> {
        Ok(VersionInfo {
            major: r.read_u16::<LittleEndian>()?,
            minor: r.read_u16::<LittleEndian>()?,
            patch: r.read_u16::<LittleEndian>()?,
            reserved: r.read_u16::<LittleEndian>()?,
        })
    }

    pub fn valid(&self) -> bool {
        self.reserved == 0x8000
    }

    pub fn current() -> Self {
        VersionInfo::new(
            env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap(),
            env!("CARGO_PKG_VERSION_MINOR").parse().unwrap(),
            env!("CARGO_PKG_VERSION_PATCH").parse().unwrap(),
        )
    }
}
