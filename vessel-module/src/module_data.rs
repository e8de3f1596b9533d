use crate::error::Error;
use crate::externs::{ExportSpec, ImportSpec};
use crate::globals::GlobalSpec;
use crate::linear_memory::HeapSpec;
use crate::version_info::VersionInfo;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Symbol under which the serialized [`ModuleData`] is defined in a compiled
/// object image.
pub const MODULE_DATA_SYM: &str = "vessel_module_data";

/// Symbol for the byte length of the serialized [`ModuleData`].
pub const MODULE_DATA_LEN_SYM: &str = "vessel_module_data_len";

/// Magic bytes at the head of a serialized [`ModuleData`] blob, preceding the
/// [`VersionInfo`] header.
pub const MODULE_DATA_MAGIC: &[u8; 8] = b"vesselmd";

/// The metadata manifest of a compiled module image.
///
/// This is the deserialized contents of the `vessel_module_data` section of
/// an image: the linear memory and global specifications, plus the ordered
/// import and export manifests. It is immutable once produced, and never
/// causes guest code to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleData {
    arch: String,
    heap_spec: HeapSpec,
    globals_spec: Vec<GlobalSpec>,
    imports: Vec<ImportSpec>,
    exports: Vec<ExportSpec>,
}

impl ModuleData {
    pub fn new(
        arch: String,
        heap_spec: HeapSpec,
        globals_spec: Vec<GlobalSpec>,
        imports: Vec<ImportSpec>,
        exports: Vec<ExportSpec>,
    ) -> Self {
        Self {
            arch,
            heap_spec,
            globals_spec,
            imports,
            exports,
        }
    }

    /// The target architecture the image's code sections were compiled for,
    /// as a `std::env::consts::ARCH`-style tag.
    pub fn arch(&self) -> &str {
        &self.arch
    }

    pub fn heap_spec(&self) -> &HeapSpec {
        &self.heap_spec
    }

    pub fn globals_spec(&self) -> &[GlobalSpec] {
        &self.globals_spec
    }

    pub fn imports(&self) -> &[ImportSpec] {
        &self.imports
    }

    pub fn exports(&self) -> &[ExportSpec] {
        &self.exports
    }

    pub fn get_export(&self, name: &str) -> Option<&ExportSpec> {
        self.exports.iter().find(|e| e.name() == name)
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MODULE_DATA_MAGIC);
        VersionInfo::current().write_to(&mut buf)?;
        bincode::serialize_into(&mut buf, self).map_err(Error::SerializationError)?;
        Ok(buf)
    }

    pub fn deserialize(buf: &[u8]) -> Result<ModuleData, Error> {
        if buf.len() < MODULE_DATA_MAGIC.len() || &buf[..MODULE_DATA_MAGIC.len()] != MODULE_DATA_MAGIC
        {
            return Err(Error::BadMagic);
        }
        let mut header = Cursor::new(&buf[MODULE_DATA_MAGIC.len()..]);
        let version = VersionInfo::read_from(&mut header)?;
        let current = VersionInfo::current();
        if !version.compatible_with(&current) {
            return Err(Error::IncompatibleVersion(version, current));
        }
        let payload = &buf[MODULE_DATA_MAGIC.len() + header.position() as usize..];
        bincode::deserialize(payload).map_err(Error::DeserializationError)
    }
}
