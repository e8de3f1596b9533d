use crate::version_info::VersionInfo;
use thiserror::Error;

/// Module data (de)serialization errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Deserialization error")]
    DeserializationError(#[source] bincode::Error),
    #[error("Serialization error")]
    SerializationError(#[source] bincode::Error),
    #[error("I/O error")]
    IOError(#[from] std::io::Error),
    #[error("Image does not begin with the module data magic")]
    BadMagic,
    #[error("Incompatible module data version {0}, host supports {1}")]
    IncompatibleVersion(VersionInfo, VersionInfo),
}
