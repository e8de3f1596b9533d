//! Object image loading error paths.
//!
//! Success paths need a compiled image on disk and are exercised by the mock
//! module in the other suites; these tests cover the loader's validation of
//! paths and file contents.

use std::io::Write;
use vessel_runtime::{DlModule, Error, LoadError};

#[test]
fn missing_image_is_not_found() {
    match DlModule::load("/nonexistent/image.so") {
        Err(Error::Load(LoadError::NotFound(path))) => {
            assert!(path.contains("image.so"))
        }
        other => panic!("expected not found, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn garbage_file_is_malformed() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile created");
    file.write_all(b"this is not an object file")
        .expect("write succeeds");
    file.flush().expect("flush succeeds");
    match DlModule::load(file.path()) {
        Err(Error::Load(LoadError::MalformedImage(_))) => {}
        other => panic!("expected malformed image, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn directory_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir created");
    assert!(DlModule::load(dir.path()).is_err());
}
