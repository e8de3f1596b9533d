use std::io::Cursor;
use vessel_module::VersionInfo;

#[test]
fn version_round_trip() {
    let version = VersionInfo::new(1, 2, 3);
    let mut buf = Vec::new();
    version.write_to(&mut buf).expect("version serializes");
    assert_eq!(buf.len(), 8);

    let read = VersionInfo::read_from(&mut Cursor::new(&buf)).expect("version deserializes");
    assert_eq!(version, read);
    assert!(read.valid());
}

#[test]
fn version_compatibility() {
    let version = VersionInfo::new(1, 2, 3);
    assert!(version.compatible_with(&VersionInfo::new(1, 2, 3)));
    assert!(version.compatible_with(&VersionInfo::new(1, 2, 4)));
    assert!(!version.compatible_with(&VersionInfo::new(1, 3, 3)));
    assert!(!version.compatible_with(&VersionInfo::new(2, 2, 3)));
}

#[test]
fn invalid_reserved_tag_rejected() {
    // a header of all zeroes does not carry the validity tag
    let read = VersionInfo::read_from(&mut Cursor::new(&[0u8; 8])).expect("eight bytes parse");
    assert!(!read.valid());
    assert!(!VersionInfo::current().compatible_with(&read));
}
