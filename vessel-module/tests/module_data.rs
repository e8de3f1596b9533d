use vessel_module::{
    signature, Error, ExportSpec, ExternType, GlobalSpec, HeapSpec, ImportSpec, MemorySpec,
    ModuleData,
};

fn test_module_data() -> ModuleData {
    ModuleData::new(
        std::env::consts::ARCH.to_owned(),
        HeapSpec::new(64 * 1024, Some(4 * 64 * 1024)),
        vec![GlobalSpec::new(17, Some("counter".to_owned()))],
        vec![ImportSpec::new(
            "env",
            "args_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        )],
        vec![
            ExportSpec::new("run", ExternType::Func(signature!(() -> I64))),
            ExportSpec::new(
                "memory",
                ExternType::Memory(MemorySpec {
                    initial_pages: 1,
                    max_pages: Some(4),
                }),
            ),
        ],
    )
}

#[test]
fn module_data_round_trip() {
    let module_data = test_module_data();
    let serialized = module_data.serialize().expect("serialization succeeds");
    let deserialized = ModuleData::deserialize(&serialized).expect("deserialization succeeds");
    assert_eq!(module_data, deserialized);

    assert_eq!(deserialized.imports().len(), 1);
    assert_eq!(deserialized.imports()[0].symbol(), "env.args_get");
    assert!(deserialized.get_export("run").is_some());
    assert!(deserialized.get_export("missing").is_none());
}

#[test]
fn bad_magic_rejected() {
    let mut serialized = test_module_data().serialize().expect("serialization succeeds");
    serialized[0] = b'X';
    match ModuleData::deserialize(&serialized) {
        Err(Error::BadMagic) => (),
        res => panic!("unexpected result: {:?}", res.map(|_| ())),
    }
}

#[test]
fn truncated_image_rejected() {
    let serialized = test_module_data().serialize().expect("serialization succeeds");
    // cut into the bincode payload, past the header
    assert!(ModuleData::deserialize(&serialized[..20]).is_err());
    // shorter than the magic itself
    assert!(ModuleData::deserialize(&serialized[..4]).is_err());
}

#[test]
fn garbage_rejected() {
    assert!(ModuleData::deserialize(&[0xffu8; 64]).is_err());
}
