//! Import resolution against capability environments.

use vessel_module::{signature, ExternKind, ExternType, ImportSpec, MemorySpec};
use vessel_runtime::{
    resolve_imports, CapabilityEnvBuilder, Error, ExternValue, MockModuleBuilder, ResolutionError,
};

#[test]
fn empty_manifest_resolves_to_empty_vector() {
    let module = MockModuleBuilder::new().build();
    let env = CapabilityEnvBuilder::new().build();
    let resolved = resolve_imports(module.as_ref(), &env).expect("resolution succeeds");
    assert!(resolved.is_empty());
}

#[test]
fn argv_imports_resolve_in_manifest_order() {
    let module = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "args_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        ))
        .with_import(ImportSpec::new(
            "env",
            "args_sizes_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        ))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    let resolved = resolve_imports(module.as_ref(), &env).expect("resolution succeeds");
    assert_eq!(resolved.len(), 2);

    // entry i corresponds to manifest entry i, regardless of the order the
    // environment offers capabilities in
    let offered = env.import_table();
    let args_get = offered
        .iter()
        .find(|(_, f, _)| *f == "args_get")
        .map(|(_, _, h)| h.clone())
        .expect("env offers args_get");
    assert_eq!(resolved[0], ExternValue::Func(args_get));
}

#[test]
fn single_argv_import_resolves_to_single_binding() {
    let module = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "args_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        ))
        .build();
    let env = CapabilityEnvBuilder::new().args(&["--eval", "1+1"]).build();
    let resolved = resolve_imports(module.as_ref(), &env).expect("resolution succeeds");
    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].as_func().is_some());
}

#[test]
fn unknown_import_is_rejected() {
    let module = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "clock_time_get",
            ExternType::Func(signature!((I32) -> I32)),
        ))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    match resolve_imports(module.as_ref(), &env) {
        Err(Error::Resolution(ResolutionError::UnknownImport(sym))) => {
            assert_eq!(sym, "env.clock_time_get")
        }
        other => panic!("expected unknown import, got {:?}", other),
    }
}

#[test]
fn signature_mismatch_is_rejected() {
    let module = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "args_get",
            ExternType::Func(signature!((I64, I64) -> I64)),
        ))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    match resolve_imports(module.as_ref(), &env) {
        Err(Error::Resolution(ResolutionError::SignatureMismatch { import, .. })) => {
            assert_eq!(import, "env.args_get")
        }
        other => panic!("expected signature mismatch, got {:?}", other),
    }
}

#[test]
fn kind_mismatch_is_rejected() {
    let module = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "args_get",
            ExternType::Memory(MemorySpec {
                initial_pages: 1,
                max_pages: None,
            }),
        ))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    match resolve_imports(module.as_ref(), &env) {
        Err(Error::Resolution(ResolutionError::KindMismatch {
            import,
            required,
            offered,
        })) => {
            assert_eq!(import, "env.args_get");
            assert_eq!(required, ExternKind::Memory);
            assert_eq!(offered, ExternKind::Func);
        }
        other => panic!("expected kind mismatch, got {:?}", other),
    }
}

#[test]
fn resolution_is_all_or_nothing() {
    // first import resolves, second does not; no partial vector escapes
    let module = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "args_sizes_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        ))
        .with_import(ImportSpec::new(
            "env",
            "random_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        ))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    assert!(resolve_imports(module.as_ref(), &env).is_err());
    // the module and environment both survive a failed resolution
    let fixed = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "args_sizes_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        ))
        .build();
    assert!(resolve_imports(fixed.as_ref(), &env).is_ok());
}
