//! Instance building: import vector validation, start routines, and
//! environment binding.

use vessel_module::{signature, ExternType, FunctionPointer, GlobalSpec, ImportSpec};
use vessel_runtime::vmctx::VmContext;
use vessel_runtime::{
    new_instance_handle, resolve_imports, CapabilityEnvBuilder, Error, ExternValue,
    FunctionHandle, InstantiationError, MockModuleBuilder, TrapReason, Vmctx,
};

extern "C" fn guest_start_init(vmctx: *mut VmContext) -> u64 {
    let vmctx = unsafe { Vmctx::from_raw(vmctx) };
    vmctx.set_global(0, 7);
    0
}

extern "C" fn guest_start_trap(vmctx: *mut VmContext) -> u64 {
    let vmctx = unsafe { Vmctx::from_raw(vmctx) };
    vmctx.raise_trap(TrapReason::Abort(3));
    0
}

extern "C" fn guest_noop(_vmctx: *mut VmContext) -> u64 {
    0
}

#[test]
fn start_routine_runs_before_handle_exists() {
    let module = MockModuleBuilder::new()
        .with_global(GlobalSpec::new(0, Some("initialized".to_owned())))
        .with_start_func(FunctionPointer::from_usize(guest_start_init as usize))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    let inst = new_instance_handle(module, vec![], env).expect("instance builds");
    assert_eq!(inst.global(0), Some(7));
}

#[test]
fn start_trap_discards_the_instance() {
    let module = MockModuleBuilder::new()
        .with_start_func(FunctionPointer::from_usize(guest_start_trap as usize))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    match new_instance_handle(module, vec![], env.clone()) {
        Err(e @ Error::Instantiation(InstantiationError::StartTrap(TrapReason::Abort(3)))) => {
            assert!(e.to_string().contains("start routine trapped"))
        }
        other => panic!("expected start trap, got {:?}", other.map(|_| ())),
    }
    // the failed attempt never bound the environment
    assert!(env.bound_instance().is_none());
}

#[test]
fn instance_binds_environment() {
    let module = MockModuleBuilder::new().build();
    let env = CapabilityEnvBuilder::new().arg("prog").build();
    let inst = new_instance_handle(module, vec![], env.clone()).expect("instance builds");
    assert_eq!(env.bound_instance(), Some(inst.token()));

    // the argument list is frozen once a guest may have observed it
    match env.push_arg("--late") {
        Err(Error::Env(_)) => {}
        other => panic!("expected already-bound rejection, got {:?}", other),
    }
}

#[test]
fn rebinding_replaces_the_previous_token() {
    let env = CapabilityEnvBuilder::new().build();
    let first = new_instance_handle(MockModuleBuilder::new().build(), vec![], env.clone())
        .expect("first instance builds");
    let second = new_instance_handle(MockModuleBuilder::new().build(), vec![], env.clone())
        .expect("second instance builds");
    assert_ne!(first.token(), second.token());
    assert_eq!(env.bound_instance(), Some(second.token()));
}

#[test]
fn import_vector_arity_is_checked() {
    let module = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "args_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        ))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    match new_instance_handle(module, vec![], env) {
        Err(Error::Instantiation(InstantiationError::ImportMismatch(_))) => {}
        other => panic!("expected import mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn import_vector_signatures_are_checked() {
    let module = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "args_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        ))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    let bogus = ExternValue::Func(FunctionHandle {
        ptr: FunctionPointer::from_usize(guest_noop as usize),
        sig: signature!(() -> ()),
    });
    match new_instance_handle(module, vec![bogus], env) {
        Err(Error::Instantiation(InstantiationError::ImportMismatch(_))) => {}
        other => panic!("expected import mismatch, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn resolver_output_instantiates_directly() {
    let module = MockModuleBuilder::new()
        .with_import(ImportSpec::new(
            "env",
            "args_sizes_get",
            ExternType::Func(signature!((I32, I32) -> I32)),
        ))
        .build();
    let env = CapabilityEnvBuilder::new().build();
    let imports = resolve_imports(module.as_ref(), &env).expect("resolution succeeds");
    assert!(new_instance_handle(module, imports, env).is_ok());
}
