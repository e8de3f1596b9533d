//! The C embedding surface, exercised from Rust the way a C driver would
//! call it.
//!
//! The last-error slot is process-wide, so every assertion about its
//! contents lives in a single test function; the other tests only assert on
//! return tags.

use std::ffi::CStr;
use std::ptr;
use vessel_runtime::c_api::*;
use vessel_runtime::CapabilityEnv;

#[test]
fn last_error_protocol() {
    // nothing recorded yet in this fresh slot check is impossible to
    // guarantee across tests, so start by forcing a known failure
    let mut module_out = ptr::null_mut();
    let tag = unsafe {
        vessel_dl_module_load(
            b"/nonexistent/image.so\0".as_ptr() as *const _,
            &mut module_out,
        )
    };
    assert!(matches!(tag, vessel_error::Load));

    let len = vessel_last_error_length();
    assert!(len > 0);

    // a too-small buffer fails without consuming the message
    let mut small = [0u8; 1];
    let copied =
        unsafe { vessel_last_error_message(small.as_mut_ptr() as *mut _, small.len() as i32) };
    assert_eq!(copied, -1);
    assert_eq!(vessel_last_error_length(), len);

    let mut buf = vec![0u8; len as usize];
    let copied = unsafe { vessel_last_error_message(buf.as_mut_ptr() as *mut _, len) };
    assert_eq!(copied, len);
    let msg = CStr::from_bytes_with_nul(&buf).expect("message is NUL-terminated");
    let msg = msg.to_str().expect("message is UTF-8");
    assert!(msg.contains("image.so"), "unexpected message: {}", msg);

    // the message persists until the next failure overwrites it
    let copied = unsafe { vessel_last_error_message(buf.as_mut_ptr() as *mut _, len) };
    assert_eq!(copied, len);

    // and the next failure does overwrite it
    let tag = unsafe {
        vessel_dl_module_load(
            b"/also/missing/other.so\0".as_ptr() as *const _,
            &mut module_out,
        )
    };
    assert!(matches!(tag, vessel_error::Load));
    let len = vessel_last_error_length();
    let mut buf = vec![0u8; len as usize];
    let copied = unsafe { vessel_last_error_message(buf.as_mut_ptr() as *mut _, len) };
    assert_eq!(copied, len);
    let msg = CStr::from_bytes_with_nul(&buf).expect("message is NUL-terminated");
    assert!(msg.to_str().expect("message is UTF-8").contains("other.so"));

    let mut env_out = ptr::null_mut();
    let tag = unsafe { vessel_env_new(&mut env_out) };
    assert!(matches!(tag, vessel_error::Ok));
    let tag = unsafe { vessel_env_arg(env_out, ptr::null()) };
    assert!(matches!(tag, vessel_error::InvalidArgument));
    unsafe { vessel_env_release(env_out) };
}

#[test]
fn null_out_parameters_are_rejected() {
    let tag = unsafe {
        vessel_dl_module_load(b"/nonexistent/image.so\0".as_ptr() as *const _, ptr::null_mut())
    };
    assert!(matches!(tag, vessel_error::InvalidArgument));
    let tag = unsafe { vessel_env_new(ptr::null_mut()) };
    assert!(matches!(tag, vessel_error::InvalidArgument));
}

#[test]
fn env_arguments_flow_through_the_handle() {
    let mut env_out = ptr::null_mut();
    let tag = unsafe { vessel_env_new(&mut env_out) };
    assert!(matches!(tag, vessel_error::Ok));
    let tag = unsafe { vessel_env_arg(env_out, b"--eval\0".as_ptr() as *const _) };
    assert!(matches!(tag, vessel_error::Ok));

    // peek through the FFI handle at the underlying environment
    let env = unsafe { &*(env_out as *const CapabilityEnv) };
    let args = env.args();
    assert_eq!(args.len(), 1);
    assert_eq!(args[0].to_str().expect("arg is UTF-8"), "--eval");

    unsafe { vessel_env_release(env_out) };
}

#[test]
fn error_names_are_stable() {
    let name = unsafe { CStr::from_ptr(vessel_error_name(vessel_error::Ok as i32)) };
    assert_eq!(name.to_str().expect("name is UTF-8"), "vessel_error_ok");
    let name = unsafe { CStr::from_ptr(vessel_error_name(vessel_error::RuntimeFault as i32)) };
    assert_eq!(
        name.to_str().expect("name is UTF-8"),
        "vessel_error_runtime_fault"
    );
    let name = unsafe { CStr::from_ptr(vessel_error_name(10_000)) };
    assert!(name.to_str().expect("name is UTF-8").starts_with("!!!"));
}
