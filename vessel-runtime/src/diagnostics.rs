//! The process-wide diagnostics channel backing the C ABI's last-error
//! protocol.
//!
//! The channel holds at most one message. Each recorded failure overwrites
//! whatever was there before; successful operations leave it untouched, so a
//! caller that skips a check still reads the most recent failure rather than
//! stale emptiness being confused for one.
//!
//! Only the C API writes here. The Rust API reports failures through
//! [`Error`](crate::error::Error) values and never touches this slot, so
//! embedders using the Rust surface pay nothing for it.

use crate::error::Error;
use lazy_static::lazy_static;
use std::ffi::CString;
use std::sync::{Mutex, MutexGuard, PoisonError};

lazy_static! {
    static ref LAST_ERROR: Mutex<Option<CString>> = Mutex::new(None);
}

fn slot() -> MutexGuard<'static, Option<CString>> {
    LAST_ERROR.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn record_failure(err: &Error) {
    record_message(&err.to_string());
}

pub fn record_message(msg: &str) {
    // Interior NULs cannot appear in our own messages, but don't let a
    // hostile one panic the diagnostics path.
    let msg = CString::new(msg.replace('\0', "?")).unwrap_or_default();
    *slot() = Some(msg);
}

/// Byte length of the pending message, including its NUL terminator, or 0 if
/// none is pending.
pub fn last_error_length() -> usize {
    slot()
        .as_ref()
        .map(|msg| msg.as_bytes_with_nul().len())
        .unwrap_or(0)
}

/// Copy the pending message, NUL included, into `buf`.
///
/// Returns the number of bytes copied; 0 when no message is pending. Fails
/// when `buf` is smaller than the value [`last_error_length`] reported,
/// leaving both the buffer and the pending message untouched.
pub fn copy_last_error(buf: &mut [u8]) -> Result<usize, ()> {
    let slot = slot();
    let msg = match slot.as_ref() {
        Some(msg) => msg.as_bytes_with_nul(),
        None => return Ok(0),
    };
    if buf.len() < msg.len() {
        return Err(());
    }
    buf[..msg.len()].copy_from_slice(msg);
    Ok(msg.len())
}
