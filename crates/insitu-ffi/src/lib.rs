//! C ABI for simulation codes embedding the insitu bridge.
//!
//! Mirrors the `libyt.h` calling convention: every protocol operation
//! returns [`YT_SUCCESS`] or [`YT_FAIL`]. The reason for the most recent
//! failure on the calling thread is available from [`yt_last_error`], and
//! the message of a caught panic from [`yt_last_panic_message`].
//!
//! This is the only crate in the workspace besides `insitu-python` that
//! contains `unsafe` code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::ffi::c_char;

/// Run an FFI body, converting a panic into [`YT_FAIL`].
///
/// The panic message is kept for [`yt_last_panic_message`] and the last
/// error is set to [`YtErrorCode::Panicked`].
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(status) => status,
            Err(payload) => {
                $crate::record_panic(payload.as_ref());
                $crate::status::YT_FAIL
            }
        }
    };
}

/// Lock a mutex inside a function returning `Result<_, FfiError>`.
///
/// A poisoned lock means an earlier call panicked while holding it.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        $mutex
            .lock()
            .map_err(|_| $crate::runtime::FfiError::Poisoned)?
    };
}

mod derive;
mod runtime;
mod status;
mod types;

pub use runtime::{
    yt_commit_particles, yt_finalize, yt_free_gridsPtr, yt_get_particlesPtr, yt_init,
    yt_set_parameter,
};
pub use status::{YtErrorCode, YT_FAIL, YT_SUCCESS};
pub use types::{
    YtAttribute, YtAttributeGetter, YtDerivedFunc, YtField, YtGrid, YtParamLibyt, YtParamYt,
    YtParticle,
};

thread_local! {
    static LAST_PANIC: RefCell<String> = const { RefCell::new(String::new()) };
    static LAST_ERROR: Cell<YtErrorCode> = const { Cell::new(YtErrorCode::None) };
}

pub(crate) fn record_panic(payload: &(dyn std::any::Any + Send)) {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %msg, "panic caught at the C boundary");
    LAST_PANIC.with(|cell| *cell.borrow_mut() = msg);
    set_last_error(YtErrorCode::Panicked);
}

pub(crate) fn set_last_error(code: YtErrorCode) {
    LAST_ERROR.with(|cell| cell.set(code));
}

/// Reason for the most recent failure on this thread, as a
/// [`YtErrorCode`] value. `0` if nothing has failed.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn yt_last_error() -> i32 {
    LAST_ERROR.with(|cell| cell.get()) as i32
}

/// Copy the most recent panic message on this thread into `buf`.
///
/// Writes at most `cap - 1` bytes plus a NUL terminator and returns the
/// full message length. Pass a null `buf` to query the length.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn yt_last_panic_message(buf: *mut c_char, cap: usize) -> i32 {
    LAST_PANIC.with(|cell| {
        let msg = cell.borrow();
        let bytes = msg.as_bytes();
        if !buf.is_null() && cap > 0 {
            let n = bytes.len().min(cap - 1);
            // SAFETY: caller guarantees `buf` points to `cap` writable bytes.
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), n);
                *buf.add(n) = 0;
            }
        }
        i32::try_from(bytes.len()).unwrap_or(i32::MAX)
    })
}
