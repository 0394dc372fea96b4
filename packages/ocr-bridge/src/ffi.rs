//! C ABI exported to the host application. See `include/ocr_bridge.h`.
//!
//! Nothing here unwinds into the caller: every failure, panics included,
//! comes back as a serialized error record or a non-zero status.
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

use crate::bridge::OcrBridge;
use crate::codec::{serialize_or_fallback, FALLBACK_ERROR};
use crate::config::EngineConfig;
use crate::logging::init_logging;
use crate::record::OcrResult;

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return s.to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}

/// Borrows a NUL-terminated UTF-8 string from the caller.
///
/// # Safety
/// `ptr` must be null or point to a valid NUL-terminated string that stays
/// alive for `'a`.
unsafe fn borrow_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err(format!("{what} is null"));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| format!("{what} is not valid UTF-8: {e}"))
}

fn into_raw_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(c) => c.into_raw(),
        Err(_) => CString::new(FALLBACK_ERROR)
            .map(CString::into_raw)
            .unwrap_or(std::ptr::null_mut()),
    }
}

/// Shared body of [`process_image`], parameterized over the bridge.
///
/// # Safety
/// Same contract as [`process_image`].
pub(crate) unsafe fn process_image_with(
    bridge: &OcrBridge,
    image_path: *const c_char,
    min_confidence: f32,
) -> *mut c_char {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        unsafe { borrow_str(image_path, "image path") }
            .map(|path| bridge.process_image(path, min_confidence))
    }));

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(msg)) => OcrResult::error(format!("Bridge error: {msg}")),
        Err(payload) => {
            let msg = panic_payload_to_string(&*payload);
            error!(panic = %msg, "OCR call panicked");
            OcrResult::error(format!("Bridge error: {msg}"))
        }
    };
    into_raw_string(serialize_or_fallback(&result))
}

/// Runs OCR on the image at `image_path` and returns the serialized result.
///
/// The returned string must be released with [`ocr_bridge_free_string`].
///
/// # Safety
/// `image_path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn process_image(
    image_path: *const c_char,
    min_confidence: f32,
) -> *mut c_char {
    process_image_with(OcrBridge::global(), image_path, min_confidence)
}

/// Shared body of [`ocr_bridge_init`], parameterized over the bridge.
///
/// # Safety
/// Same contract as [`ocr_bridge_init`].
pub(crate) unsafe fn init_with(bridge: &OcrBridge, model_dir: *const c_char) -> c_int {
    let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<(), String> {
        if !model_dir.is_null() {
            let dir = unsafe { borrow_str(model_dir, "model directory") }?;
            bridge
                .configure(EngineConfig::from_env().with_model_dir(dir))
                .map_err(|e| e.to_string())?;
        }
        bridge.engine().map(|_| ()).map_err(|e| e.to_string())
    }));

    match outcome {
        Ok(Ok(())) => 0,
        Ok(Err(msg)) => {
            error!(error = %msg, "OCR bridge initialization failed");
            -1
        }
        Err(payload) => {
            error!(
                panic = %panic_payload_to_string(&*payload),
                "OCR bridge initialization panicked"
            );
            -1
        }
    }
}

/// Eagerly builds the engine, optionally from models in `model_dir`.
///
/// Returns `0` once the engine is ready and `-1` otherwise; the failure is
/// logged and a later `process_image` call retries construction. Once the
/// engine exists, a `model_dir` naming different models is refused.
///
/// # Safety
/// `model_dir` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ocr_bridge_init(model_dir: *const c_char) -> c_int {
    init_logging();
    init_with(OcrBridge::global(), model_dir)
}

/// Releases a string returned by this library. Null is ignored.
///
/// # Safety
/// `ptr` must be null or a pointer previously returned by this library and
/// not yet freed.
#[no_mangle]
pub unsafe extern "C" fn ocr_bridge_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Library version, e.g. `"1.0.0"`. Free with [`ocr_bridge_free_string`].
#[no_mangle]
pub extern "C" fn ocr_bridge_version() -> *mut c_char {
    into_raw_string(env!("CARGO_PKG_VERSION").to_string())
}
