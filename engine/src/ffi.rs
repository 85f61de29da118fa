//! FFI layer for mobile hosts.
//!
//! This module provides C-compatible functions that can be called from
//! Kotlin (JNI/JNA), Swift or Dart. Snapshots cross the boundary in the
//! line format understood by [`RecordCodec`], results come back as JSON.
//!
//! # Memory Management
//!
//! - Strings returned by `taskmerge_*` functions are allocated by Rust
//! - Caller must free them with `taskmerge_string_free`
//!
//! # Error Handling
//!
//! Functions return JSON with either:
//! - `{"ok": <result>}` on success
//! - `{"error": "<message>"}` on failure

use crate::{KeyDecision, MergeEngine, RecordCodec, SkippedLine};
use serde::Serialize;
use std::ffi::{c_char, CStr, CString};

/// Result wrapper for FFI responses.
#[derive(Serialize)]
#[serde(untagged)]
enum FfiResult<T: Serialize> {
    Ok { ok: T },
    Err { error: String },
}

impl<T: Serialize> FfiResult<T> {
    fn ok(value: T) -> Self {
        FfiResult::Ok { ok: value }
    }

    fn err(message: impl Into<String>) -> Self {
        FfiResult::Err {
            error: message.into(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }
}

/// Lines dropped from each input while parsing.
#[derive(Serialize)]
struct SkippedByInput {
    base: Vec<SkippedLine>,
    local: Vec<SkippedLine>,
    remote: Vec<SkippedLine>,
}

/// Payload of a successful `taskmerge_resolve`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveResponse {
    /// Resolved collection in the line format
    content: String,
    decisions: Vec<KeyDecision>,
    skipped: SkippedByInput,
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `taskmerge_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => {
            // String contained null bytes - return error JSON
            CString::new(r#"{"error":"string contained null bytes"}"#)
                .unwrap_or_default()
                .into_raw()
        }
    }
}

/// Borrow the bytes of a C string. Returns None if the pointer is null.
unsafe fn c_bytes<'a>(ptr: *const c_char) -> Option<&'a [u8]> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_bytes())
}

// ============================================================================
// Merge
// ============================================================================

/// Resolve a three-way conflict.
///
/// # Arguments
/// - `base`: common ancestor, in the line format
/// - `local`: client state, in the line format
/// - `remote`: backend state, in the line format
///
/// # Returns
/// JSON string: `{"ok": {"content": ..., "decisions": [...], "skipped": {...}}}`
/// or `{"error": "message"}`
///
/// # Safety
/// - Each argument must be a valid null-terminated C string or null
/// - Caller must free the returned string with `taskmerge_string_free`
#[no_mangle]
pub unsafe extern "C" fn taskmerge_resolve(
    base: *const c_char,
    local: *const c_char,
    remote: *const c_char,
) -> *mut c_char {
    let (base, local, remote) = match (c_bytes(base), c_bytes(local), c_bytes(remote)) {
        (Some(b), Some(l), Some(r)) => (b, l, r),
        _ => return to_c_string(FfiResult::<()>::err("null snapshot pointer").to_json()),
    };

    let base = RecordCodec::parse_bytes(base);
    let local = RecordCodec::parse_bytes(local);
    let remote = RecordCodec::parse_bytes(remote);

    let outcome =
        MergeEngine::resolve_with_report(&base.collection, &local.collection, &remote.collection);

    let response = ResolveResponse {
        content: RecordCodec::format_to_string(&outcome.resolved),
        decisions: outcome.report.decisions,
        skipped: SkippedByInput {
            base: base.skipped,
            local: local.skipped,
            remote: remote.skipped,
        },
    };
    to_c_string(FfiResult::ok(response).to_json())
}

/// Free a string allocated by the engine.
///
/// # Safety
/// - `s` must be a valid pointer from a `taskmerge_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn taskmerge_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Engine version. The returned pointer is static and must not be freed.
#[no_mangle]
pub extern "C" fn taskmerge_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}
