//! Moving tag maps and picture bytes across the native boundary.
//!
//! Inbound, the bridge reports values one at a time through [`tag_put`] and
//! [`picture_put`], which copy the data into the [`registry`](crate::registry)
//! slot for the session. Outbound, a [`TagMap`] is flattened into parallel
//! C string arrays, each field's values packed with [`TAG_SEPARATOR`].

use std::collections::BTreeMap;
use std::ffi::{CStr, CString, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::{Error, Result};
use crate::registry::{self, SessionId};

/// Field name to values. Several values per field are kept in order.
pub type TagMap = BTreeMap<String, Vec<String>>;

/// Packs several values of one field into a single native string.
///
/// Vertical tab never occurs in ordinary tag text. The bridge splits on the
/// same character (`AUDIOTAGS_VALUE_SEPARATOR`).
pub const TAG_SEPARATOR: char = '\u{000B}';

pub fn join_values<S: AsRef<str>>(values: &[S]) -> String {
    let mut out = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(TAG_SEPARATOR);
        }
        out.push_str(v.as_ref());
    }
    out
}

pub fn split_values(packed: &str) -> Vec<String> {
    if packed.is_empty() {
        return Vec::new();
    }
    packed.split(TAG_SEPARATOR).map(str::to_owned).collect()
}

/// Convert `text` for the boundary, rejecting NUL and the value separator.
pub fn boundary_string(text: &str) -> Result<CString> {
    if text.contains(TAG_SEPARATOR) {
        return Err(Error::InvalidText(text.to_owned()));
    }
    CString::new(text).map_err(|_| Error::InvalidText(text.to_owned()))
}

/// Field name and packed value, both ready for the boundary.
pub fn pack_field<S: AsRef<str>>(field: &str, values: &[S]) -> Result<(CString, CString)> {
    let name = boundary_string(field)?;
    for v in values {
        boundary_string(v.as_ref())?;
    }
    let packed = join_values(values);
    // Checked per value above.
    let packed = CString::new(packed).map_err(|_| Error::InvalidText(field.to_owned()))?;
    Ok((name, packed))
}

/// Flatten `map` into parallel field/value arrays.
pub fn pack_tags(map: &TagMap) -> Result<(Vec<CString>, Vec<CString>)> {
    let mut fields = Vec::with_capacity(map.len());
    let mut values = Vec::with_capacity(map.len());
    for (field, vals) in map {
        let (f, v) = pack_field(field, vals)?;
        fields.push(f);
        values.push(v);
    }
    Ok((fields, values))
}

/// Copy a possibly-null C string into an owned `String`.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string valid for the call.
unsafe fn owned_text(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller's contract.
    let text = unsafe { CStr::from_ptr(ptr) };
    Some(text.to_string_lossy().into_owned())
}

/// Tag sink passed to `audiotags_file_properties`.
///
/// Field names arrive in whatever case the container uses; they are
/// lower-cased so lookups do not depend on the file format.
///
/// # Safety
///
/// `key` and `value` must each be null or a NUL-terminated string that stays
/// valid until this function returns.
pub unsafe extern "C" fn tag_put(session: u64, key: *const c_char, value: *const c_char) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: forwarded from this function's contract.
        let (Some(key), Some(value)) = (unsafe { owned_text(key) }, unsafe { owned_text(value) })
        else {
            log::debug!("session #{session}: null tag pointer from native side, dropped");
            return;
        };
        registry::global().append_tag(SessionId::from(session), key.to_lowercase(), value);
    }));
}

/// Picture sink passed to `audiotags_read_picture`.
///
/// # Safety
///
/// `data` must be null or point to `size` readable bytes that stay valid until
/// this function returns.
pub unsafe extern "C" fn picture_put(session: u64, data: *const c_char, size: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let bytes = if data.is_null() || size == 0 {
            Vec::new()
        } else {
            // SAFETY: `size` readable bytes at `data` per this function's contract.
            unsafe { std::slice::from_raw_parts(data as *const u8, size) }.to_vec()
        };
        registry::global().put_picture(SessionId::from(session), bytes);
    }));
}
