//! The native boundary: one method per bridge entry point.
//!
//! [`NativeFile`] forwards to TagLib through `audiotags-sys`. [`File`] is
//! generic over [`RawFile`] so the session protocol can be exercised against
//! an instrumented stand-in.
//!
//! [`File`]: crate::File

use std::ffi::{CStr, CString, c_char};
use std::path::Path;

use crate::error::{Error, Result};
use crate::file::AudioProperties;

/// Receives `(session, key, value)` once per tag value.
pub type TagSink = unsafe extern "C" fn(session: u64, key: *const c_char, value: *const c_char);

/// Receives `(session, data, size)` for the embedded picture.
pub type PictureSink = unsafe extern "C" fn(session: u64, data: *const c_char, size: usize);

/// An open native file.
///
/// Implementations call the sinks synchronously, before returning, any number
/// of times. Pointers passed to a sink are valid only during that sink call.
pub trait RawFile {
    /// Report every tag value of the file to `sink`, tagged with `session`.
    fn enumerate_tags(&self, session: u64, sink: TagSink);

    /// Remove all textual tags and save.
    fn clear_tags(&mut self) -> bool;

    /// Replace one field with the separator-packed `value` and save.
    fn write_tag(&mut self, field: &CStr, value: &CStr) -> bool;

    /// Replace each `fields[i]` with the packed `values[i]` and save.
    fn write_tags(&mut self, fields: &[CString], values: &[CString]) -> bool;

    /// `None` when the engine found no audio stream.
    fn audio_properties(&self) -> Option<AudioProperties>;

    /// Report the embedded picture to `sink`, tagged with `session`.
    /// Returns whether a picture was found.
    fn read_picture(&self, session: u64, sink: PictureSink) -> bool;

    fn write_picture(&mut self, data: &[u8], width: i32, height: i32, mime: &CStr) -> bool;

    fn remove_pictures(&mut self) -> bool;

    /// Release the native resource.
    fn close(self);
}

/// A file handle owned by the TagLib bridge.
pub struct NativeFile {
    handle: *mut audiotags_sys::AudiotagsFile,
    // Memory-backed files keep their source bytes for the handle's lifetime.
    _data: Option<Vec<u8>>,
}

// SAFETY: the native handle is not tied to the thread that opened it. It is
// not Sync; concurrent access goes through `&mut File`.
unsafe impl Send for NativeFile {}

impl NativeFile {
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let c_path = path_to_cstring(path).ok_or_else(|| Error::BadFile(display.clone()))?;
        // SAFETY: c_path is a valid NUL-terminated string for the call.
        let handle = unsafe { audiotags_sys::audiotags_file_new(c_path.as_ptr()) };
        if handle.is_null() {
            return Err(Error::BadFile(display));
        }
        Ok(Self {
            handle,
            _data: None,
        })
    }

    pub fn open_bytes(data: Vec<u8>) -> Result<Self> {
        // SAFETY: data.as_ptr() has data.len() readable bytes; the buffer is
        // kept alive alongside the handle.
        let handle = unsafe {
            audiotags_sys::audiotags_file_memory(data.as_ptr() as *const c_char, data.len())
        };
        if handle.is_null() {
            return Err(Error::BadFile(format!("<memory: {} bytes>", data.len())));
        }
        Ok(Self {
            handle,
            _data: Some(data),
        })
    }
}

impl RawFile for NativeFile {
    fn enumerate_tags(&self, session: u64, sink: TagSink) {
        // SAFETY: handle is live until close/drop.
        unsafe { audiotags_sys::audiotags_file_properties(self.handle, session, Some(sink)) }
    }

    fn clear_tags(&mut self) -> bool {
        // SAFETY: handle is live until close/drop.
        unsafe { audiotags_sys::audiotags_clear_properties(self.handle) }
    }

    fn write_tag(&mut self, field: &CStr, value: &CStr) -> bool {
        // SAFETY: handle is live; both strings are NUL-terminated for the call.
        unsafe {
            audiotags_sys::audiotags_write_property(self.handle, field.as_ptr(), value.as_ptr())
        }
    }

    fn write_tags(&mut self, fields: &[CString], values: &[CString]) -> bool {
        debug_assert_eq!(fields.len(), values.len());
        let len = fields.len().min(values.len());
        let field_ptrs: Vec<*const c_char> = fields[..len].iter().map(|s| s.as_ptr()).collect();
        let value_ptrs: Vec<*const c_char> = values[..len].iter().map(|s| s.as_ptr()).collect();
        // SAFETY: both pointer arrays have `len` entries pointing into CStrings
        // that outlive the call.
        unsafe {
            audiotags_sys::audiotags_write_properties(
                self.handle,
                len,
                field_ptrs.as_ptr(),
                value_ptrs.as_ptr(),
            )
        }
    }

    fn audio_properties(&self) -> Option<AudioProperties> {
        let mut raw = audiotags_sys::AudiotagsProperties {
            length: 0,
            bitrate: 0,
            samplerate: 0,
            channels: 0,
        };
        // SAFETY: handle is live; raw is a valid out-pointer.
        let ok = unsafe { audiotags_sys::audiotags_file_audioproperties(self.handle, &mut raw) };
        ok.then(|| AudioProperties {
            length: clamp(raw.length),
            bitrate: clamp(raw.bitrate),
            sample_rate: clamp(raw.samplerate),
            channels: clamp(raw.channels),
        })
    }

    fn read_picture(&self, session: u64, sink: PictureSink) -> bool {
        // SAFETY: handle is live until close/drop.
        unsafe { audiotags_sys::audiotags_read_picture(self.handle, session, Some(sink)) }
    }

    fn write_picture(&mut self, data: &[u8], width: i32, height: i32, mime: &CStr) -> bool {
        // SAFETY: handle is live; data has data.len() readable bytes; mime is
        // NUL-terminated. The bridge copies both before returning.
        unsafe {
            audiotags_sys::audiotags_write_picture(
                self.handle,
                data.as_ptr() as *const c_char,
                data.len(),
                width,
                height,
                mime.as_ptr(),
            )
        }
    }

    fn remove_pictures(&mut self) -> bool {
        // SAFETY: handle is live until close/drop.
        unsafe { audiotags_sys::audiotags_remove_pictures(self.handle) }
    }

    fn close(mut self) {
        self.release();
    }
}

impl NativeFile {
    fn release(&mut self) {
        if !self.handle.is_null() {
            // SAFETY: handle came from audiotags_file_new/memory and is freed once.
            unsafe { audiotags_sys::audiotags_file_close(self.handle) };
            self.handle = std::ptr::null_mut();
        }
    }
}

impl Drop for NativeFile {
    fn drop(&mut self) {
        self.release();
    }
}

fn clamp(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[cfg(unix)]
fn path_to_cstring(path: &Path) -> Option<CString> {
    use std::os::unix::ffi::OsStrExt;
    CString::new(path.as_os_str().as_bytes()).ok()
}

#[cfg(not(unix))]
fn path_to_cstring(path: &Path) -> Option<CString> {
    CString::new(path.to_str()?).ok()
}
