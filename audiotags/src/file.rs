//! Typed operations on one open audio file.

use std::ffi::CString;
use std::io::Read;
use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};
use crate::marshal::{self, TagMap};
use crate::picture;
use crate::raw::{NativeFile, RawFile};
use crate::registry::{self, Registry, Session, Slot};

/// Audio stream properties as reported by the engine.
///
/// All zeros means the engine found nothing it could decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AudioProperties {
    /// Duration in seconds.
    pub length: u32,
    /// Bitrate in kbit/s.
    pub bitrate: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    pub channels: u32,
}

impl AudioProperties {
    pub fn is_empty(&self) -> bool {
        self.length == 0 && self.bitrate == 0 && self.sample_rate == 0 && self.channels == 0
    }
}

/// An open audio file.
///
/// The native handle is released by [`close`](Self::close) or, failing that,
/// when the `File` is dropped. Operations that modify the file take
/// `&mut self`; use one `File` per thread for parallel work.
pub struct File<R: RawFile = NativeFile> {
    raw: Option<R>,
    registry: &'static Registry,
}

impl File<NativeFile> {
    /// Open the file at `path`.
    ///
    /// Fails with [`Error::BadFile`] when the engine cannot recognise the
    /// container. Success does not imply playable audio; see
    /// [`has_media`](Self::has_media).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = NativeFile::open(path)?;
        log::debug!("opened {}", path.display());
        Ok(Self::from_raw(raw))
    }

    /// Open a file whose bytes come from `reader`.
    ///
    /// The stream is read to the end first; the container type is detected
    /// from its content.
    pub fn open_reader<T: Read>(mut reader: T) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::open_bytes(data)
    }

    pub fn open_bytes(data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        let raw = NativeFile::open_bytes(data)?;
        log::debug!("opened {len} bytes from memory");
        Ok(Self::from_raw(raw))
    }
}

impl<R: RawFile> File<R> {
    /// Wrap an already-open native file.
    pub fn from_raw(raw: R) -> Self {
        Self {
            raw: Some(raw),
            registry: registry::global(),
        }
    }

    /// Release the native handle.
    pub fn close(mut self) {
        if let Some(raw) = self.raw.take() {
            raw.close();
            log::debug!("closed file");
        }
    }

    fn raw(&self) -> &R {
        // Only `close` and `drop` take the handle, and both consume `self`.
        self.raw.as_ref().expect("file used after close")
    }

    fn raw_mut(&mut self) -> &mut R {
        self.raw.as_mut().expect("file used after close")
    }

    /// Whether the engine found a decodable audio stream.
    pub fn has_media(&self) -> bool {
        !self.read_properties().is_empty()
    }

    /// All text tags, keyed by lower-cased field name.
    ///
    /// An empty map means the file has no tags.
    pub fn read_tags(&self) -> TagMap {
        let session = Session::open(self.registry, Slot::tags());
        self.raw()
            .enumerate_tags(session.id().as_u64(), marshal::tag_put);
        match session.finish() {
            Some(Slot::Tags(map)) => map,
            _ => TagMap::new(),
        }
    }

    /// Replace the file's tags with `tags` and save.
    ///
    /// An empty map clears every textual tag. Fields absent from a non-empty
    /// map are left untouched.
    pub fn write_tags(&mut self, tags: &TagMap) -> Result<()> {
        if tags.is_empty() {
            return check(self.raw_mut().clear_tags(), "clear tags");
        }
        let (fields, values) = marshal::pack_tags(tags)?;
        check(self.raw_mut().write_tags(&fields, &values), "write tags")
    }

    /// Replace one field with `values` and save. No values removes the field.
    pub fn write_tag<S: AsRef<str>>(&mut self, field: &str, values: &[S]) -> Result<()> {
        let (field_c, packed) = marshal::pack_field(field, values)?;
        check(self.raw_mut().write_tag(&field_c, &packed), "write tag")
    }

    /// Audio properties, or all zeros when there is no audio stream.
    pub fn read_properties(&self) -> AudioProperties {
        self.raw().audio_properties().unwrap_or_default()
    }

    /// Encoded bytes of the embedded picture, if any.
    pub fn read_picture(&self) -> Option<Vec<u8>> {
        let session = Session::open(self.registry, Slot::picture());
        let found = self
            .raw()
            .read_picture(session.id().as_u64(), marshal::picture_put);
        match session.finish() {
            Some(Slot::Picture(Some(bytes))) if !bytes.is_empty() => Some(bytes),
            _ => {
                if found {
                    log::debug!("engine reported a picture but delivered no bytes");
                }
                None
            }
        }
    }

    /// The embedded picture, decoded.
    ///
    /// `Ok(None)` when there is no picture; [`Error::Codec`] when there is one
    /// the codec cannot read.
    pub fn read_image(&self) -> Result<Option<DynamicImage>> {
        self.read_picture()
            .map(|bytes| picture::decode(&bytes))
            .transpose()
    }

    /// Embed `data` as the front cover and save.
    pub fn write_picture(&mut self, data: &[u8], mime: &str, width: u32, height: u32) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyPayload);
        }
        let mime_c = CString::new(mime).map_err(|_| Error::InvalidText(mime.to_owned()))?;
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        check(
            self.raw_mut().write_picture(data, width, height, &mime_c),
            "write picture",
        )
    }

    /// Encode `img` as `format` and embed it as the front cover.
    ///
    /// Only JPEG and PNG are supported.
    pub fn write_image(&mut self, img: &DynamicImage, format: ImageFormat) -> Result<()> {
        let mime = picture::mime_type(format)?;
        let data = picture::encode(img, format)?;
        if data.is_empty() {
            return Err(Error::EmptyPayload);
        }
        self.write_picture(&data, mime, img.width(), img.height())
    }

    /// Remove every embedded picture and save.
    pub fn remove_pictures(&mut self) -> Result<()> {
        check(self.raw_mut().remove_pictures(), "remove pictures")
    }
}

impl<R: RawFile> Drop for File<R> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            raw.close();
        }
    }
}

fn check(ok: bool, what: &'static str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        log::warn!("native {what} failed");
        Err(Error::WriteFailure(what))
    }
}
