#![allow(dead_code)]

use std::ffi::{CStr, CString, c_char};
use std::sync::{Arc, Mutex};

use audiotags::AudioProperties;
use audiotags::marshal::split_values;
use audiotags::raw::{PictureSink, RawFile, TagSink};

/// Native calls seen by a [`MockFile`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    EnumerateTags(u64),
    ClearTags,
    WriteTag(String, String),
    WriteTags(Vec<(String, String)>),
    AudioProperties,
    ReadPicture(u64),
    WritePicture {
        len: usize,
        width: i32,
        height: i32,
        mime: String,
    },
    RemovePictures,
    Close,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// In-memory stand-in for the native engine.
///
/// Tags are stored as raw `(key, value)` pairs and delivered through the real
/// sinks, one callback per pair, exactly as the bridge does.
pub struct MockFile {
    pub tags: Vec<(String, String)>,
    pub picture: Option<Vec<u8>>,
    pub properties: Option<AudioProperties>,
    pub writes_succeed: bool,
    pub calls: CallLog,
}

impl MockFile {
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            picture: None,
            properties: Some(playable()),
            writes_succeed: true,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_tags(mut self, tags: &[(&str, &str)]) -> Self {
        self.tags = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn with_picture(mut self, bytes: &[u8]) -> Self {
        self.picture = Some(bytes.to_vec());
        self
    }

    pub fn with_properties(mut self, props: Option<AudioProperties>) -> Self {
        self.properties = props;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.writes_succeed = false;
        self
    }

    pub fn log(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn set_field(&mut self, field: &str, packed: &str) {
        self.tags.retain(|(k, _)| !k.eq_ignore_ascii_case(field));
        for v in split_values(packed) {
            self.tags.push((field.to_uppercase(), v));
        }
    }
}

impl RawFile for MockFile {
    fn enumerate_tags(&self, session: u64, sink: TagSink) {
        self.record(Call::EnumerateTags(session));
        for (k, v) in &self.tags {
            let k = CString::new(k.as_str()).unwrap();
            let v = CString::new(v.as_str()).unwrap();
            unsafe { sink(session, k.as_ptr(), v.as_ptr()) };
        }
    }

    fn clear_tags(&mut self) -> bool {
        self.record(Call::ClearTags);
        if self.writes_succeed {
            self.tags.clear();
        }
        self.writes_succeed
    }

    fn write_tag(&mut self, field: &CStr, value: &CStr) -> bool {
        let field = field.to_str().unwrap().to_owned();
        let value = value.to_str().unwrap().to_owned();
        self.record(Call::WriteTag(field.clone(), value.clone()));
        if self.writes_succeed {
            self.set_field(&field, &value);
        }
        self.writes_succeed
    }

    fn write_tags(&mut self, fields: &[CString], values: &[CString]) -> bool {
        let pairs: Vec<(String, String)> = fields
            .iter()
            .zip(values)
            .map(|(f, v)| (f.to_str().unwrap().to_owned(), v.to_str().unwrap().to_owned()))
            .collect();
        self.record(Call::WriteTags(pairs.clone()));
        if self.writes_succeed {
            for (f, v) in &pairs {
                self.set_field(f, v);
            }
        }
        self.writes_succeed
    }

    fn audio_properties(&self) -> Option<AudioProperties> {
        self.record(Call::AudioProperties);
        self.properties
    }

    fn read_picture(&self, session: u64, sink: PictureSink) -> bool {
        self.record(Call::ReadPicture(session));
        match &self.picture {
            Some(bytes) => {
                unsafe { sink(session, bytes.as_ptr() as *const c_char, bytes.len()) };
                true
            }
            None => false,
        }
    }

    fn write_picture(&mut self, data: &[u8], width: i32, height: i32, mime: &CStr) -> bool {
        self.record(Call::WritePicture {
            len: data.len(),
            width,
            height,
            mime: mime.to_str().unwrap().to_owned(),
        });
        if self.writes_succeed {
            self.picture = Some(data.to_vec());
        }
        self.writes_succeed
    }

    fn remove_pictures(&mut self) -> bool {
        self.record(Call::RemovePictures);
        if self.writes_succeed {
            self.picture = None;
        }
        self.writes_succeed
    }

    fn close(self) {
        self.record(Call::Close);
    }
}

pub fn playable() -> AudioProperties {
    AudioProperties {
        length: 3,
        bitrate: 128,
        sample_rate: 44100,
        channels: 2,
    }
}

/// Bytes of `frames` identical MPEG-1 Layer III frames (128 kbit/s,
/// 44.1 kHz, mono, no padding). Enough for TagLib to detect the stream and
/// compute its properties.
pub fn mpeg_stream(frames: usize) -> Vec<u8> {
    const HEADER: [u8; 4] = [0xff, 0xfb, 0x90, 0xc0];
    const FRAME_LEN: usize = 417;
    let mut out = Vec::with_capacity(frames * FRAME_LEN);
    for _ in 0..frames {
        out.extend_from_slice(&HEADER);
        out.resize(out.len() + FRAME_LEN - HEADER.len(), 0);
    }
    out
}

/// A small opaque-ish RGB image with a gradient so encoders do real work.
pub fn cover(width: u32, height: u32) -> image::DynamicImage {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7) as u8, (y * 11) as u8, ((x + y) * 3) as u8])
    });
    image::DynamicImage::ImageRgb8(img)
}
