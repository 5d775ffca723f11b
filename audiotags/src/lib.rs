//! Audio file tags, properties and cover art through TagLib.
//!
//! ```no_run
//! use audiotags::File;
//!
//! let mut file = File::open("song.mp3")?;
//! if file.has_media() {
//!     for (field, values) in file.read_tags() {
//!         println!("{field}: {values:?}");
//!     }
//!     file.write_tag("title", &["New title"])?;
//! }
//! file.close();
//! # Ok::<(), audiotags::Error>(())
//! ```
//!
//! Multi-valued results come back from the native side through callbacks
//! keyed by a per-call session id; see [`registry`] and [`marshal`].

pub mod error;
pub mod file;
pub mod marshal;
pub mod picture;
pub mod raw;
pub mod registry;

pub use error::{Error, Result};
pub use file::{AudioProperties, File};
pub use image::{DynamicImage, ImageFormat};
pub use marshal::TagMap;
