//! Decoder for Valve's binary KeyValues format, as used by Steam's `appinfo.vdf` cache.
//!
//! Decoding is a pure function of the given buffer: it performs no I/O and keeps no state
//! between calls, so independent buffers can be decoded from multiple threads at once.
//!
//! ```rust
//! use lib_steam_appinfo::vdf::{self, AppInfoFile, AppRecord, FormatVersion, KvContainer, KvValue};
//!
//! let mut file = AppInfoFile::new(FormatVersion::V27, 1);
//! file.records.push(AppRecord::new(
//!     440,
//!     KvContainer::new().with("name", KvValue::String("Team Fortress 2".into())),
//! ));
//!
//! let decoded = vdf::decode(&file.to_bytes()).unwrap();
//! assert_eq!(
//!     decoded.get(440).and_then(|r| r.data.get_str("name")).as_deref(),
//!     Some("Team Fortress 2")
//! );
//! ```

mod appinfo;
mod encode;
mod error;
mod kv;
mod parse;

pub use appinfo::{
    AppInfoFile, AppRecord, DecoderOptions, FormatVersion, PartialDecode, SkippedRecord, decode,
    decode_lossy, decode_lossy_with, decode_with,
};
pub use error::DecodeError;
pub use kv::{END_TAG, KvContainer, KvValue, RawString, TypeTag};
