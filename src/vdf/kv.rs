//! In-memory representation of a binary KeyValues tree.

use std::{
    borrow::Cow,
    fmt::{self, Debug, Display, Formatter},
};

/// Type tag closing the current container.
pub const END_TAG: u8 = 0x08;

/// Type tags of the nodes which can appear inside a container.
///
/// The closing [`END_TAG`] is deliberately not part of this enum, as it never carries a key or a
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeTag {
    Container = 0x00,
    String = 0x01,
    Int32 = 0x02,
    Float32 = 0x03,
    Pointer = 0x04,
    WideString = 0x05,
    Color = 0x06,
    UInt64 = 0x07,
    Int64 = 0x0A,
}

impl TypeTag {
    /// Returns the tag for a given byte, or `None` if it is the end tag or not a known tag
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x00 => Self::Container,
            0x01 => Self::String,
            0x02 => Self::Int32,
            0x03 => Self::Float32,
            0x04 => Self::Pointer,
            0x05 => Self::WideString,
            0x06 => Self::Color,
            0x07 => Self::UInt64,
            0x0A => Self::Int64,
            _ => return None,
        })
    }
}

/// A NUL-terminated string as stored in the file, without its terminator.
///
/// No encoding is assumed. Valve writes UTF-8 in practice, so [`RawString::to_string_lossy`] is
/// the usual way of reading one.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct RawString(Vec<u8>);

impl RawString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// KeyValues keys are conventionally compared ignoring ASCII case
    pub fn eq_ignore_ascii_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.as_bytes())
    }
}

impl From<&[u8]> for RawString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for RawString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for RawString {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl Debug for RawString {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl Display for RawString {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}

/// Value of a single node in a KeyValues tree.
///
/// Equality is exact: [`KvValue::Float32`] values compare by bit pattern, so a NaN read from a
/// file equals itself, while `0.0` and `-0.0` differ.
#[derive(Debug, Clone)]
pub enum KvValue {
    Container(KvContainer),
    String(RawString),
    Int32(i32),
    Float32(f32),
    Pointer(u32),
    /// UTF-16 code units, without the terminating zero unit
    WideString(Vec<u16>),
    /// RGBA
    Color([u8; 4]),
    UInt64(u64),
    Int64(i64),
}

impl PartialEq for KvValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Container(a), Self::Container(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::Float32(a), Self::Float32(b)) => a.to_bits() == b.to_bits(),
            (Self::Pointer(a), Self::Pointer(b)) => a == b,
            (Self::WideString(a), Self::WideString(b)) => a == b,
            (Self::Color(a), Self::Color(b)) => a == b,
            (Self::UInt64(a), Self::UInt64(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KvValue {}

impl KvValue {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Container(_) => TypeTag::Container,
            Self::String(_) => TypeTag::String,
            Self::Int32(_) => TypeTag::Int32,
            Self::Float32(_) => TypeTag::Float32,
            Self::Pointer(_) => TypeTag::Pointer,
            Self::WideString(_) => TypeTag::WideString,
            Self::Color(_) => TypeTag::Color,
            Self::UInt64(_) => TypeTag::UInt64,
            Self::Int64(_) => TypeTag::Int64,
        }
    }

    pub fn as_container(&self) -> Option<&KvContainer> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Text view of string-like values. Invalid sequences are replaced, never rejected.
    pub fn as_str(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(s.to_string_lossy()),
            Self::WideString(units) => Some(Cow::Owned(String::from_utf16_lossy(units))),
            _ => None,
        }
    }

    /// Integer view of any of the integer-like values
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int32(n) => Some(n.into()),
            Self::Pointer(n) => Some(n.into()),
            Self::Int64(n) => Some(n),
            Self::UInt64(n) => i64::try_from(n).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::UInt64(n) => Some(n),
            _ => self.as_i64().and_then(|n| u64::try_from(n).ok()),
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::Float32(n) => Some(n),
            _ => None,
        }
    }
}

/// Ordered list of key/value children.
///
/// Repeated keys are kept in file order. Lookups treat the last occurrence as the effective one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KvContainer {
    entries: Vec<(RawString, KvValue)>,
}

impl KvContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<RawString>, value: KvValue) {
        self.entries.push((key.into(), value));
    }

    /// Builder style variant of [`KvContainer::push`]
    pub fn with(mut self, key: impl Into<RawString>, value: KvValue) -> Self {
        self.push(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order, including repeated keys
    pub fn iter(&self) -> impl Iterator<Item = (&RawString, &KvValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &RawString> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Value of the last entry matching `key`, ignoring ASCII case
    pub fn get(&self, key: &str) -> Option<&KvValue> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn get_container(&self, key: &str) -> Option<&KvContainer> {
        self.get(key).and_then(KvValue::as_container)
    }

    pub fn get_str(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).and_then(KvValue::as_str)
    }

    /// Follows nested containers, e.g. `["appinfo", "common", "name"]`
    pub fn get_path(&self, path: &[&str]) -> Option<&KvValue> {
        let (last, parents) = path.split_last()?;

        parents
            .iter()
            .try_fold(self, |node, key| node.get_container(key))?
            .get(last)
    }

    /// Deepest nesting level below this container (0 if it has no child containers)
    pub fn depth(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|(_, v)| v.as_container())
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

impl<K: Into<RawString>> FromIterator<(K, KvValue)> for KvContainer {
    fn from_iter<T: IntoIterator<Item = (K, KvValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(feature = "serde")]
mod serialize {
    use serde::{
        Serialize, Serializer,
        ser::{SerializeMap, SerializeSeq},
    };

    use super::*;

    impl Serialize for RawString {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string_lossy())
        }
    }

    impl Serialize for KvContainer {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (k, v) in self.iter() {
                map.serialize_entry(k, v)?;
            }
            map.end()
        }
    }

    impl Serialize for KvValue {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Container(c) => c.serialize(serializer),
                Self::String(s) => s.serialize(serializer),
                Self::WideString(units) => {
                    serializer.serialize_str(&String::from_utf16_lossy(units))
                }
                Self::Int32(n) => serializer.serialize_i32(*n),
                Self::Float32(n) => serializer.serialize_f32(*n),
                Self::Pointer(n) => serializer.serialize_u32(*n),
                Self::Color(rgba) => {
                    let mut seq = serializer.serialize_seq(Some(rgba.len()))?;
                    for channel in rgba {
                        seq.serialize_element(channel)?;
                    }
                    seq.end()
                }
                Self::UInt64(n) => serializer.serialize_u64(*n),
                Self::Int64(n) => serializer.serialize_i64(*n),
            }
        }
    }
}
