//! `nom` parsers for the binary KeyValues payload and the fixed width fields around it.
//!
//! All parsers work on complete input, so any failure of a `nom` primitive means the buffer ran
//! out. [`ParseFailure`] records where that happened, so it can later be turned into a
//! [`DecodeError`] with an offset relative to the whole buffer.

use nom::{
    Err, IResult, Parser,
    bytes::complete::{tag, take, take_till},
    error::{ErrorKind, ParseError},
    number::complete::{le_f32, le_i32, le_i64, le_u8, le_u16, le_u32, le_u64},
    sequence::terminated,
};

use super::{
    error::DecodeError,
    kv::{END_TAG, KvContainer, KvValue, RawString, TypeTag},
};

pub(crate) const CHECKSUM_LEN: usize = 20;

/// Failure of one of the parsers in this module, pointing at the remaining input
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParseFailure<'a> {
    Eof(&'a [u8]),
    UnknownTag { tag: u8, at: &'a [u8] },
    TooDeep { max_depth: usize, at: &'a [u8] },
    BadStringIndex { index: u32, at: &'a [u8] },
}

impl<'a> ParseError<&'a [u8]> for ParseFailure<'a> {
    fn from_error_kind(input: &'a [u8], _kind: ErrorKind) -> Self {
        Self::Eof(input)
    }

    fn append(_input: &'a [u8], _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl ParseFailure<'_> {
    /// Converts to a [`DecodeError`], given the buffer the failing input was sliced from
    pub(crate) fn into_decode_error(self, buffer: &[u8]) -> DecodeError {
        let offset_of = |rest: &[u8]| buffer.len().saturating_sub(rest.len());

        match self {
            Self::Eof(rest) => DecodeError::Truncated {
                offset: offset_of(rest),
            },
            Self::UnknownTag { tag, at } => DecodeError::UnknownTypeTag {
                tag,
                offset: offset_of(at),
            },
            Self::TooDeep { max_depth, at } => DecodeError::NestingTooDeep {
                max_depth,
                offset: offset_of(at),
            },
            Self::BadStringIndex { index, at } => DecodeError::InvalidStringIndex {
                index,
                offset: offset_of(at),
            },
        }
    }
}

pub(crate) type KvResult<'a, O> = IResult<&'a [u8], O, ParseFailure<'a>>;

/// Flattens a `nom` error into a [`DecodeError`]
pub(crate) fn to_decode_error(err: Err<ParseFailure<'_>>, buffer: &[u8]) -> DecodeError {
    match err {
        Err::Error(failure) | Err::Failure(failure) => failure.into_decode_error(buffer),
        Err::Incomplete(_) => DecodeError::Truncated {
            offset: buffer.len(),
        },
    }
}

// PRIMITIVES ---------------------------------------------------------------------------
/// NUL-terminated byte string, without the terminator
pub(crate) fn cstring(input: &[u8]) -> KvResult<'_, &[u8]> {
    terminated(take_till(|b: u8| b == 0), tag(&[0u8][..])).parse(input)
}

/// UTF-16LE string terminated by a zero code unit
pub(crate) fn wide_cstring(mut input: &[u8]) -> KvResult<'_, Vec<u16>> {
    let mut units = Vec::new();
    loop {
        let (rest, unit) = le_u16(input)?;
        input = rest;

        if unit == 0 {
            return Ok((input, units));
        }
        units.push(unit);
    }
}

pub(crate) fn checksum(input: &[u8]) -> KvResult<'_, [u8; CHECKSUM_LEN]> {
    let (rest, bytes) = take(CHECKSUM_LEN).parse(input)?;

    let mut checksum = [0; CHECKSUM_LEN];
    checksum.copy_from_slice(bytes);

    Ok((rest, checksum))
}

pub(crate) fn u32_le(input: &[u8]) -> KvResult<'_, u32> {
    le_u32(input)
}

pub(crate) fn u64_le(input: &[u8]) -> KvResult<'_, u64> {
    le_u64(input)
}

pub(crate) fn i64_le(input: &[u8]) -> KvResult<'_, i64> {
    le_i64(input)
}

/// `u32` count followed by that many NUL-terminated strings
pub(crate) fn string_table(input: &[u8]) -> KvResult<'_, Vec<RawString>> {
    let (mut input, n) = le_u32(input)?;

    // Not preallocated from `n`, as a corrupt count could be anything
    let mut table = Vec::new();
    for _ in 0..n {
        let (rest, s) = cstring(input)?;
        table.push(RawString::from(s));
        input = rest;
    }

    Ok((input, table))
}

// KEYVALUES ----------------------------------------------------------------------------
/// How keys are stored in front of each node
#[derive(Debug, Clone, Copy)]
pub(crate) enum KeyEncoding<'t> {
    /// NUL-terminated string
    Inline,
    /// `u32` index into a string table stored elsewhere in the file
    StringTable(&'t [RawString]),
}

/// Recursive descent reader for a KeyValues container
#[derive(Debug, Clone, Copy)]
pub(crate) struct KvReader<'t> {
    pub keys: KeyEncoding<'t>,
    pub max_depth: usize,
}

impl KvReader<'_> {
    fn key<'a>(&self, input: &'a [u8]) -> KvResult<'a, RawString> {
        match self.keys {
            KeyEncoding::Inline => {
                let (rest, key) = cstring(input)?;
                Ok((rest, RawString::from(key)))
            }
            KeyEncoding::StringTable(table) => {
                let (rest, index) = le_u32(input)?;
                let key = table.get(index as usize).cloned().ok_or(Err::Failure(
                    ParseFailure::BadStringIndex { index, at: input },
                ))?;
                Ok((rest, key))
            }
        }
    }

    /// Reads the children of a container up to, and including, its end tag
    pub(crate) fn container<'a>(&self, input: &'a [u8], depth: usize) -> KvResult<'a, KvContainer> {
        if depth > self.max_depth {
            return Err(Err::Failure(ParseFailure::TooDeep {
                max_depth: self.max_depth,
                at: input,
            }));
        }

        let mut node = KvContainer::new();
        let mut input = input;
        loop {
            let (rest, raw_tag) = le_u8(input)?;
            if raw_tag == END_TAG {
                return Ok((rest, node));
            }

            // Unknown widths cannot be skipped, so this is the end of the road for this record
            let type_tag = TypeTag::from_byte(raw_tag).ok_or(Err::Failure(
                ParseFailure::UnknownTag {
                    tag: raw_tag,
                    at: input,
                },
            ))?;

            let (rest, key) = self.key(rest)?;
            let (rest, value) = self.value(rest, type_tag, depth)?;

            node.push(key, value);
            input = rest;
        }
    }

    fn value<'a>(&self, input: &'a [u8], type_tag: TypeTag, depth: usize) -> KvResult<'a, KvValue> {
        let (rest, value) = match type_tag {
            TypeTag::Container => {
                let (rest, c) = self.container(input, depth + 1)?;
                (rest, KvValue::Container(c))
            }
            TypeTag::String => {
                let (rest, s) = cstring(input)?;
                (rest, KvValue::String(RawString::from(s)))
            }
            TypeTag::WideString => {
                let (rest, units) = wide_cstring(input)?;
                (rest, KvValue::WideString(units))
            }
            TypeTag::Int32 => {
                let (rest, n) = le_i32(input)?;
                (rest, KvValue::Int32(n))
            }
            TypeTag::Float32 => {
                let (rest, n) = le_f32(input)?;
                (rest, KvValue::Float32(n))
            }
            TypeTag::Pointer => {
                let (rest, n) = le_u32(input)?;
                (rest, KvValue::Pointer(n))
            }
            TypeTag::Color => {
                let (rest, rgba) = take(4usize).parse(input)?;
                (rest, KvValue::Color([rgba[0], rgba[1], rgba[2], rgba[3]]))
            }
            TypeTag::UInt64 => {
                let (rest, n) = le_u64(input)?;
                (rest, KvValue::UInt64(n))
            }
            TypeTag::Int64 => {
                let (rest, n) = le_i64(input)?;
                (rest, KvValue::Int64(n))
            }
        };

        Ok((rest, value))
    }
}
