//! Decoding of Steam's `appcache/appinfo.vdf`.
//!
//! The file is a small header followed by one record per app, each holding a handful of fixed
//! width fields and a binary KeyValues tree. The record stream ends with an app ID of `0`.

use tracing::{debug, trace, warn};

use super::{
    error::DecodeError,
    kv::{KvContainer, RawString},
    parse::{
        KeyEncoding, KvReader, KvResult, checksum, i64_le, string_table, to_decode_error, u32_le,
        u64_le,
    },
};

/// Recognised `appinfo.vdf` layouts, identified by the magic at the start of the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FormatVersion {
    /// Keys are stored inline as NUL-terminated strings
    V27,
    /// Adds a binary checksum to every record and moves keys into a string table at the end of
    /// the file
    V29,
}

impl FormatVersion {
    pub const MAGIC_V27: u32 = 0x0756_4427;
    pub const MAGIC_V29: u32 = 0x0756_4429;

    pub fn magic(self) -> u32 {
        match self {
            Self::V27 => Self::MAGIC_V27,
            Self::V29 => Self::MAGIC_V29,
        }
    }

    /// Size in bytes of the file header
    pub fn header_len(self) -> usize {
        match self {
            Self::V27 => 8,
            Self::V29 => 16,
        }
    }

    pub fn has_string_table(self) -> bool {
        matches!(self, Self::V29)
    }

    pub fn has_binary_checksum(self) -> bool {
        matches!(self, Self::V29)
    }
}

impl TryFrom<u32> for FormatVersion {
    type Error = DecodeError;

    fn try_from(magic: u32) -> Result<Self, Self::Error> {
        match magic {
            Self::MAGIC_V27 => Ok(Self::V27),
            Self::MAGIC_V29 => Ok(Self::V29),
            other => Err(DecodeError::UnsupportedVersion(other)),
        }
    }
}

/// Cached metadata for a single app
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AppRecord {
    pub app_id: u32,
    /// Declared size of everything following the size field, as read from the file
    pub size: u32,
    pub state_flags: u32,
    /// Unix timestamp
    pub last_updated: u32,
    pub access_token: u64,
    /// SHA-1 of the text form of the app info
    pub checksum: [u8; 20],
    pub change_number: u32,
    /// SHA-1 of the binary KeyValues payload, only present from [`FormatVersion::V29`]
    pub binary_checksum: Option<[u8; 20]>,
    pub data: KvContainer,
    /// Non-fatal problems found while decoding this record
    #[cfg_attr(feature = "serde", serde(skip))]
    pub diagnostics: Vec<DecodeError>,
}

impl AppRecord {
    /// Creates a record with the given tree and zeroed metadata fields.
    ///
    /// The binary checksum is left unset. [`AppInfoFile::push`] sets it to match the file's
    /// format, as [`FormatVersion::V29`] files always carry one.
    pub fn new(app_id: u32, data: KvContainer) -> Self {
        Self {
            app_id,
            size: 0,
            state_flags: 0,
            last_updated: 0,
            access_token: 0,
            checksum: [0; 20],
            change_number: 0,
            binary_checksum: None,
            data,
            diagnostics: Vec::new(),
        }
    }
}

/// A record which could not be decoded, and was stepped over using its declared size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub app_id: u32,
    /// Offset of the record's app ID field
    pub offset: usize,
    pub error: DecodeError,
}

/// Decoded contents of an `appinfo.vdf` file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AppInfoFile {
    pub format_version: FormatVersion,
    pub universe: u32,
    /// Records in file order, never including the terminating sentinel
    pub records: Vec<AppRecord>,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub skipped: Vec<SkippedRecord>,
}

impl AppInfoFile {
    pub fn new(format_version: FormatVersion, universe: u32) -> Self {
        Self {
            format_version,
            universe,
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Appends a record, adding or dropping its binary checksum to fit [`Self::format_version`].
    /// A missing checksum becomes all zeroes.
    pub fn push(&mut self, mut record: AppRecord) {
        record.binary_checksum = self
            .format_version
            .has_binary_checksum()
            .then(|| record.binary_checksum.unwrap_or_default());
        self.records.push(record);
    }

    /// Last record with the given app ID
    pub fn get(&self, app_id: u32) -> Option<&AppRecord> {
        self.records.iter().rev().find(|r| r.app_id == app_id)
    }
}

/// Result of a lenient decode: everything that could be trusted, plus the error which stopped
/// decoding early, if any
#[derive(Debug, Clone, PartialEq)]
pub struct PartialDecode {
    pub file: AppInfoFile,
    pub error: Option<DecodeError>,
}

/// Knobs for the decoder
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Step over records containing errors local to that record (unknown type tags, invalid
    /// string indices, excessive nesting) using their declared size, rather than failing.
    ///
    /// This is a best-effort heuristic, as the declared size is not validated by anything.
    pub resynchronize: bool,
    /// Maximum container nesting level accepted inside a record
    pub max_depth: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            resynchronize: true,
            max_depth: 128,
        }
    }
}

/// Decodes a full `appinfo.vdf` buffer, failing on the first fatal error
pub fn decode(bytes: &[u8]) -> Result<AppInfoFile, DecodeError> {
    decode_with(bytes, &DecoderOptions::default())
}

pub fn decode_with(bytes: &[u8], options: &DecoderOptions) -> Result<AppInfoFile, DecodeError> {
    let PartialDecode { file, error } = decode_lossy_with(bytes, options)?;

    match error {
        Some(e) => Err(e),
        None => Ok(file),
    }
}

/// Like [`decode`], but hands back the records decoded before a fatal error instead of dropping
/// them.
///
/// Only errors in the file header (including the string table) are returned as `Err`.
pub fn decode_lossy(bytes: &[u8]) -> Result<PartialDecode, DecodeError> {
    decode_lossy_with(bytes, &DecoderOptions::default())
}

#[tracing::instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
pub fn decode_lossy_with(
    bytes: &[u8],
    options: &DecoderOptions,
) -> Result<PartialDecode, DecodeError> {
    let Header {
        format_version,
        universe,
        records_start,
        records_end,
        strings,
    } = Header::parse(bytes)?;

    debug!("appinfo format {format_version:?}, universe {universe}, records end at {records_end}");

    let reader = KvReader {
        keys: match &strings {
            Some(table) => KeyEncoding::StringTable(table),
            None => KeyEncoding::Inline,
        },
        max_depth: options.max_depth,
    };

    let mut file = AppInfoFile::new(format_version, universe);
    let error = decode_records(bytes, records_start, records_end, &reader, options, &mut file)
        .err();

    if let Some(e) = &error {
        warn!(
            "appinfo decoding stopped after {} records: {e}",
            file.records.len()
        );
    }

    Ok(PartialDecode { file, error })
}

// HEADER -------------------------------------------------------------------------------
struct Header {
    format_version: FormatVersion,
    universe: u32,
    records_start: usize,
    /// Records may not extend past this offset (the string table, if there is one)
    records_end: usize,
    strings: Option<Vec<RawString>>,
}

impl Header {
    fn parse(bytes: &[u8]) -> Result<Self, DecodeError> {
        let eof = |e| to_decode_error(e, bytes);

        let (rest, magic) = u32_le(bytes).map_err(eof)?;
        let format_version = FormatVersion::try_from(magic)?;
        let (rest, universe) = u32_le(rest).map_err(eof)?;

        if !format_version.has_string_table() {
            return Ok(Self {
                format_version,
                universe,
                records_start: format_version.header_len(),
                records_end: bytes.len(),
                strings: None,
            });
        }

        let (_, table_offset) = i64_le(rest).map_err(eof)?;
        let records_start = format_version.header_len();

        let table_start = usize::try_from(table_offset)
            .map_err(|_| DecodeError::InvalidStringTableOffset(table_offset))?;
        if table_start < records_start {
            return Err(DecodeError::InvalidStringTableOffset(table_offset));
        }

        let table_bytes = bytes
            .get(table_start..)
            .ok_or(DecodeError::Truncated { offset: bytes.len() })?;
        let (_, strings) = string_table(table_bytes).map_err(eof)?;

        trace!("appinfo string table holds {} keys", strings.len());

        Ok(Self {
            format_version,
            universe,
            records_start,
            records_end: table_start,
            strings: Some(strings),
        })
    }
}

// RECORDS ------------------------------------------------------------------------------
/// Fixed width fields following the size field of a record
struct RecordFields {
    state_flags: u32,
    last_updated: u32,
    access_token: u64,
    checksum: [u8; 20],
    change_number: u32,
    binary_checksum: Option<[u8; 20]>,
}

fn record_fields(
    input: &[u8],
    format_version: FormatVersion,
) -> KvResult<'_, RecordFields> {
    let (input, state_flags) = u32_le(input)?;
    let (input, last_updated) = u32_le(input)?;
    let (input, access_token) = u64_le(input)?;
    let (input, checksum_text) = checksum(input)?;
    let (input, change_number) = u32_le(input)?;

    let (input, binary_checksum) = if format_version.has_binary_checksum() {
        let (input, c) = checksum(input)?;
        (input, Some(c))
    } else {
        (input, None)
    };

    Ok((
        input,
        RecordFields {
            state_flags,
            last_updated,
            access_token,
            checksum: checksum_text,
            change_number,
            binary_checksum,
        },
    ))
}

/// Decodes records into `file` until the sentinel, returning the first fatal error.
///
/// `bytes` is the whole buffer, so error offsets stay absolute. Nothing past `records_end` is
/// ever read.
fn decode_records(
    bytes: &[u8],
    records_start: usize,
    records_end: usize,
    reader: &KvReader,
    options: &DecoderOptions,
    file: &mut AppInfoFile,
) -> Result<(), DecodeError> {
    let bytes = bytes.get(..records_end).ok_or(DecodeError::Truncated {
        offset: bytes.len(),
    })?;
    let to_err = |e| to_decode_error(e, bytes);
    let mut offset = records_start;

    loop {
        // Hitting the end of the record area without a sentinel means the file was cut short
        let region = bytes
            .get(offset..records_end)
            .ok_or(DecodeError::Truncated { offset: records_end })?;

        let (rest, app_id) = u32_le(region).map_err(to_err)?;
        if app_id == 0 {
            trace!("appinfo sentinel reached at offset {offset}");
            return Ok(());
        }

        let record_offset = offset;
        let payload_start = offset + 8;
        let (_, size) = u32_le(rest).map_err(to_err)?;

        // Where the record should end according to its header. Only trusted for skipping.
        let declared_end = payload_start
            .checked_add(size as usize)
            .filter(|end| *end <= records_end);

        let decoded = bytes
            .get(payload_start..)
            .ok_or(DecodeError::Truncated { offset: bytes.len() })
            .and_then(|payload| {
                let (payload, fields) =
                    record_fields(payload, file.format_version).map_err(to_err)?;
                let (after, data) = reader.container(payload, 0).map_err(to_err)?;
                Ok((fields, data, bytes.len() - after.len()))
            });

        match decoded {
            Ok((fields, data, decoded_end)) => {
                let consumed = decoded_end - payload_start;
                let mut diagnostics = Vec::new();

                offset = if consumed == size as usize {
                    decoded_end
                } else {
                    let mismatch = DecodeError::RecordSizeMismatch {
                        app_id,
                        declared: size,
                        consumed,
                    };
                    warn!("appinfo - {mismatch}, resynchronising on the declared size");

                    let Some(end) = declared_end else {
                        return Err(DecodeError::Truncated {
                            offset: payload_start.saturating_add(size as usize),
                        });
                    };
                    diagnostics.push(mismatch);
                    end
                };

                trace!("appinfo - decoded app {app_id} ({} top-level keys)", data.len());

                file.records.push(AppRecord {
                    app_id,
                    size,
                    state_flags: fields.state_flags,
                    last_updated: fields.last_updated,
                    access_token: fields.access_token,
                    checksum: fields.checksum,
                    change_number: fields.change_number,
                    binary_checksum: fields.binary_checksum,
                    data,
                    diagnostics,
                });
            }
            Err(error) if options.resynchronize && error.is_record_local() => {
                let Some(end) = declared_end else {
                    return Err(error);
                };

                warn!("appinfo - skipping app {app_id} at offset {record_offset}: {error}");
                file.skipped.push(SkippedRecord {
                    app_id,
                    offset: record_offset,
                    error,
                });
                offset = end;
            }
            Err(error) => return Err(error),
        }
    }
}
