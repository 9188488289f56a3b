//! Encoding of an [`AppInfoFile`] back into the on-disk layout.
//!
//! Record sizes and, for [`FormatVersion::V29`], the string table are always recomputed from the
//! tree, so the `size` field stored on each [`AppRecord`] is ignored. Strings containing a NUL
//! byte cannot be represented and will not decode back to the same value.

use indexmap::IndexSet;

use super::{
    appinfo::{AppInfoFile, AppRecord, FormatVersion},
    kv::{END_TAG, KvContainer, KvValue, RawString},
};

/// Destination of keys while writing a tree
enum KeySink<'t> {
    Inline,
    StringTable(&'t mut IndexSet<RawString>),
}

impl KeySink<'_> {
    fn write(&mut self, out: &mut Vec<u8>, key: &RawString) {
        match self {
            Self::Inline => write_cstring(out, key.as_bytes()),
            Self::StringTable(table) => {
                let (index, _) = table.insert_full(key.clone());
                out.extend((index as u32).to_le_bytes());
            }
        }
    }
}

fn write_cstring(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend(bytes);
    out.push(0);
}

fn write_container(out: &mut Vec<u8>, keys: &mut KeySink, node: &KvContainer) {
    for (key, value) in node.iter() {
        out.push(value.type_tag() as u8);
        keys.write(out, key);

        match value {
            KvValue::Container(child) => write_container(out, keys, child),
            KvValue::String(s) => write_cstring(out, s.as_bytes()),
            KvValue::WideString(units) => {
                units.iter().for_each(|u| out.extend(u.to_le_bytes()));
                out.extend([0, 0]);
            }
            KvValue::Int32(n) => out.extend(n.to_le_bytes()),
            KvValue::Float32(n) => out.extend(n.to_le_bytes()),
            KvValue::Pointer(n) => out.extend(n.to_le_bytes()),
            KvValue::Color(rgba) => out.extend(rgba),
            KvValue::UInt64(n) => out.extend(n.to_le_bytes()),
            KvValue::Int64(n) => out.extend(n.to_le_bytes()),
        }
    }

    out.push(END_TAG);
}

fn write_record(
    out: &mut Vec<u8>,
    keys: &mut KeySink,
    format_version: FormatVersion,
    record: &AppRecord,
) {
    let mut body = Vec::new();
    body.extend(record.state_flags.to_le_bytes());
    body.extend(record.last_updated.to_le_bytes());
    body.extend(record.access_token.to_le_bytes());
    body.extend(record.checksum);
    body.extend(record.change_number.to_le_bytes());
    if format_version.has_binary_checksum() {
        body.extend(record.binary_checksum.unwrap_or_default());
    }
    write_container(&mut body, keys, &record.data);

    out.extend(record.app_id.to_le_bytes());
    out.extend((body.len() as u32).to_le_bytes());
    out.extend(body);
}

impl AppInfoFile {
    /// Encodes this file using its own [`FormatVersion`].
    ///
    /// Records with an app ID of `0` would read back as the end of the file, so they are left
    /// out.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend(self.format_version.magic().to_le_bytes());
        out.extend(self.universe.to_le_bytes());

        let mut table = IndexSet::new();
        let mut keys = if self.format_version.has_string_table() {
            // Patched once the records are written
            out.extend(0i64.to_le_bytes());
            KeySink::StringTable(&mut table)
        } else {
            KeySink::Inline
        };

        self.records
            .iter()
            .filter(|r| r.app_id != 0)
            .for_each(|r| write_record(&mut out, &mut keys, self.format_version, r));
        out.extend(0u32.to_le_bytes());

        if self.format_version.has_string_table() {
            let table_offset = out.len() as i64;
            out[8..16].copy_from_slice(&table_offset.to_le_bytes());

            out.extend((table.len() as u32).to_le_bytes());
            table.iter().for_each(|s| write_cstring(&mut out, s.as_bytes()));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;
    use crate::vdf::decode;

    fn sample_tree() -> KvContainer {
        let common = KvContainer::new()
            .with("name", KvValue::String("Team Fortress 2".into()))
            .with("type", KvValue::String("Game".into()))
            .with("clienticon", KvValue::String("e3f595a92552da3d664ad00277fad2107345f743".into()))
            .with("name", KvValue::String("Duplicate".into()));

        KvContainer::new().with(
            "appinfo",
            KvValue::Container(
                KvContainer::new()
                    .with("appid", KvValue::Int32(440))
                    .with("common", KvValue::Container(common))
                    .with("ratio", KvValue::Float32(0.75))
                    .with("ptr", KvValue::Pointer(0xDEAD))
                    .with("wide", KvValue::WideString("wïde".encode_utf16().collect()))
                    .with("color", KvValue::Color([255, 0, 128, 255]))
                    .with("big", KvValue::UInt64(u64::MAX))
                    .with("signed", KvValue::Int64(-3)),
            ),
        )
    }

    fn sample_file(format_version: FormatVersion) -> AppInfoFile {
        let mut file = AppInfoFile::new(format_version, 1);

        let mut tf2 = AppRecord::new(440, sample_tree());
        tf2.state_flags = 2;
        tf2.last_updated = 1_690_000_000;
        tf2.access_token = 7;
        tf2.checksum = [3; 20];
        tf2.change_number = 1234;
        if format_version.has_binary_checksum() {
            tf2.binary_checksum = Some([4; 20]);
        }

        file.push(tf2);
        file.push(AppRecord::new(10, KvContainer::new()));
        file
    }

    #[test_case(FormatVersion::V27)]
    #[test_case(FormatVersion::V29)]
    fn test_round_trip(format_version: FormatVersion) {
        let original = sample_file(format_version);
        let bytes = original.to_bytes();
        let decoded = decode(&bytes).expect("encoder output is well formed");

        assert_eq!(decoded.format_version, format_version);
        assert_eq!(decoded.universe, original.universe);
        assert_eq!(decoded.records.len(), original.records.len());

        for (decoded, original) in decoded.records.iter().zip(&original.records) {
            assert_eq!(
                AppRecord {
                    size: 0,
                    ..decoded.clone()
                },
                *original
            );
            assert!(decoded.diagnostics.is_empty());
        }

        // Encoding is deterministic, so a second pass yields the same bytes
        assert_eq!(decode(&bytes).map(|f| f.to_bytes()), Ok(bytes));
    }

    #[test]
    fn test_string_table_deduplicates_keys() {
        let bytes = sample_file(FormatVersion::V29).to_bytes();
        let table_offset = i64::from_le_bytes(bytes[8..16].try_into().expect("8 bytes")) as usize;
        let count = u32::from_le_bytes(
            bytes[table_offset..table_offset + 4]
                .try_into()
                .expect("4 bytes"),
        );

        // appinfo, appid, common, name, type, clienticon, ratio, ptr, wide, color, big, signed
        assert_eq!(count, 12);
    }

    #[test_case(FormatVersion::V27, None)]
    #[test_case(FormatVersion::V29, Some([0; 20]))]
    fn test_push_fits_binary_checksum_to_format(
        format_version: FormatVersion,
        expected: Option<[u8; 20]>,
    ) {
        let mut file = AppInfoFile::new(format_version, 1);
        file.push(AppRecord::new(10, KvContainer::new()));

        let mut with_checksum = AppRecord::new(20, KvContainer::new());
        with_checksum.binary_checksum = Some([9; 20]);
        file.push(with_checksum);

        assert_eq!(file.records[0].binary_checksum, expected);

        let decoded = decode(&file.to_bytes()).expect("encoder output is well formed");
        assert_eq!(
            decoded.records.iter().map(|r| r.binary_checksum).collect::<Vec<_>>(),
            file.records.iter().map(|r| r.binary_checksum).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_sentinel_app_id_is_not_written() {
        let mut file = AppInfoFile::new(FormatVersion::V27, 1);
        file.records.push(AppRecord::new(0, KvContainer::new()));
        file.records.push(AppRecord::new(5, KvContainer::new()));

        let decoded = decode(&file.to_bytes()).expect("well formed");
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.records[0].app_id, 5);
    }
}
