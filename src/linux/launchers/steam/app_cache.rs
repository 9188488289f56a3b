use std::{
    collections::HashMap,
    fs::read,
    path::{Path, PathBuf},
};

use tracing::{debug, trace, warn};

use crate::{
    data::{AppType, SupportedLaunchers},
    error::GamesParsingError,
    utils::clean_game_title,
    vdf::{self, AppInfoFile, AppRecord, KvContainer, PartialDecode},
};

const LAUNCHER: SupportedLaunchers = SupportedLaunchers::Steam;

/// Display data for a single app, as found in the `appinfo/common` section of its record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppMetadata {
    pub name: Option<String>,
    pub app_type: Option<AppType>,
    /// Hash naming the app's icon file in `<steam>/steam/games`
    pub client_icon: Option<String>,
}

impl AppMetadata {
    pub fn from_record(record: &AppRecord) -> Self {
        let Some(common) = record
            .data
            .get_path(&["appinfo", "common"])
            .and_then(|v| v.as_container())
        else {
            trace!("{LAUNCHER} - No common section for app {}", record.app_id);
            return Self::default();
        };

        Self::from_common_section(common)
    }

    fn from_common_section(common: &KvContainer) -> Self {
        let name = common
            .get_str("name")
            .map(clean_game_title)
            .filter(|n| !n.is_empty());

        // Steam has used other values over time, only the known ones are of interest
        let app_type = common.get_str("type").and_then(|t| t.parse().ok());

        let client_icon = common
            .get_str("clienticon")
            .filter(|hash| !hash.is_empty() && hash.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|hash| hash.into_owned());

        Self {
            name,
            app_type,
            client_icon,
        }
    }
}

/// Steam's binary cache of app metadata, `appcache/appinfo.vdf`
#[derive(Debug)]
pub struct SteamAppCache {
    path_appinfo: PathBuf,
}

impl SteamAppCache {
    pub fn new(path_steam_dir: &Path) -> Self {
        Self {
            path_appinfo: path_steam_dir.join("appcache/appinfo.vdf"),
        }
    }

    /// Reads and decodes the whole cache.
    ///
    /// Records decoded before any fatal error are kept, as they are still trustworthy.
    #[tracing::instrument(level = "trace")]
    pub fn load(&self) -> Result<AppInfoFile, GamesParsingError> {
        let bytes = read(&self.path_appinfo)?;

        let PartialDecode { file, error } = vdf::decode_lossy(&bytes)?;

        if let Some(e) = error {
            warn!(
                "{LAUNCHER} - appinfo.vdf only partially decoded ({} records): {e}",
                file.records.len()
            );
        }

        if !file.skipped.is_empty() {
            debug!(
                "{LAUNCHER} - Skipped {} undecodable records in appinfo.vdf",
                file.skipped.len()
            );
        }

        Ok(file)
    }

    /// Decoded [`AppMetadata`] for every app in the cache, keyed by app ID
    #[tracing::instrument(level = "trace")]
    pub fn load_metadata(&self) -> Result<HashMap<u32, AppMetadata>, GamesParsingError> {
        let file = self.load()?;

        // Collecting into a map keeps the last record for any repeated app ID
        Ok(file
            .records
            .iter()
            .map(|r| (r.app_id, AppMetadata::from_record(r)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, write};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        linux::test_utils::appinfo_record,
        vdf::{DecodeError, FormatVersion, KvValue},
    };

    #[test]
    fn test_metadata_from_record() {
        let record = appinfo_record(440, "Team Fortress 2®", "game", "e3f595a92552da3d");

        assert_eq!(
            AppMetadata::from_record(&record),
            AppMetadata {
                name: Some("Team Fortress 2".to_string()),
                app_type: Some(AppType::Game),
                client_icon: Some("e3f595a92552da3d".to_string()),
            }
        );
    }

    #[test]
    fn test_metadata_ignores_unexpected_values() {
        let record = appinfo_record(10, "", "Music", "../../etc/passwd");
        assert_eq!(AppMetadata::from_record(&record), AppMetadata::default());

        let no_common = AppRecord::new(
            20,
            KvContainer::new().with("appinfo", KvValue::Container(KvContainer::new())),
        );
        assert_eq!(AppMetadata::from_record(&no_common), AppMetadata::default());
    }

    #[test]
    fn test_load_metadata() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        create_dir_all(dir.path().join("appcache"))?;

        let mut file = AppInfoFile::new(FormatVersion::V29, 1);
        file.records.extend([
            appinfo_record(620, "Portal 2", "Game", "abc"),
            appinfo_record(620, "Portal 2 (newer)", "Game", "abc"),
        ]);
        write(dir.path().join("appcache/appinfo.vdf"), file.to_bytes())?;

        let metadata = SteamAppCache::new(dir.path()).load_metadata()?;
        assert_eq!(metadata.len(), 1);
        assert_eq!(
            metadata.get(&620).and_then(|m| m.name.as_deref()),
            Some("Portal 2 (newer)")
        );

        Ok(())
    }

    #[test]
    fn test_load_errors() -> Result<(), GamesParsingError> {
        let dir = tempfile::tempdir()?;
        let cache = SteamAppCache::new(dir.path());
        assert!(matches!(cache.load(), Err(GamesParsingError::Io(_))));

        create_dir_all(dir.path().join("appcache"))?;
        write(dir.path().join("appcache/appinfo.vdf"), [0x28u8, 0x44, 0x56, 0x07, 1, 0, 0, 0])?;
        assert!(matches!(
            cache.load(),
            Err(GamesParsingError::Decode(DecodeError::UnsupportedVersion(
                0x0756_4428
            )))
        ));

        Ok(())
    }
}
