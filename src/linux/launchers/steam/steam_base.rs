use std::{
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    fs::{File, read_dir, read_to_string},
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
    sync::Arc,
};

use itertools::Itertools;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::digit1,
    combinator::all_consuming,
    error::{Error, ErrorKind},
    sequence::delimited,
};
use tracing::{debug, error, trace, warn};
use walkdir::WalkDir;

use super::{
    AppMetadata, EXCLUDED_APP_IDS, SteamAppCache, get_steam_dir, get_steam_flatpak_dir,
    get_steam_launch_url,
};
use crate::{
    data::{Game, GamesResult, Launcher, SupportedLaunchers},
    macros::logs::{debug_fallback_flatpak, debug_path, warn_fallback_manifests, warn_no_games},
    parsers::parse_value_json,
    error::GamesParsingError,
    utils::{clean_game_title, get_existing_file_path, some_if_dir, some_if_file},
};

struct ParsableManifestData {
    app_id: u32,
    title: String,
    install_dir_path: String,
}

const LAUNCHER: SupportedLaunchers = SupportedLaunchers::Steam;

// UTILS --------------------------------------------------------------------------------
/// Used for checking if a file name matches the structure for an app manifest file
#[tracing::instrument(level = "trace")]
fn parse_manifest_filename(filename: &str) -> IResult<&str, &str> {
    all_consuming(delimited(tag("appmanifest_"), digit1, tag(".acf"))).parse(filename)
}

/// Used for parsing relevant game's data from the given app manifest file's contents
#[tracing::instrument(level = "trace", skip(file_content))]
fn parse_game_manifest(file_content: &str) -> IResult<&str, ParsableManifestData> {
    // ID
    let (file_content, app_id) = parse_value_json(file_content, "appid")?;
    let app_id = app_id
        .parse::<u32>()
        .map_err(|_| nom::Err::Error(Error::new(file_content, ErrorKind::Digit)))?;

    // TITLE
    let (file_content, title) = parse_value_json(file_content, "name")?;

    // INSTALL_DIR_PATH
    let (file_content, install_dir_path) = parse_value_json(file_content, "installdir")?;

    Ok((
        file_content,
        ParsableManifestData {
            app_id,
            title: clean_game_title(title),
            install_dir_path,
        },
    ))
}

fn read_game_manifest(
    path_app_manifest: &Path,
) -> Result<ParsableManifestData, GamesParsingError> {
    let file_content = read_to_string(path_app_manifest)?;
    let (_, data) = parse_game_manifest(&file_content)?;

    Ok(data)
}

// STEAM LIBRARY ------------------------------------------------------------------------
pub struct SteamLibrary<'steamlibrary> {
    path_library: PathBuf,
    path_steam_dir: &'steamlibrary Path,
    app_metadata: &'steamlibrary HashMap<u32, AppMetadata>,
}
// Manual impl, as the metadata map can hold tens of thousands of apps
impl Debug for SteamLibrary<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("SteamLibrary")
            .field("path_library", &self.path_library)
            .field("path_steam_dir", &self.path_steam_dir)
            .finish_non_exhaustive()
    }
}
impl SteamLibrary<'_> {
    /// Find and return paths of the app manifest files, if they exist
    #[tracing::instrument(level = "trace")]
    fn get_manifest_paths(&self) -> Result<Arc<[PathBuf]>, io::Error> {
        Ok(read_dir(self.path_library.join("steamapps"))?
            .flatten()
            .filter_map(|path| {
                let filename_os_str = path.file_name();

                let Some(filename) = filename_os_str.to_str() else {
                    debug!("{LAUNCHER} - Could not convert OS string to str: {filename_os_str:?}");
                    return None;
                };

                if parse_manifest_filename(filename).is_err() {
                    trace!("{LAUNCHER} - File skipped as it did not match the pattern of a manifest file: {filename}");
                    return None;
                };

                Some(path.path())
            })
            .collect())
    }

    /// Box art from the library cache, which has moved around between Steam versions
    fn find_box_art(&self, app_id: u32) -> Option<PathBuf> {
        let box_art_file_name = "library_600x900.jpg";
        let path_library_cache = self.path_steam_dir.join("appcache/librarycache");

        // Old library cache structure
        some_if_file(path_library_cache.join(format!("{app_id}_{box_art_file_name}")))
            // In the new structure, the file is not in the root `librarycache` dir, but rather in
            // a dir named after the `app_id`.
            .or_else(|| {
                some_if_file(path_library_cache.join(format!("{app_id}/{box_art_file_name}")))
            })
            // It can also appear in any sub-dir within that `app_id` dir, but we check the
            // above, non-nested path first to save time.
            .or_else(|| {
                WalkDir::new(path_library_cache.join(app_id.to_string()))
                    .min_depth(2)
                    .max_depth(2)
                    .into_iter()
                    .flatten()
                    .find(|entry| entry.file_name() == box_art_file_name)
                    .map(|entry| entry.into_path())
            })
    }

    /// Returns a new Game from the given path to a steam app manifest file (`appmanifest_.*.acf`)
    #[tracing::instrument(level = "trace")]
    fn get_game(&self, path_app_manifest: &Path) -> Option<Game> {
        let ParsableManifestData {
            app_id,
            title,
            install_dir_path,
        } = read_game_manifest(path_app_manifest)
            .map_err(|e| match e {
                GamesParsingError::Io(e) => {
                    error!("{LAUNCHER} - Error with reading Steam app manifest file at {path_app_manifest:?}:\n{e}");
                }
                e => warn!("{LAUNCHER} - Could not parse app manifest at {path_app_manifest:?}: {e}"),
            })
            .ok()?;

        if EXCLUDED_APP_IDS.contains(&app_id) {
            trace!("{LAUNCHER} - Skipped excluded app: {title:?}");
            return None;
        }

        let metadata = self.app_metadata.get(&app_id);
        if metadata.is_none() {
            trace!("{LAUNCHER} - No cached app info for '{title}' ({app_id})");
        }

        // The cached display name is preferred, as manifests keep whatever name the app had
        // when it was installed
        let title = metadata
            .and_then(|m| m.name.clone())
            .unwrap_or(title);

        let path_game_dir = some_if_dir(
            self.path_library
                .join("steamapps/common")
                .join(install_dir_path),
        );

        let path_box_art = self.find_box_art(app_id);

        let path_icon = metadata
            .and_then(|m| m.client_icon.as_deref())
            .and_then(|hash| {
                get_existing_file_path(
                    &self.path_steam_dir.join("steam/games"),
                    hash,
                    ["ico", "png", "jpg"],
                )
            });

        trace!("{LAUNCHER} - Game directory found for '{title}': {path_game_dir:?}");
        trace!("{LAUNCHER} - Box art found for '{title}': {path_box_art:?}");
        trace!("{LAUNCHER} - Icon found for '{title}': {path_icon:?}");

        Some(Game {
            title,
            app_id,
            app_type: metadata.and_then(|m| m.app_type),
            path_game_dir,
            path_box_art,
            path_icon,
            launch_url: get_steam_launch_url(app_id),
        })
    }

    /// Get all steam games associated with this library
    #[tracing::instrument(level = "trace")]
    pub fn get_all_games(&self) -> Result<Vec<Game>, io::Error> {
        let manifest_paths = self.get_manifest_paths()?;

        if manifest_paths.is_empty() {
            warn!(
                "{LAUNCHER} - No app manifest files found for steam library: {:?}",
                self.path_library
            );
        };

        Ok(manifest_paths
            .iter()
            .filter_map(|path| self.get_game(path))
            .collect())
    }
}

// STEAM LAUNCHER -----------------------------------------------------------------------
#[derive(Debug)]
pub struct Steam {
    path_steam_dir: PathBuf,
}

impl Steam {
    pub fn new(path_home: &Path, path_data: &Path) -> Self {
        let mut path_steam_dir = get_steam_dir(path_data);

        if !path_steam_dir.is_dir() {
            debug_fallback_flatpak!();

            path_steam_dir = get_steam_flatpak_dir(path_home);
        };

        debug_path!("main Steam directory", path_steam_dir);

        Steam { path_steam_dir }
    }

    /// `libraryfolders.vdf` lives in `steamapps`, but older installs only keep it in `config`
    fn get_libraries_vdf_path(&self) -> PathBuf {
        let path_steamapps = self.path_steam_dir.join("steamapps/libraryfolders.vdf");
        if path_steamapps.is_file() {
            return path_steamapps;
        }

        let path_config = self.path_steam_dir.join("config/libraryfolders.vdf");
        debug_path!("fallback libraryfolders.vdf", path_config);
        path_config
    }

    /// Get all available steam libraries by parsing the `libraryfolders.vdf` file
    #[tracing::instrument(level = "trace", skip(app_metadata))]
    fn get_steam_libraries<'a>(
        &'a self,
        app_metadata: &'a HashMap<u32, AppMetadata>,
    ) -> Result<Vec<SteamLibrary<'a>>, io::Error> {
        let libraries_vdf_path = self.get_libraries_vdf_path();

        debug!("{LAUNCHER} - libraryfolders.vdf path: {libraries_vdf_path:?}");

        Ok(BufReader::new(File::open(libraries_vdf_path)?)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| {
                parse_value_json(&line, "path")
                    .ok()
                    .map(|(_, library_path)| PathBuf::from(library_path))
            })
            // Libraries on drives which are not mounted are still listed
            .filter(|path_library| {
                let is_available = path_library.join("steamapps").is_dir();
                if !is_available {
                    warn!("{LAUNCHER} - Skipping unavailable steam library: {path_library:?}");
                }
                is_available
            })
            .map(|path_library| SteamLibrary {
                path_library,
                path_steam_dir: &self.path_steam_dir,
                app_metadata,
            })
            .collect())
    }

    /// Metadata from the app info cache, or nothing if the cache can't be used at all
    fn get_app_metadata(&self) -> HashMap<u32, AppMetadata> {
        SteamAppCache::new(&self.path_steam_dir)
            .load_metadata()
            .unwrap_or_else(|e| {
                warn_fallback_manifests!(e);
                HashMap::new()
            })
    }
}

impl Launcher for Steam {
    fn get_launcher_type(&self) -> SupportedLaunchers {
        LAUNCHER
    }

    fn is_detected(&self) -> bool {
        self.path_steam_dir.is_dir()
    }

    #[tracing::instrument(level = "trace")]
    fn get_detected_games(&self) -> GamesResult {
        let app_metadata = self.get_app_metadata();

        let libraries = self.get_steam_libraries(&app_metadata).map_err(|e| {
            error!("{LAUNCHER} - Error with parsing steam libraries:\n{e}");
            e
        })?;

        debug!("{LAUNCHER} - libraries detected: {:?}", libraries);

        let games = libraries
            .iter()
            .filter_map(|l| {
                l.get_all_games()
                    .map_err(|e| {
                        error!(
                            "{LAUNCHER} - Error with reading steam library at {:?}:\n{e}",
                            l.path_library
                        );
                    })
                    .ok()
            })
            .flatten()
            // The same library can be listed more than once
            .unique_by(|g| g.app_id)
            .collect_vec();

        if games.is_empty() {
            warn_no_games!();
        }

        Ok(games)
    }
}
