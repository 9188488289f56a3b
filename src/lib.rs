//! A Rust library for decoding Steam's binary `appinfo.vdf` cache, and for detecting installed
//! Steam games enriched with the metadata found in it. The decoder works on every platform, while
//! game detection currently only supports Linux.
//!
//! # Description
//!
//! Steam keeps display names, app types, icon hashes and much more for every app it knows about
//! in `appcache/appinfo.vdf`, a binary KeyValues ("VDF") file. The [`vdf`] module decodes that
//! file into an ordered tree per app, tolerating truncated files, malformed nesting and unknown
//! type tags without ever reading out of bounds.
//!
//! On top of that, the crate finds Steam libraries and installed app manifests and combines them
//! with the decoded cache. When the cache is missing or can't be decoded, games are still
//! reported using the data from their manifests.
//!
//! # Usage
//!
//! Decoding a cache file directly:
//!
//! ```rust,no_run
//! use lib_steam_appinfo::vdf;
//!
//! let bytes = std::fs::read("appinfo.vdf").unwrap();
//! let appinfo = vdf::decode(&bytes).unwrap();
//! for record in &appinfo.records {
//!     let name = record.data.get_path(&["appinfo", "common", "name"]);
//!     println!("{}: {:?}", record.app_id, name.and_then(|v| v.as_str()));
//! }
//! ```
//!
//! Detecting installed games (Linux only):
//!
//! ```rust
//! # #[cfg(target_os = "linux")]
//! # {
//! use lib_steam_appinfo::{data::SupportedLaunchers, get_detector};
//!
//! let detector = get_detector();
//! let detected_launchers = detector.get_detected_launchers();
//! let all_games = detector.get_all_detected_games();
//! let all_games_from_steam = detector.get_all_detected_games_from_specific_launcher(SupportedLaunchers::Steam);
//! # }
//! ```
//!
//! # Supported `appinfo.vdf` versions
//!
//! - `0x07564427`: keys stored inline
//! - `0x07564429`: keys stored in a string table at the end of the file
//!
//! Any other version is rejected rather than guessed at.

use cfg_if::cfg_if;

pub mod data;
pub mod error;
pub mod vdf;

cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod linux;
        mod macros;
        mod parsers;
        mod utils;

        use data::GamesDetector;
        use linux::GamesDetectorLinux;

        /// Primary entry point into game detection - get a [`GamesDetector`]
        pub fn get_detector() -> Box<dyn GamesDetector> {
            Box::new(GamesDetectorLinux::new())
        }
    }
}
