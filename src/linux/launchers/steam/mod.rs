mod app_cache;
mod steam_base;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

pub use app_cache::{AppMetadata, SteamAppCache};
pub use steam_base::Steam;

/// Apps which show up as installed but are not games
const EXCLUDED_APP_IDS: [u32; 1] = [
    228980, // Steamworks Common Redistributables
];

fn get_steam_launch_url(app_id: impl Display) -> String {
    format!("steam://rungameid/{app_id}")
}

fn get_steam_dir(path_data: &Path) -> PathBuf {
    path_data.join("Steam")
}

fn get_steam_flatpak_dir(path_home: &Path) -> PathBuf {
    path_home.join(".var/app/com.valvesoftware.Steam/data/Steam")
}
