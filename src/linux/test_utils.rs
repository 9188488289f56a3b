//! Mock Steam installation used by the launcher tests.
//!
//! Layout (paths relative to the mock home directory):
//!
//! ```text
//! .local/share/Steam/                            (or the flatpak equivalent)
//! ├── appcache/appinfo.vdf                       apps 440 and 620
//! ├── appcache/librarycache/620_library_600x900.jpg
//! ├── appcache/librarycache/440/abc/library_600x900.jpg
//! ├── steam/games/3a4b5c.ico
//! └── steamapps/
//!     ├── libraryfolders.vdf                     this dir, steam_libraries/1 and a missing library
//!     ├── appmanifest_440.acf
//!     ├── appmanifest_620.acf
//!     └── common/Team Fortress 2/
//! steam_libraries/1/steamapps/
//! ├── appmanifest_440.acf                        same game listed twice
//! ├── appmanifest_228980.acf                     redistributables
//! ├── appmanifest_bad.acf.tmp
//! └── common/Team Fortress 2/
//! ```

use std::{
    fs::{File, create_dir_all, write},
    io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::vdf::{AppInfoFile, AppRecord, FormatVersion, KvContainer, KvValue};

pub struct MockFileSystem {
    dir: TempDir,
    is_flatpak: bool,
}

impl MockFileSystem {
    pub fn path_home(&self) -> &Path {
        self.dir.path()
    }

    /// XDG data dir. Points nowhere for flatpak installs, so the launcher has to fall back.
    pub fn path_data(&self) -> PathBuf {
        if self.is_flatpak {
            self.path_home().join("invalid/data/path")
        } else {
            self.path_home().join(".local/share")
        }
    }
}

/// Record shaped like the ones Steam writes, with the given `appinfo/common` values
pub fn appinfo_record(app_id: u32, name: &str, app_type: &str, client_icon: &str) -> AppRecord {
    let common = KvContainer::new()
        .with("name", KvValue::String(name.into()))
        .with("type", KvValue::String(app_type.into()))
        .with("clienticon", KvValue::String(client_icon.into()));

    AppRecord::new(
        app_id,
        KvContainer::new().with(
            "appinfo",
            KvValue::Container(
                KvContainer::new()
                    .with("appid", KvValue::Int32(app_id as i32))
                    .with("common", KvValue::Container(common)),
            ),
        ),
    )
}

fn app_manifest(app_id: u32, name: &str, install_dir: &str) -> String {
    format!(
        "\"AppState\"\n{{\n\t\"appid\"\t\t\"{app_id}\"\n\t\"universe\"\t\t\"1\"\n\t\"name\"\t\t\"{name}\"\n\t\"StateFlags\"\t\t\"4\"\n\t\"installdir\"\t\t\"{install_dir}\"\n}}\n"
    )
}

pub fn get_mock_file_system(is_flatpak: bool) -> io::Result<MockFileSystem> {
    let mock = MockFileSystem {
        dir: tempfile::tempdir()?,
        is_flatpak,
    };
    let home = mock.path_home();

    let steam = if is_flatpak {
        home.join(".var/app/com.valvesoftware.Steam/data/Steam")
    } else {
        home.join(".local/share/Steam")
    };
    let library = home.join("steam_libraries/1");

    // Main Steam dir, which is also the first library
    create_dir_all(steam.join("steamapps/common/Team Fortress 2"))?;
    write(
        steam.join("steamapps/libraryfolders.vdf"),
        format!(
            "\"libraryfolders\"\n{{\n\t\"0\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n\t\"1\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n\t\"2\"\n\t{{\n\t\t\"path\"\t\t\"{}\"\n\t}}\n}}\n",
            steam.display(),
            library.display(),
            home.join("unmounted_drive/SteamLibrary").display()
        ),
    )?;
    write(
        steam.join("steamapps/appmanifest_440.acf"),
        app_manifest(440, "Team Fortress 2 (manifest)", "Team Fortress 2"),
    )?;
    write(
        steam.join("steamapps/appmanifest_620.acf"),
        app_manifest(620, "Portal 2™", "Portal 2"),
    )?;

    let mut appinfo = AppInfoFile::new(FormatVersion::V29, 1);
    appinfo.push(appinfo_record(440, "Team Fortress 2", "game", "3a4b5c"));
    appinfo.push(appinfo_record(620, "Portal 2", "Demo", "ffffff"));
    create_dir_all(steam.join("appcache/librarycache/440/abc"))?;
    write(steam.join("appcache/appinfo.vdf"), appinfo.to_bytes())?;
    File::create(steam.join("appcache/librarycache/620_library_600x900.jpg"))?;
    File::create(steam.join("appcache/librarycache/440/abc/library_600x900.jpg"))?;

    create_dir_all(steam.join("steam/games"))?;
    File::create(steam.join("steam/games/3a4b5c.ico"))?;

    // Secondary library
    create_dir_all(library.join("steamapps/common/Team Fortress 2"))?;
    write(
        library.join("steamapps/appmanifest_440.acf"),
        app_manifest(440, "Team Fortress 2 (manifest)", "Team Fortress 2"),
    )?;
    write(
        library.join("steamapps/appmanifest_228980.acf"),
        app_manifest(228980, "Steamworks Common Redistributables", "Steamworks Shared"),
    )?;
    write(library.join("steamapps/appmanifest_bad.acf.tmp"), "")?;

    Ok(mock)
}
