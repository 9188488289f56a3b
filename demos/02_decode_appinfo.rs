use std::{env, fs, path::PathBuf, process::ExitCode};

use lib_steam_appinfo::vdf;

// NOTE: run with, e.g. `cargo run --example 02_decode_appinfo -- ~/.local/share/Steam/appcache/appinfo.vdf`
fn main() -> ExitCode {
    let Some(path) = env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("Usage: 02_decode_appinfo <path to appinfo.vdf>");
        return ExitCode::FAILURE;
    };

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };

    let partial = match vdf::decode_lossy(&bytes) {
        Ok(partial) => partial,
        Err(e) => {
            eprintln!("Not a supported appinfo.vdf: {e}");
            return ExitCode::FAILURE;
        }
    };

    let file = &partial.file;
    println!(
        "Format {:?}, universe {}, {} records",
        file.format_version,
        file.universe,
        file.records.len()
    );

    for record in &file.records {
        let name = record
            .data
            .get_path(&["appinfo", "common", "name"])
            .and_then(|v| v.as_str());
        println!(
            "\t- {:>8} {}",
            record.app_id,
            name.as_deref().unwrap_or("<no name>")
        );
    }

    for skipped in &file.skipped {
        println!("Skipped app {} at {:#x}: {}", skipped.app_id, skipped.offset, skipped.error);
    }

    if let Some(e) = partial.error {
        eprintln!("Decoding stopped early: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
