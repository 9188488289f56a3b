use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

/// Returns an Option containing the given `PathBuf`, if the `PathBuf` points to an actual file
pub fn some_if_file(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// Returns an Option containing the given `PathBuf`, if the `PathBuf` points to an actual directory
pub fn some_if_dir(path: PathBuf) -> Option<PathBuf> {
    path.is_dir().then_some(path)
}

/// Returns the first existing file path (based on a given list of extensions) for a given
/// directory path and file name
///
/// e.g. dir/path/file_name.{ico,png} will return the first path which actually exists (or `None`
/// if none of them exist)
pub fn get_existing_file_path<'a>(
    base_path: &Path,
    file_name: impl Display,
    extensions: impl IntoIterator<Item = &'a str>,
) -> Option<PathBuf> {
    extensions
        .into_iter()
        .find_map(|ext| some_if_file(base_path.join(format!("{file_name}.{ext}"))))
}

#[cfg(test)]
pub mod test {
    use std::fs::File;

    use super::*;

    #[test]
    fn test_get_existing_file_path() {
        let base = PathBuf::new();
        assert_eq!(get_existing_file_path(&base, "does_not_exist", ["jpg"]), None);
    }

    #[test]
    fn test_get_existing_file_path_order() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        File::create(dir.path().join("icon.png"))?;
        File::create(dir.path().join("icon.ico"))?;

        assert_eq!(
            get_existing_file_path(dir.path(), "icon", ["ico", "png"]),
            Some(dir.path().join("icon.ico"))
        );
        assert_eq!(
            get_existing_file_path(dir.path(), "icon", ["jpg", "png"]),
            Some(dir.path().join("icon.png"))
        );
        assert_eq!(some_if_dir(dir.path().join("icon.png")), None);

        Ok(())
    }
}
