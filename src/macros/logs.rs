macro_rules! debug_path {
    ($description: expr, $path: ident) => {
        tracing::debug!(
            "{LAUNCHER} - {} exists at {:?}: {}",
            $description,
            $path,
            $path.exists()
        );
    };
}
pub(crate) use debug_path;

macro_rules! debug_fallback_flatpak {
    () => {
        tracing::debug!("{LAUNCHER} - Attempting to fall back to flatpak");
    };
}
pub(crate) use debug_fallback_flatpak;

/// The app info cache is optional, games can still be listed from their manifests alone
macro_rules! warn_fallback_manifests {
    ($reason: expr) => {
        tracing::warn!(
            "{LAUNCHER} - Falling back to app manifest data only: {}",
            $reason
        );
    };
}
pub(crate) use warn_fallback_manifests;

macro_rules! warn_no_games {
    () => {
        tracing::warn!("{LAUNCHER} - No games found");
    };
}
pub(crate) use warn_no_games;
