#[cfg(target_os = "linux")]
fn main() {
    use lib_steam_appinfo::{data::SupportedLaunchers, get_detector};
    use tracing::debug;

    // Init tracing
    tracing_subscriber::fmt::init();

    debug!("Initialising detector");
    let detector = get_detector();

    dbg!(detector.get_detected_launchers());
    dbg!(detector.get_all_detected_games());
    dbg!(detector.get_all_detected_games_with_box_art());
    dbg!(detector.get_all_detected_games_from_specific_launcher(SupportedLaunchers::Steam));
}

#[cfg(not(target_os = "linux"))]
fn main() {
    eprintln!("Game detection is only supported on Linux");
}
