use std::{
    fmt::{self, Debug, Display, Formatter},
    path::PathBuf,
    str::FromStr,
    sync::Arc,
};

use crate::error::GamesParsingError;

/// Kind of a Steam app, as stored under `appinfo/common/type` in the app info cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AppType {
    Game,
    Dlc,
    Demo,
    Config,
    Beta,
    Tool,
    OwnersOnly,
    Application,
}

impl FromStr for AppType {
    type Err = GamesParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "game" => Self::Game,
            "dlc" => Self::Dlc,
            "demo" => Self::Demo,
            "config" => Self::Config,
            "beta" => Self::Beta,
            "tool" => Self::Tool,
            "ownersonly" => Self::OwnersOnly,
            "application" => Self::Application,
            other => return Err(GamesParsingError::Other(format!("Unknown app type: {other}"))),
        })
    }
}

/// Data structure which defines all relevant data about any particular game
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Game {
    pub title: String,
    pub app_id: u32,
    pub app_type: Option<AppType>,
    pub path_game_dir: Option<PathBuf>,
    pub path_box_art: Option<PathBuf>,
    pub path_icon: Option<PathBuf>,
    /// URL which asks the launcher to start the game, e.g. `steam://rungameid/440`
    pub launch_url: String,
}

/// Custom Result type for Games
pub type GamesResult = Result<Vec<Game>, GamesParsingError>;

/// Data structure representing a supported games source
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SupportedLaunchers {
    Steam,
}
impl Display for SupportedLaunchers {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SupportedLaunchers::Steam => "Steam",
            }
        )
    }
}
impl Debug for SupportedLaunchers {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

// Game detection is divided up by "launchers" which are just specific sources of games
// e.g. Steam
pub trait Launcher: Send + Sync + Debug {
    fn get_detected_games(&self) -> GamesResult;
    fn is_detected(&self) -> bool;
    fn get_launcher_type(&self) -> SupportedLaunchers;
}
pub type Launchers = Vec<Arc<dyn Launcher>>;
pub type GamesPerLauncher = Vec<(SupportedLaunchers, Vec<Game>)>;

pub trait GamesDetector {
    fn get_detected_launchers(&self) -> Launchers;
    fn get_all_detected_games(&self) -> Vec<Game>;
    fn get_all_detected_games_with_box_art(&self) -> Vec<Game>;
    fn get_all_detected_games_per_launcher(&self) -> GamesPerLauncher;
    fn get_all_detected_games_from_specific_launcher(
        &self,
        launcher_type: SupportedLaunchers,
    ) -> Option<Vec<Game>>;
}
