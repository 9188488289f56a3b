use std::{path::Path, sync::Arc};

use tracing::{error, warn};

use crate::data::{Game, GamesDetector, GamesPerLauncher, Launchers, SupportedLaunchers};

use self::launchers::steam::Steam;

mod launchers;
#[cfg(test)]
pub(crate) mod test_utils;

pub struct GamesDetectorLinux {
    launchers: Launchers,
}

impl GamesDetectorLinux {
    pub fn new() -> GamesDetectorLinux {
        let (Some(path_home), Some(path_data)) = (dirs::home_dir(), dirs::data_dir()) else {
            error!("No valid $HOME directory found for the current user");
            return GamesDetectorLinux { launchers: vec![] };
        };

        GamesDetectorLinux {
            launchers: Self::get_launchers(&path_home, &path_data),
        }
    }

    pub fn get_launchers(path_home: &Path, path_data: &Path) -> Launchers {
        vec![Arc::new(Steam::new(path_home, path_data))]
    }
}

impl Default for GamesDetectorLinux {
    fn default() -> Self {
        Self::new()
    }
}

impl GamesDetector for GamesDetectorLinux {
    fn get_detected_launchers(&self) -> Launchers {
        self.launchers
            .iter()
            .filter(|l| l.is_detected())
            .cloned()
            .collect()
    }

    fn get_all_detected_games(&self) -> Vec<Game> {
        self.get_all_detected_games_per_launcher()
            .into_iter()
            .flat_map(|(_, games)| games)
            .collect()
    }

    fn get_all_detected_games_with_box_art(&self) -> Vec<Game> {
        self.get_all_detected_games()
            .into_iter()
            .filter(|g| g.path_box_art.is_some())
            .collect()
    }

    fn get_all_detected_games_per_launcher(&self) -> GamesPerLauncher {
        self.get_detected_launchers()
            .iter()
            .filter_map(|l| match l.get_detected_games() {
                Ok(g) => Some((l.get_launcher_type(), g)),
                Err(e) => {
                    error!("Could not get games for launcher {l:?}: {e}");
                    None
                }
            })
            .collect()
    }

    fn get_all_detected_games_from_specific_launcher(
        &self,
        launcher_type: SupportedLaunchers,
    ) -> Option<Vec<Game>> {
        self.get_detected_launchers()
            .iter()
            .find(|l| l.get_launcher_type() == launcher_type)
            .and_then(|l| {
                l.get_detected_games()
                    .map_err(|e| {
                        warn!(
                            "Launcher detected but there was an error with getting detected games for the launcher {launcher_type}: {e}",
                        )
                    })
                    .ok()
            })
    }
}
