use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{endpoint::Destination, folders::CONFIG_DIR};

const FILE_NAME: &str = "visage-osc.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub address: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: Destination::default().to_string(),
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        CONFIG_DIR
            .as_ref()
            .map(|dir| Path::new(&**dir).join(FILE_NAME))
    }

    /// Missing or unreadable settings fall back to the defaults.
    pub fn load(path: &Path) -> Settings {
        File::open(path)
            .map_err(anyhow::Error::from)
            .and_then(|file| {
                serde_json::from_reader(BufReader::new(file)).map_err(anyhow::Error::from)
            })
            .unwrap_or_else(|e| {
                debug!("Using default settings ({}: {})", path.display(), e);
                Settings::default()
            })
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(FILE_NAME));
        assert_eq!(settings.address, "localhost:8080");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FILE_NAME);

        let settings = Settings {
            address: "192.168.1.20:9000".into(),
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path), settings);
    }

    #[test]
    fn corrupt_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }
}
