//! Screenshot storage for one run

use std::path::{Path, PathBuf};

use crate::common::paths::{ensure_dir, slugify};
use crate::common::{Error, Result};

/// Directory receiving a run's screenshots
///
/// Files are numbered in capture order: `01-finished-download.png`,
/// `02-install-location-tab.png`, ...
#[derive(Debug)]
pub struct Artifacts {
    dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl Artifacts {
    /// Use `dir`, creating it if needed
    pub fn create(dir: &Path) -> Result<Self> {
        let dir = ensure_dir(dir).map_err(|e| {
            Error::Config(format!(
                "Cannot create artifact directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self {
            dir,
            saved: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Screenshots written so far
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }

    /// Write PNG bytes under a numbered, slugged name
    pub fn save_screenshot(&mut self, name: &str, png: &[u8]) -> Result<PathBuf> {
        let file = format!("{:02}-{}.png", self.saved.len() + 1, slugify(name));
        let path = self.dir.join(file);
        std::fs::write(&path, png)?;
        self.saved.push(path.clone());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screenshots_are_numbered() {
        let tmp = tempfile::tempdir().unwrap();
        let mut artifacts = Artifacts::create(&tmp.path().join("run")).unwrap();

        let first = artifacts.save_screenshot("finished download", b"png").unwrap();
        let second = artifacts.save_screenshot("Installed game tab", b"png").unwrap();

        assert_eq!(first.file_name().unwrap(), "01-finished-download.png");
        assert_eq!(second.file_name().unwrap(), "02-installed-game-tab.png");
        assert_eq!(std::fs::read(&second).unwrap(), b"png");
        assert_eq!(artifacts.saved().len(), 2);
    }
}
